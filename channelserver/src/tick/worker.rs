//! 틱 워커
//!
//! 전용 OS 스레드 하나가 고정 주기 루프를 돕니다. 루프 한 번은 다음 순서로 진행됩니다.
//!
//! 1. 제거 대기열 비우기
//! 2. 추가 대기열 비우기
//! 3. 소유한 객체마다 `process_tick` 한 번씩 호출 (개별 실패는 로깅 후 계속)
//! 4. 처리 시간을 부하 값으로 기록 (누적하지 않고 덮어씀)
//! 5. 다음 틱 경계까지 대기
//!
//! 틱 경계는 `last_tick + period`로 계산하므로 마감을 놓치면 대기 없이 바로 다음 틱을 돌아
//! 따라잡습니다.

use chrono::Utc;
use crossbeam_queue::SegQueue;
use parking_lot::Mutex;
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

use super::{OwnershipTable, Processable, ProcessableId};
use crate::tool::SimpleUtils;

/// 워커 상태 스냅샷
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStats {
    pub index: usize,
    pub name: String,
    pub running: bool,
    pub owned: usize,
    pub ticks: u64,
    pub last_processing_micros: u64,
}

/// 워커 스레드와 공유하는 상태
struct WorkerShared {
    index: usize,
    name: String,
    period: Duration,
    ownership: Arc<OwnershipTable>,
    to_add: SegQueue<Arc<dyn Processable>>,
    to_remove: SegQueue<ProcessableId>,
    /// 워커 스레드만 수정. 재시작 시에도 유지되도록 공유 상태에 둔다
    processables: Mutex<Vec<Arc<dyn Processable>>>,
    running: AtomicBool,
    last_processing_nanos: AtomicU64,
    tick_count: AtomicU64,
    owned_count: AtomicUsize,
}

/// 틱 워커
pub struct TickWorker {
    shared: Arc<WorkerShared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TickWorker {
    pub(crate) fn new(index: usize, period: Duration, ownership: Arc<OwnershipTable>) -> Self {
        Self {
            shared: Arc::new(WorkerShared {
                index,
                name: format!("GameTickThread-{}", index),
                period,
                ownership,
                to_add: SegQueue::new(),
                to_remove: SegQueue::new(),
                processables: Mutex::new(Vec::new()),
                running: AtomicBool::new(false),
                last_processing_nanos: AtomicU64::new(0),
                tick_count: AtomicU64::new(0),
                owned_count: AtomicUsize::new(0),
            }),
            handle: Mutex::new(None),
        }
    }

    pub fn index(&self) -> usize {
        self.shared.index
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// 마지막 틱 처리 시간 (나노초)
    pub fn load(&self) -> u64 {
        self.shared.last_processing_nanos.load(Ordering::Acquire)
    }

    pub(crate) fn record_load(&self, nanos: u64) {
        self.shared.last_processing_nanos.store(nanos, Ordering::Release);
    }

    /// 지금까지 완료한 틱 수
    pub fn tick_count(&self) -> u64 {
        self.shared.tick_count.load(Ordering::Acquire)
    }

    /// 마지막 틱 기준 소유 객체 수
    pub fn owned_count(&self) -> usize {
        self.shared.owned_count.load(Ordering::Acquire)
    }

    pub(crate) fn enqueue_add(&self, processable: Arc<dyn Processable>) {
        self.shared.to_add.push(processable);
    }

    pub(crate) fn enqueue_remove(&self, id: ProcessableId) {
        self.shared.to_remove.push(id);
    }

    /// 워커 스레드 시작. 이미 실행 중이면 `Ok(false)`
    pub fn start(&self) -> std::io::Result<bool> {
        let mut handle = self.handle.lock();

        if self.shared.running.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(self.shared.name.clone())
            .spawn(move || shared.tick_loop());

        match spawned {
            Ok(join) => {
                warn!("[TICK_PROCESSOR] 워커 시작: {}", self.shared.name);
                *handle = Some(join);
                Ok(true)
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    /// 워커 스레드 중지. 진행 중인 틱이 끝날 때까지 기다립니다.
    pub fn stop(&self) -> bool {
        let mut handle = self.handle.lock();

        if !self.shared.running.swap(false, Ordering::AcqRel) {
            return false;
        }

        if let Some(join) = handle.take() {
            join.thread().unpark();
            if join.join().is_err() {
                error!("[TICK_PROCESSOR] 워커 스레드 비정상 종료: {}", self.shared.name);
            }
        }

        debug!("[TICK_PROCESSOR] 워커 중지: {}", self.shared.name);
        true
    }

    /// 현재 상태 스냅샷
    pub fn stats(&self) -> WorkerStats {
        WorkerStats {
            index: self.shared.index,
            name: self.shared.name.clone(),
            running: self.is_running(),
            owned: self.owned_count(),
            ticks: self.tick_count(),
            last_processing_micros: self.load() / 1_000,
        }
    }

    /// 스레드 없이 틱 한 번을 현재 스레드에서 실행합니다.
    #[cfg(test)]
    pub(crate) fn run_single_tick(&self) {
        self.shared.run_tick();
    }
}

impl Drop for TickWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl WorkerShared {
    fn tick_loop(&self) {
        let mut last_tick = Instant::now();

        while self.running.load(Ordering::Acquire) {
            let next_tick = last_tick + self.period;
            let started = Instant::now();

            self.run_tick();

            let elapsed = started.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            self.last_processing_nanos.store(elapsed, Ordering::Release);
            self.tick_count.fetch_add(1, Ordering::AcqRel);
            last_tick = next_tick;

            // 이미 경계를 지났으면 바로 다음 틱
            loop {
                let now = Instant::now();
                if now >= next_tick || !self.running.load(Ordering::Acquire) {
                    break;
                }
                thread::park_timeout(next_tick - now);
            }
        }
    }

    fn run_tick(&self) {
        let tick_begin = Utc::now();
        let mut processables = self.processables.lock();

        while let Some(id) = self.to_remove.pop() {
            let before = processables.len();
            processables.retain(|p| p.id() != id);
            if processables.len() != before {
                debug!("[TICK][{}] {} 제거", self.name, id);
            }
            self.ownership.removal_applied(id, self.index);
        }

        while let Some(processable) = self.to_add.pop() {
            let id = processable.id();
            // 추가 후 같은 틱 전에 제거되었거나 이미 소유 중이면 건너뜀
            if !self.ownership.is_owned_by(id, self.index)
                || processables.iter().any(|p| p.id() == id)
            {
                continue;
            }
            processables.push(processable);
        }

        for processable in processables.iter() {
            match catch_unwind(AssertUnwindSafe(|| processable.process_tick(tick_begin))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!("[TICK][PROCESS] {} ({}) 처리 실패: {:#}", processable.name(), processable.id(), e);
                }
                Err(payload) => {
                    error!(
                        "[TICK][PROCESS] {} ({}) 처리 중 패닉: {}",
                        processable.name(),
                        processable.id(),
                        SimpleUtils::panic_message(payload.as_ref())
                    );
                }
            }
        }

        self.owned_count.store(processables.len(), Ordering::Release);
    }
}
