//! 워커 분배 틱 스케줄러
//!
//! 워커 수는 생성 시점에 고정됩니다. 등록 요청은 마지막 측정 부하가 가장 낮은 워커
//! (동률이면 인덱스가 가장 낮은 워커)로 보내지고, 제거 요청은 소유권 테이블을 따라
//! 담당 워커로 전달됩니다.

use anyhow::{Context, Result};
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::worker::{TickWorker, WorkerStats};
use super::{OwnershipTable, Processable, ProcessableId, TickConfig};
use crate::tool::SimpleUtils;

/// 스케줄러 상태 스냅샷
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStats {
    pub started: bool,
    pub tick_rate: u32,
    pub tracked: usize,
    pub workers: Vec<WorkerStats>,
}

/// 틱 스케줄러
pub struct TickScheduler {
    config: TickConfig,
    workers: Vec<TickWorker>,
    ownership: Arc<OwnershipTable>,
    /// 시작/중지 상호 배제
    started: Mutex<bool>,
}

impl TickScheduler {
    /// 새 스케줄러 생성. 워커 수 0은 1로 취급합니다.
    pub fn new(config: TickConfig) -> Self {
        let period = SimpleUtils::tick_period(config.tick_rate);
        let ownership = Arc::new(OwnershipTable::default());
        let workers = (0..config.workers.max(1))
            .map(|index| TickWorker::new(index, period, Arc::clone(&ownership)))
            .collect();

        Self {
            config,
            workers,
            ownership,
            started: Mutex::new(false),
        }
    }

    /// 객체 등록. 이미 등록된 식별자면 무시하고 `false`를 반환합니다.
    pub fn register(&self, processable: Arc<dyn Processable>) -> bool {
        let id = processable.id();

        let index = match self.ownership.owners.entry(id) {
            Entry::Occupied(_) => return false,
            Entry::Vacant(slot) => {
                // 제거가 아직 반영되지 않았으면 같은 워커로 보내 순서를 보장
                let index = self
                    .ownership
                    .retiring
                    .get(&id)
                    .map(|owner| *owner)
                    .unwrap_or_else(|| self.least_loaded_worker());
                slot.insert(index);
                index
            }
        };

        self.workers[index].enqueue_add(processable);
        debug!("[TICK] {} → {}", id, self.workers[index].name());
        true
    }

    /// 객체 제거. 등록되지 않은 식별자면 아무것도 하지 않습니다.
    pub fn remove(&self, id: ProcessableId) -> bool {
        let index = match self.ownership.owners.entry(id) {
            Entry::Vacant(_) => return false,
            Entry::Occupied(slot) => {
                let index = *slot.get();
                self.ownership.retiring.insert(id, index);
                slot.remove();
                index
            }
        };

        self.workers[index].enqueue_remove(id);
        true
    }

    /// 담당 워커 인덱스
    pub fn owner_of(&self, id: ProcessableId) -> Option<usize> {
        self.ownership.owners.get(&id).map(|owner| *owner)
    }

    /// 등록된 객체 수
    pub fn tracked_count(&self) -> usize {
        self.ownership.owners.len()
    }

    pub fn workers(&self) -> &[TickWorker] {
        &self.workers
    }

    pub fn is_started(&self) -> bool {
        *self.started.lock()
    }

    /// 모든 워커 시작 (이미 시작되었으면 무시)
    pub fn start(&self) -> Result<()> {
        let mut started = self.started.lock();

        if *started {
            warn!("틱 스케줄러가 이미 실행 중입니다");
            return Ok(());
        }

        for worker in &self.workers {
            worker
                .start()
                .with_context(|| format!("틱 워커 시작 실패: {}", worker.name()))?;
        }

        *started = true;
        info!(
            "🕒 틱 스케줄러 시작 ({}Hz, 워커 {}개)",
            self.config.tick_rate,
            self.workers.len()
        );
        Ok(())
    }

    /// 모든 워커 중지 (시작 전이면 무시)
    ///
    /// 각 워커의 진행 중인 틱이 끝날 때까지 블로킹합니다.
    pub fn stop(&self) {
        let mut started = self.started.lock();

        if !*started {
            warn!("틱 스케줄러가 이미 중지되어 있습니다");
            return;
        }

        for worker in &self.workers {
            worker.stop();
        }

        *started = false;
        info!("✅ 틱 스케줄러 중지 완료");
    }

    /// 상태 스냅샷
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            started: self.is_started(),
            tick_rate: self.config.tick_rate,
            tracked: self.tracked_count(),
            workers: self.workers.iter().map(TickWorker::stats).collect(),
        }
    }

    /// 상태 스냅샷 JSON
    pub fn stats_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.stats())
    }

    fn least_loaded_worker(&self) -> usize {
        self.workers
            .iter()
            .enumerate()
            .min_by_key(|(index, worker)| (worker.load(), *index))
            .map(|(index, _)| index)
            .unwrap_or(0)
    }
}
