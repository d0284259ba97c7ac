//! 고정 주기 틱 스케줄러
//!
//! 캐릭터, 몬스터 같은 시뮬레이션 객체([`Processable`])를 N개의 전용 워커 스레드에 분배하고
//! 고정 주파수로 갱신합니다. 새 객체는 마지막 측정 부하가 가장 낮은 워커에 배정됩니다.

pub mod scheduler;
pub mod worker;

pub use scheduler::{SchedulerStats, TickScheduler};
pub use worker::{TickWorker, WorkerStats};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// 틱 객체 식별자
pub type ProcessableId = u64;

/// 틱마다 갱신되는 시뮬레이션 객체
///
/// 한 객체는 어느 순간에도 하나의 워커에서만 갱신됩니다.
pub trait Processable: Send + Sync {
    /// 고유 식별자
    fn id(&self) -> ProcessableId;

    /// 진단용 이름
    fn name(&self) -> &str;

    /// 틱 한 번 처리. `now`는 해당 틱의 시작 시각입니다.
    fn process_tick(&self, now: DateTime<Utc>) -> anyhow::Result<()>;
}

/// 틱 설정
#[derive(Debug, Clone, Copy)]
pub struct TickConfig {
    /// 초당 틱 수
    pub tick_rate: u32,
    /// 워커 스레드 수
    pub workers: usize,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20,
            workers: 2,
        }
    }
}

/// 스케줄러와 워커가 함께 보는 소유권 테이블
#[derive(Debug, Default)]
pub(crate) struct OwnershipTable {
    /// 등록된 객체 → 담당 워커 인덱스
    owners: DashMap<ProcessableId, usize>,
    /// 제거 요청이 아직 워커에 반영되지 않은 객체 → 워커 인덱스
    retiring: DashMap<ProcessableId, usize>,
}

impl OwnershipTable {
    pub(crate) fn is_owned_by(&self, id: ProcessableId, worker: usize) -> bool {
        self.owners.get(&id).map(|owner| *owner == worker).unwrap_or(false)
    }

    pub(crate) fn removal_applied(&self, id: ProcessableId, worker: usize) {
        self.retiring.remove_if(&id, |_, owner| *owner == worker);
    }
}
