//! 접속 허가 필터 모듈
//!
//! 소스 IP별 접속 시도 이력을 추적해 새 TCP 연결을 받을지 결정합니다.
//! 짧은 간격으로 연달아 들어오는 시도는 거부하고, 누적 시도가 한도를 넘으면
//! 프로세스 수명 동안 블랙리스트에 올립니다.
//!
//! 프로세스 로컬 메모리 기반의 best-effort 필터이며 영속화하지 않습니다.

use dashmap::{DashMap, DashSet};
use serde::Serialize;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::interval;

/// 접속 허가 판정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// 접속 허용
    Accepted,
    /// 직전 시도와의 간격이 너무 짧음 (블랙리스트 아님)
    TooSoon,
    /// 이번 시도로 블랙리스트에 등록됨
    Blacklisted,
    /// 이미 블랙리스트에 있는 주소
    AlreadyBlacklisted,
}

impl AdmissionDecision {
    /// 접속 허용 여부
    pub fn is_accepted(&self) -> bool {
        matches!(self, AdmissionDecision::Accepted)
    }
}

/// 접속 허가 필터 설정
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// 블랙리스트 전까지 누적 가능한 시도 수
    pub max_attempts_before_blacklist: usize,
    /// 같은 주소에서의 최소 접속 간격
    pub min_interval: Duration,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_attempts_before_blacklist: 2,
            min_interval: Duration::from_millis(150),
        }
    }
}

/// 접속 허가 통계
#[derive(Debug, Default)]
struct AdmissionCounters {
    total_attempts: AtomicU64,
    accepted: AtomicU64,
    rejected_too_soon: AtomicU64,
    rejected_blacklisted: AtomicU64,
}

/// 통계 스냅샷
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdmissionStats {
    pub total_attempts: u64,
    pub accepted: u64,
    pub rejected_too_soon: u64,
    pub rejected_blacklisted: u64,
    pub tracked_addresses: usize,
    pub blacklisted_addresses: usize,
}

/// IP별 접속 허가 필터
///
/// 동시에 들어오는 여러 접속 시도에서 공유되므로 DashMap의 엔트리 잠금으로
/// 주소 단위 판정을 원자적으로 수행합니다.
pub struct AdmissionFilter {
    config: AdmissionConfig,
    /// IP별 최근 시도 시각
    history: DashMap<IpAddr, Vec<Instant>>,
    /// 영구 차단 주소
    blacklist: DashSet<IpAddr>,
    counters: AdmissionCounters,
}

impl AdmissionFilter {
    /// 새 필터 생성
    pub fn new(config: AdmissionConfig) -> Self {
        Self {
            config,
            history: DashMap::new(),
            blacklist: DashSet::new(),
            counters: AdmissionCounters::default(),
        }
    }

    /// 현재 시각 기준으로 접속 허가 여부를 판정합니다.
    pub fn check(&self, ip: IpAddr) -> AdmissionDecision {
        self.check_at(ip, Instant::now())
    }

    /// 주어진 시각 기준으로 접속 허가 여부를 판정합니다.
    ///
    /// 허용된 시도는 이력을 해당 시도 하나로 줄입니다. 다음 시도의 간격 판정에는
    /// 쓰이지만 버스트 카운터는 초기화됩니다.
    pub fn check_at(&self, ip: IpAddr, now: Instant) -> AdmissionDecision {
        if self.blacklist.contains(&ip) {
            self.counters
                .rejected_blacklisted
                .fetch_add(1, Ordering::Relaxed);
            return AdmissionDecision::AlreadyBlacklisted;
        }

        self.counters.total_attempts.fetch_add(1, Ordering::Relaxed);

        let mut attempts = self.history.entry(ip).or_default();
        let previous = attempts.last().copied();
        attempts.push(now);

        if attempts.len() > self.config.max_attempts_before_blacklist {
            attempts.clear();
            drop(attempts);
            self.history.remove(&ip);
            self.blacklist.insert(ip);
            self.counters
                .rejected_blacklisted
                .fetch_add(1, Ordering::Relaxed);

            tracing::warn!(target: "security", ip = %ip, "[ADMISSION] 블랙리스트 등록");
            return AdmissionDecision::Blacklisted;
        }

        if let Some(previous) = previous {
            if now.saturating_duration_since(previous) <= self.config.min_interval {
                self.counters
                    .rejected_too_soon
                    .fetch_add(1, Ordering::Relaxed);
                tracing::debug!(target: "security", ip = %ip, "[ADMISSION] 접속 간격이 너무 짧음");
                return AdmissionDecision::TooSoon;
            }
        }

        attempts.clear();
        attempts.push(now);
        self.counters.accepted.fetch_add(1, Ordering::Relaxed);
        AdmissionDecision::Accepted
    }

    /// 블랙리스트 여부 확인
    pub fn is_blacklisted(&self, ip: IpAddr) -> bool {
        self.blacklist.contains(&ip)
    }

    /// 추적 중인 시도 수 (블랙리스트 주소는 0)
    pub fn attempts_for(&self, ip: IpAddr) -> usize {
        self.history.get(&ip).map(|a| a.len()).unwrap_or(0)
    }

    /// 오래된 이력 정리 (블랙리스트는 유지)
    pub fn purge_stale(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let before = self.history.len();

        self.history.retain(|_, attempts| {
            attempts
                .last()
                .map(|last| now.saturating_duration_since(*last) <= max_age)
                .unwrap_or(false)
        });

        before.saturating_sub(self.history.len())
    }

    /// 주기적인 이력 정리 작업 시작
    pub fn spawn_cleanup_task(self: &Arc<Self>, every: Duration, max_age: Duration) -> JoinHandle<()> {
        let filter = Arc::clone(self);

        tokio::spawn(async move {
            let mut cleanup_interval = interval(every);

            loop {
                cleanup_interval.tick().await;

                let removed = filter.purge_stale(max_age);
                if removed > 0 {
                    tracing::debug!("Admission filter cleanup: removed {} entries", removed);
                }
            }
        })
    }

    /// 통계 조회
    pub fn stats(&self) -> AdmissionStats {
        AdmissionStats {
            total_attempts: self.counters.total_attempts.load(Ordering::Relaxed),
            accepted: self.counters.accepted.load(Ordering::Relaxed),
            rejected_too_soon: self.counters.rejected_too_soon.load(Ordering::Relaxed),
            rejected_blacklisted: self.counters.rejected_blacklisted.load(Ordering::Relaxed),
            tracked_addresses: self.history.len(),
            blacklisted_addresses: self.blacklist.len(),
        }
    }
}

impl Default for AdmissionFilter {
    fn default() -> Self {
        Self::new(AdmissionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn ip(raw: &str) -> IpAddr {
        IpAddr::from_str(raw).expect("Failed to parse IP address")
    }

    #[test]
    fn test_slow_connections_are_accepted() {
        let filter = AdmissionFilter::default();
        let addr = ip("10.0.0.1");
        let start = Instant::now();

        for i in 0..5u64 {
            let at = start + Duration::from_millis(200 * i);
            assert_eq!(filter.check_at(addr, at), AdmissionDecision::Accepted);
        }

        assert!(!filter.is_blacklisted(addr));
        assert_eq!(filter.attempts_for(addr), 1);
    }

    #[test]
    fn test_burst_blacklists_on_third_attempt() {
        let filter = AdmissionFilter::default();
        let addr = ip("10.0.0.2");
        let start = Instant::now();

        assert_eq!(filter.check_at(addr, start), AdmissionDecision::Accepted);
        assert_eq!(
            filter.check_at(addr, start + Duration::from_millis(10)),
            AdmissionDecision::TooSoon
        );
        assert!(!filter.is_blacklisted(addr));
        assert_eq!(
            filter.check_at(addr, start + Duration::from_millis(20)),
            AdmissionDecision::Blacklisted
        );
        assert!(filter.is_blacklisted(addr));

        // 블랙리스트 이후 시도는 기록 없이 거부
        let before = filter.stats().total_attempts;
        assert_eq!(
            filter.check_at(addr, start + Duration::from_secs(60)),
            AdmissionDecision::AlreadyBlacklisted
        );
        assert_eq!(filter.stats().total_attempts, before);
        assert_eq!(filter.attempts_for(addr), 0);
    }

    #[test]
    fn test_addresses_are_independent() {
        let filter = AdmissionFilter::default();
        let start = Instant::now();

        assert!(filter.check_at(ip("10.0.0.3"), start).is_accepted());
        assert!(filter.check_at(ip("10.0.0.4"), start).is_accepted());
    }

    #[test]
    fn test_boundary_interval_is_rejected() {
        let filter = AdmissionFilter::default();
        let addr = ip("10.0.0.5");
        let start = Instant::now();

        assert!(filter.check_at(addr, start).is_accepted());
        assert_eq!(
            filter.check_at(addr, start + Duration::from_millis(150)),
            AdmissionDecision::TooSoon
        );
    }

    #[test]
    fn test_purge_keeps_blacklist() {
        let filter = AdmissionFilter::default();
        let start = Instant::now();
        let burst = ip("10.0.0.6");

        filter.check_at(burst, start);
        filter.check_at(burst, start);
        filter.check_at(burst, start);
        filter.check_at(ip("10.0.0.7"), start);

        filter.purge_stale(Duration::ZERO);
        assert!(filter.is_blacklisted(burst));
    }

    #[test]
    fn test_cleanup_task_purges_history() {
        let filter = Arc::new(AdmissionFilter::default());
        let addr = ip("10.0.0.8");
        filter.check(addr);
        assert_eq!(filter.attempts_for(addr), 1);

        tokio_test::block_on(async {
            let handle = filter.spawn_cleanup_task(Duration::from_millis(10), Duration::ZERO);
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.abort();
        });

        assert_eq!(filter.attempts_for(addr), 0);
        println!("✅ 이력 정리 작업 테스트 통과");
    }
}
