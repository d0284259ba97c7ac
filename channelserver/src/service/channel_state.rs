//! 채널 전역 상태
//!
//! 프로세스 전역 싱글턴 대신 시작 시 한 번 만들어 각 서비스에 주입합니다.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// 채널 상태
#[derive(Debug)]
pub struct ChannelState {
    channel_id: u32,
    service_name: String,
    /// 새 연결을 받지 않음
    idle: AtomicBool,
    /// 명령 처리와 송신 중단
    in_shutdown: AtomicBool,
    started_at: Instant,
}

impl ChannelState {
    pub fn new(channel_id: u32, service_name: impl Into<String>) -> Self {
        Self {
            channel_id,
            service_name: service_name.into(),
            idle: AtomicBool::new(false),
            in_shutdown: AtomicBool::new(false),
            started_at: Instant::now(),
        }
    }

    pub fn channel_id(&self) -> u32 {
        self.channel_id
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn is_idle(&self) -> bool {
        self.idle.load(Ordering::Acquire)
    }

    pub fn put_idle(&self) {
        self.idle.store(true, Ordering::Release);
    }

    pub fn in_shutdown(&self) -> bool {
        self.in_shutdown.load(Ordering::Acquire)
    }

    /// 종료 모드 진입. 이미 종료 중이면 `false`
    pub fn enter_shutdown(&self) -> bool {
        self.idle.store(true, Ordering::Release);
        !self.in_shutdown.swap(true, Ordering::AcqRel)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
