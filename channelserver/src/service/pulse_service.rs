//! 클러스터 생존 신호 서비스
//!
//! 고정 간격으로 채널 ID와 세션 수를 마스터 서버에 보고합니다.
//! 보고 실패는 로깅만 하고 다음 주기에 다시 시도합니다.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use shared::tool::helpers::map_external;
use shared::tool::AppError;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::channel_state::ChannelState;
use super::session_manager::SessionManager;
use crate::handler::ServerApi;
use crate::tool::SimpleUtils;

/// 생존 신호 통계
#[derive(Debug, Clone, Default, Serialize)]
pub struct PulseStats {
    pub total_pulses: u64,
    pub failed_pulses: u64,
    /// 마지막 성공 시각 (Unix timestamp)
    pub last_pulse_timestamp: Option<i64>,
    pub last_sessions_count: usize,
}

/// 생존 신호 서비스
pub struct PulseService {
    api: Arc<dyn ServerApi>,
    channel: Arc<ChannelState>,
    sessions: Arc<SessionManager>,
    period: Duration,
    is_running: Arc<Mutex<bool>>,
    pulse_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
    pulse_stats: Arc<parking_lot::Mutex<PulseStats>>,
}

impl PulseService {
    pub fn new(
        api: Arc<dyn ServerApi>,
        channel: Arc<ChannelState>,
        sessions: Arc<SessionManager>,
        period: Duration,
    ) -> Self {
        Self {
            api,
            channel,
            sessions,
            period: period.max(Duration::from_millis(1)),
            is_running: Arc::new(Mutex::new(false)),
            pulse_handle: Arc::new(Mutex::new(None)),
            pulse_stats: Arc::new(parking_lot::Mutex::new(PulseStats::default())),
        }
    }

    /// 생존 신호 시작
    pub async fn start(&self) -> Result<()> {
        let mut is_running = self.is_running.lock().await;

        if *is_running {
            warn!("생존 신호가 이미 실행 중입니다");
            return Ok(());
        }

        *is_running = true;
        drop(is_running);

        info!("🔄 [GAME_PULSE_SYSTEM] 시작 ({:?} 간격)", self.period);

        let api = Arc::clone(&self.api);
        let channel = Arc::clone(&self.channel);
        let sessions = Arc::clone(&self.sessions);
        let stats_ref = Arc::clone(&self.pulse_stats);
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let sessions_count = sessions.session_count();
                // 응답이 한 주기를 넘기면 실패로 보고 다음 주기에 다시 보냄
                let result = match timeout(period, api.pulse(channel.channel_id(), sessions_count)).await {
                    Ok(result) => map_external(result, "ServerApi::pulse"),
                    Err(_) => {
                        let error = AppError::Timeout(format!("ServerApi::pulse ({:?})", period));
                        error.log("PulseService");
                        Err(error)
                    }
                };

                let mut stats = stats_ref.lock();
                stats.total_pulses += 1;
                stats.last_sessions_count = sessions_count;
                match result {
                    Ok(()) => {
                        stats.last_pulse_timestamp = Some(SimpleUtils::current_timestamp());
                        debug!("[GAME_PULSE_SYSTEM] 채널 {} 세션 {}개 보고", channel.channel_id(), sessions_count);
                    }
                    Err(e) if e.is_transient() => {
                        stats.failed_pulses += 1;
                        debug!("[GAME_PULSE_SYSTEM] 다음 주기에 재시도");
                    }
                    Err(e) => {
                        stats.failed_pulses += 1;
                        error!("[GAME_PULSE_SYSTEM] 재시도 불가 에러: {}", e);
                    }
                }
            }
        });

        *self.pulse_handle.lock().await = Some(handle);
        Ok(())
    }

    /// 생존 신호 중지
    pub async fn stop(&self) -> Result<()> {
        let mut is_running = self.is_running.lock().await;

        if !*is_running {
            warn!("생존 신호가 이미 중지되어 있습니다");
            return Ok(());
        }

        *is_running = false;
        drop(is_running);

        if let Some(handle) = self.pulse_handle.lock().await.take() {
            handle.abort();
        }

        info!("🛑 [GAME_PULSE_SYSTEM] 중지");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.lock().await
    }

    pub fn stats(&self) -> PulseStats {
        self.pulse_stats.lock().clone()
    }
}
