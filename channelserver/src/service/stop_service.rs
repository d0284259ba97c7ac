//! 채널 정상 종료

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use shared::tool::helpers::map_external;
use std::time::Duration;
use tracing::{info, warn};

use super::channel_state::ChannelState;
use super::pulse_service::PulseService;
use super::session_manager::SessionManager;
use super::tcp_service::TcpService;
use crate::handler::ServerApi;
use crate::tick::TickScheduler;
use crate::tool::SimpleUtils;

/// 채널 종료 절차
///
/// 1. 마스터 서버 등록 해제
/// 2. 유휴 전환 (새 연결 거부)
/// 3. 종료 공지 송신
/// 4. 모든 세션 강제 종료 (종료 직전 송신 큐를 비움)
/// 5. 종료 모드 진입
/// 6. 리스너, 틱 스케줄러, 생존 신호 중지
/// 7. 유예 시간 대기
pub struct ChannelStopService {
    api: Arc<dyn ServerApi>,
    channel: Arc<ChannelState>,
    sessions: Arc<SessionManager>,
    listener: Arc<TcpService>,
    scheduler: Arc<TickScheduler>,
    pulse: Arc<PulseService>,
    grace: Duration,
    stopping: AtomicBool,
}

impl ChannelStopService {
    pub fn new(
        api: Arc<dyn ServerApi>,
        channel: Arc<ChannelState>,
        sessions: Arc<SessionManager>,
        listener: Arc<TcpService>,
        scheduler: Arc<TickScheduler>,
        pulse: Arc<PulseService>,
        grace: Duration,
    ) -> Self {
        Self {
            api,
            channel,
            sessions,
            listener,
            scheduler,
            pulse,
            grace,
            stopping: AtomicBool::new(false),
        }
    }

    /// 종료 절차 실행. 두 번째 호출부터는 아무것도 하지 않습니다.
    pub async fn stop(&self, notice: &str) -> Result<()> {
        if self.stopping.swap(true, Ordering::AcqRel) {
            warn!("채널이 이미 종료 중입니다");
            return Ok(());
        }

        info!("🛑 채널 {} 종료 시작", self.channel.channel_id());

        // 실패는 map_external이 로깅하고 종료는 계속 진행
        let _ = map_external(
            self.api.unregister_channel(self.channel.channel_id()).await,
            "ServerApi::unregister_channel",
        );

        self.channel.put_idle();

        let notified = self.sessions.broadcast(notice);
        info!("종료 공지 송신: {}개 세션", notified);

        let disconnected = self.sessions.disconnect_all().await;
        self.channel.enter_shutdown();

        self.listener.stop().await?;
        self.pulse.stop().await?;

        let scheduler = Arc::clone(&self.scheduler);
        if let Err(e) = tokio::task::spawn_blocking(move || scheduler.stop()).await {
            warn!("틱 스케줄러 중지 실패: {}", e);
        }

        info!(
            "세션 {}개 종료, {}초 후 프로세스 종료 (가동 시간 {})",
            disconnected,
            self.grace.as_secs(),
            SimpleUtils::format_uptime(self.channel.uptime())
        );
        tokio::time::sleep(self.grace).await;

        info!("✅ 채널 {} 종료 완료", self.channel.channel_id());
        Ok(())
    }
}
