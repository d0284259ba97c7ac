//! 월드 채널 서버 진입점
//!
//! 환경 설정은 .env 파일과 환경변수에서 로드됩니다 (`ChannelServerConfig::from_env`).
//! Ctrl+C를 받으면 종료 공지를 보내고 정상 종료 절차를 밟습니다.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use channelserver::handler::{LocalSessionService, StandaloneServerApi, UnhandledCommandLogger};
use channelserver::{
    validate_config, ChannelServerConfig, ChannelState, ChannelStopService, PulseService, ServerApi,
    SessionContext, SessionManager, TcpService, TickScheduler,
};
use shared::logging::{init_tracing, LoggingConfig, ServiceType};
use shared::security::AdmissionFilter;

const SHUTDOWN_NOTICE: &str = "say 1 0 10 채널이 곧 종료됩니다";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(ServiceType::ChannelServer, &LoggingConfig::from_env())?;

    let config = ChannelServerConfig::from_env()?;
    validate_config(&config)?;

    info!("=== 채널 서버 설정 ===");
    info!("채널 ID: {}", config.channel_id);
    info!("바인드 주소: {}", config.bind_address());
    info!("세션 한도: {}", config.session_limit);
    info!("틱: {}Hz x {} 워커", config.tick_rate, config.tick_workers);
    info!("====================");

    let scheduler = Arc::new(TickScheduler::new(config.tick_config()));
    let channel = Arc::new(ChannelState::new(config.channel_id, config.service_name()));
    let sessions = Arc::new(SessionManager::new(config.session_limit));
    let server_api: Arc<dyn ServerApi> = Arc::new(StandaloneServerApi);
    let commands = Arc::new(UnhandledCommandLogger::default());

    let context = Arc::new(SessionContext {
        dispatcher: commands.clone(),
        admin: commands,
        session_service: Arc::new(LocalSessionService),
        session_manager: Arc::clone(&sessions),
        scheduler: Arc::clone(&scheduler),
        channel: Arc::clone(&channel),
        options: config.session_options(),
    });

    let admission = Arc::new(AdmissionFilter::new(config.admission_config()));
    let cleanup = admission.spawn_cleanup_task(
        std::time::Duration::from_secs(60),
        std::time::Duration::from_secs(600),
    );

    let listener = Arc::new(TcpService::new(config.bind_address(), Arc::clone(&context), admission));
    let pulse = Arc::new(PulseService::new(
        Arc::clone(&server_api),
        Arc::clone(&channel),
        Arc::clone(&sessions),
        config.pulse_interval,
    ));

    scheduler.start().context("틱 스케줄러 시작 실패")?;
    listener.start().await?;
    pulse.start().await?;

    info!("🚀 채널 {} 준비 완료", config.channel_id);

    tokio::signal::ctrl_c().await?;
    info!("종료 시그널 수신, 서버를 중지합니다...");

    let stop_service = ChannelStopService::new(
        server_api,
        channel,
        sessions,
        listener,
        scheduler,
        pulse,
        config.shutdown_grace,
    );
    stop_service.stop(SHUTDOWN_NOTICE).await?;
    cleanup.abort();

    Ok(())
}
