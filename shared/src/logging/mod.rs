//! 통합 로깅 시스템
//!
//! `tracing` + `tracing-subscriber` 기반의 로깅 초기화를 제공합니다.
//!
//! # 사용 예시
//! ```rust,no_run
//! use shared::logging::{init_tracing, LoggingConfig, ServiceType};
//!
//! let config = LoggingConfig::from_env();
//! init_tracing(ServiceType::ChannelServer, &config).ok();
//! tracing::info!("채널 서버 시작");
//! ```

pub mod config;

pub use config::{LoggingConfig, ServiceType};

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// 로깅 시스템 초기화 함수
///
/// `RUST_LOG` 환경변수가 있으면 그 값을 우선 사용하고, 없으면 설정의 기본 레벨을 씁니다.
/// 이미 전역 subscriber가 설치되어 있으면 아무것도 하지 않고 `Ok(false)`를 반환합니다.
///
/// # Returns
/// 새로 설치했으면 `true`
pub fn init_tracing(service_type: ServiceType, config: &LoggingConfig) -> Result<bool> {
    config.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.effective_directive()));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_ansi(config.ansi)
        .with_thread_names(true)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            service = service_type.as_str(),
            prefix = service_type.log_prefix(),
            "로깅 시스템 초기화 완료"
        );
    }

    Ok(installed)
}
