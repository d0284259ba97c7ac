//! 채널 서버 환경 설정 모듈
//!
//! .env 파일과 환경변수에서 채널 서버 설정을 로드합니다.

use anyhow::Result;
use shared::security::AdmissionConfig;
use shared::tool::helpers::parse_setting;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::protocol::Dialect;
use crate::service::SessionOptions;
use crate::tick::TickConfig;

/// 채널 서버 설정
#[derive(Debug, Clone)]
pub struct ChannelServerConfig {
    /// 바인드 호스트
    pub host: String,
    /// 바인드 포트
    pub port: u16,
    /// 마스터 서버에 보고하는 채널 ID
    pub channel_id: u32,
    /// 최대 동시 세션 수
    pub session_limit: usize,
    /// 틱 주파수 (Hz)
    pub tick_rate: u32,
    /// 틱 워커 수 (스케줄러 생성 시 고정)
    pub tick_workers: usize,
    pub flush_interval: Duration,
    pub inbound_capacity: usize,
    pub outbound_capacity: usize,
    pub admission_max_attempts: usize,
    pub admission_min_interval: Duration,
    pub pulse_interval: Duration,
    /// 종료 공지 후 프로세스 종료까지 대기 시간
    pub shutdown_grace: Duration,
}

impl Default for ChannelServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1337,
            channel_id: 1,
            session_limit: 1000,
            tick_rate: 20,
            tick_workers: 2,
            flush_interval: Duration::from_millis(50),
            inbound_capacity: 256,
            outbound_capacity: 4096,
            admission_max_attempts: 2,
            admission_min_interval: Duration::from_millis(150),
            pulse_interval: Duration::from_secs(5),
            shutdown_grace: Duration::from_secs(15),
        }
    }
}

impl ChannelServerConfig {
    /// 환경변수에서 설정을 로드합니다.
    ///
    /// 로드 순서:
    /// 1. .env 파일 (../.env, .env, ../../.env 순서)
    /// 2. 시스템 환경변수
    /// 3. 기본값
    ///
    /// 값이 있지만 해석할 수 없으면 에러를 반환합니다.
    pub fn from_env() -> Result<Self> {
        Self::load_env_file();

        let defaults = Self::default();
        let config = Self {
            host: std::env::var("GAME_SERVER_IP").unwrap_or(defaults.host),
            port: env_or("GAME_SERVER_PORT", defaults.port)?,
            channel_id: env_or("GAME_SERVER_CHANNEL_ID", defaults.channel_id)?,
            session_limit: env_or("GAME_SERVER_SESSION_LIMIT", defaults.session_limit)?,
            tick_rate: env_or("WINGSEMU_TICK_RATE", defaults.tick_rate)?,
            tick_workers: env_or("WINGSEMU_TICK_WORKERS", defaults.tick_workers)?,
            flush_interval: Duration::from_millis(env_or(
                "SESSION_FLUSH_INTERVAL_MS",
                defaults.flush_interval.as_millis() as u64,
            )?),
            inbound_capacity: env_or("SESSION_INBOUND_CAPACITY", defaults.inbound_capacity)?,
            outbound_capacity: env_or("SESSION_OUTBOUND_CAPACITY", defaults.outbound_capacity)?,
            admission_max_attempts: env_or("ADMISSION_MAX_ATTEMPTS", defaults.admission_max_attempts)?,
            admission_min_interval: Duration::from_millis(env_or(
                "ADMISSION_MIN_INTERVAL_MS",
                defaults.admission_min_interval.as_millis() as u64,
            )?),
            pulse_interval: Duration::from_secs(env_or(
                "PULSE_INTERVAL_SECS",
                defaults.pulse_interval.as_secs(),
            )?),
            shutdown_grace: Duration::from_secs(env_or(
                "SHUTDOWN_GRACE_SECS",
                defaults.shutdown_grace.as_secs(),
            )?),
        };

        info!("채널 서버 설정 로드 완료: {:?}", config);
        Ok(config)
    }

    /// 바인드 주소
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 서비스 이름 (클러스터 알림 대상 식별)
    pub fn service_name(&self) -> String {
        format!("channel-{}", self.channel_id)
    }

    pub fn tick_config(&self) -> TickConfig {
        TickConfig {
            tick_rate: self.tick_rate,
            workers: self.tick_workers,
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            dialect: Dialect::World,
            flush_interval: self.flush_interval,
            inbound_capacity: self.inbound_capacity,
            outbound_capacity: self.outbound_capacity,
        }
    }

    pub fn admission_config(&self) -> AdmissionConfig {
        AdmissionConfig {
            max_attempts_before_blacklist: self.admission_max_attempts,
            min_interval: self.admission_min_interval,
        }
    }

    /// .env 파일을 로드합니다.
    fn load_env_file() {
        let env_paths = ["../.env", ".env", "../../.env"];

        let mut loaded = false;
        for path in env_paths {
            if Path::new(path).exists() && dotenv::from_filename(path).is_ok() {
                info!(".env 파일 로드 성공: {}", path);
                loaded = true;
                break;
            }
        }

        if !loaded {
            warn!(".env 파일을 찾을 수 없습니다. 기본값과 시스템 환경변수를 사용합니다.");
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => Ok(parse_setting(key, &raw)?),
        Err(_) => Ok(default),
    }
}

/// 설정 검증 유틸리티
pub fn validate_config(config: &ChannelServerConfig) -> Result<()> {
    if config.host.is_empty() {
        anyhow::bail!("채널 서버 호스트 주소가 비어있습니다");
    }

    if config.port == 0 {
        anyhow::bail!("유효하지 않은 채널 서버 포트 번호: {}", config.port);
    }

    if config.session_limit == 0 {
        anyhow::bail!("세션 한도는 0일 수 없습니다");
    }

    if config.tick_rate == 0 {
        anyhow::bail!("틱 주파수는 0일 수 없습니다");
    }

    if config.tick_workers == 0 {
        anyhow::bail!("틱 워커 수는 0일 수 없습니다");
    }

    if config.flush_interval.is_zero() {
        anyhow::bail!("송신 주기는 0일 수 없습니다");
    }

    if config.inbound_capacity == 0 || config.outbound_capacity == 0 {
        anyhow::bail!(
            "세션 큐 크기는 0일 수 없습니다 (수신 {}, 송신 {})",
            config.inbound_capacity,
            config.outbound_capacity
        );
    }

    if config.admission_max_attempts == 0 {
        anyhow::bail!("접속 허가 시도 한도는 0일 수 없습니다");
    }

    if config.pulse_interval.is_zero() {
        anyhow::bail!("생존 신호 주기는 0일 수 없습니다");
    }

    let cpus = num_cpus::get();
    if config.tick_workers > cpus {
        warn!("틱 워커 수({})가 CPU 코어 수({})보다 많습니다", config.tick_workers, cpus);
    }

    Ok(())
}
