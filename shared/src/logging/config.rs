//! 로깅 설정 관리
//!
//! 로깅 시스템의 설정 파라미터와 서비스 타입 정의를 담당합니다.

use serde::{Deserialize, Serialize};

/// 서비스 타입 열거형
///
/// 로그 출력 시 어느 서버 컴포넌트에서 나온 로그인지 구분합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    /// 월드 채널 서버
    ChannelServer,
    /// 로그인 서버
    LoginServer,
    /// 공유 라이브러리
    Shared,
}

impl ServiceType {
    /// 서비스 타입을 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::ChannelServer => "channelserver",
            ServiceType::LoginServer => "loginserver",
            ServiceType::Shared => "shared",
        }
    }

    /// 로그 접두사 반환
    pub fn log_prefix(&self) -> &'static str {
        match self {
            ServiceType::ChannelServer => "world",
            ServiceType::LoginServer => "login",
            ServiceType::Shared => "shared",
        }
    }
}

/// 로깅 시스템 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 기본 로그 레벨 (RUST_LOG가 없을 때 사용, 기본값: "info")
    pub level: String,

    /// 디버그 모드 - 레벨을 debug로 올림 (기본값: false)
    pub debug_mode: bool,

    /// 로그에 target(모듈 경로) 표시 여부 (기본값: true)
    pub with_target: bool,

    /// ANSI 컬러 출력 여부 (기본값: true)
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            debug_mode: false,
            with_target: true,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("LOG_LEVEL") {
            if !val.trim().is_empty() {
                config.level = val.trim().to_lowercase();
            }
        }

        if let Ok(val) = std::env::var("LOG_DEBUG_MODE") {
            config.debug_mode = val.to_lowercase() == "true";
        }

        if let Ok(val) = std::env::var("LOG_WITH_TARGET") {
            config.with_target = val.to_lowercase() == "true";
        }

        if let Ok(val) = std::env::var("LOG_ANSI") {
            config.ansi = val.to_lowercase() == "true";
        }

        config
    }

    /// 실제로 적용될 기본 필터 지시문
    pub fn effective_directive(&self) -> &str {
        if self.debug_mode {
            "debug"
        } else {
            &self.level
        }
    }

    /// 설정 유효성 검증
    pub fn validate(&self) -> anyhow::Result<()> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

        if !LEVELS.contains(&self.level.as_str()) {
            return Err(anyhow::anyhow!("unknown log level: {}", self.level));
        }

        Ok(())
    }
}
