//! 채널 서버 에러 처리 시스템
//!
//! 세션 프로토콜 계층과 틱 스케줄러에서 발생하는 에러를 분류합니다.
//! 연결에 치명적인 에러(핸드셰이크, 킵얼라이브, 디코딩, 쓰기 실패)는 즉시 강제 종료로,
//! 국소적인 에러(핸들러 실패, 틱 처리 실패)는 로깅 후 계속 진행으로 이어집니다.

use thiserror::Error;
use tracing::{error, info, warn};

use crate::protocol::CodecError;

/// 채널 서버 에러 타입
#[derive(Debug, Error)]
pub enum ChannelError {
    /// 코덱 인코딩/디코딩 실패
    #[error("코덱 에러: {0}")]
    Codec(#[from] CodecError),

    /// 핸드셰이크 패킷 형식 오류
    #[error("핸드셰이크 에러 [세션 {session_id}]: {message}")]
    Handshake { session_id: u64, message: String },

    /// 킵얼라이브 순번 불일치
    #[error("킵얼라이브 불일치 [세션 {session_id}]: 기대값 {expected}, 수신 {received}")]
    KeepAlive {
        session_id: u64,
        expected: u16,
        received: String,
    },

    /// 명령 핸들러 실패
    #[error("디스패치 에러 [헤더: {header}]: {message}")]
    Dispatch { header: String, message: String },

    /// 네트워크 I/O 실패
    #[error("네트워크 에러 [작업: {operation}]: {source}")]
    Network {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// 송신 큐가 가득 참
    #[error("송신 큐 포화 [세션 {session_id}]: {pending}개 대기 중")]
    QueueFull { session_id: u64, pending: usize },

    /// 세션 상태 전이 오류
    #[error("세션 상태 에러 [세션 {session_id}]: {message}")]
    InvalidState { session_id: u64, message: String },

    /// 설정 관련 에러
    #[error("설정 에러 [키: {key}]: {message}")]
    Configuration { key: String, message: String },

    /// 내부 시스템 에러
    #[error("내부 에러 [컴포넌트: {component}]: {message}")]
    Internal { component: String, message: String },
}

impl ChannelError {
    /// 이 에러가 발생한 연결을 즉시 끊어야 하는지 여부
    ///
    /// 레거시 와이어 포맷에는 재동기화 지점이 없으므로 프레이밍 계층 에러는 모두 치명적입니다.
    pub fn is_fatal_to_connection(&self) -> bool {
        matches!(
            self,
            ChannelError::Codec(_)
                | ChannelError::Handshake { .. }
                | ChannelError::KeepAlive { .. }
                | ChannelError::Network { .. }
                | ChannelError::QueueFull { .. }
        )
    }

    /// 기본 심각도
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ChannelError::Dispatch { .. } | ChannelError::InvalidState { .. } => {
                ErrorSeverity::Warning
            }
            ChannelError::Codec(_)
            | ChannelError::Handshake { .. }
            | ChannelError::KeepAlive { .. }
            | ChannelError::QueueFull { .. } => ErrorSeverity::Warning,
            ChannelError::Network { .. } => ErrorSeverity::Error,
            ChannelError::Configuration { .. } | ChannelError::Internal { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    /// 네트워크 에러 생성
    pub fn network(operation: &str, source: std::io::Error) -> Self {
        Self::Network {
            operation: operation.to_string(),
            source,
        }
    }

    /// 디스패치 에러 생성
    pub fn dispatch(header: &str, message: impl ToString) -> Self {
        Self::Dispatch {
            header: header.to_string(),
            message: message.to_string(),
        }
    }

    /// 내부 에러 생성
    pub fn internal(component: &str, message: impl ToString) -> Self {
        Self::Internal {
            component: component.to_string(),
            message: message.to_string(),
        }
    }
}

/// 에러 심각도 레벨
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// 정보성 - 정상 동작 중 발생하는 예상 가능한 상황
    Info,
    /// 경고 - 해당 명령/연결만 영향
    Warning,
    /// 에러 - 기능에 영향을 주지만 복구 가능
    Error,
    /// 치명적 - 서비스 중단이 필요한 심각한 문제
    Critical,
}

/// 에러 핸들러
///
/// 잡힌 에러를 컴포넌트/작업 이름과 함께 한 곳에서 로깅합니다.
pub struct ErrorHandler;

impl ErrorHandler {
    /// 에러를 처리하고 로깅합니다.
    ///
    /// # Arguments
    ///
    /// * `error` - 처리할 에러
    /// * `severity` - 에러 심각도
    /// * `component` - 에러가 발생한 컴포넌트
    /// * `operation` - 에러가 발생한 작업
    pub fn handle_error(error: &ChannelError, severity: ErrorSeverity, component: &str, operation: &str) {
        let log_message = format!("[{}] [{}] {}", component, operation, error);

        match severity {
            ErrorSeverity::Info => info!("{}", log_message),
            ErrorSeverity::Warning => warn!("{}", log_message),
            ErrorSeverity::Error => error!("{}", log_message),
            ErrorSeverity::Critical => {
                error!("🚨 CRITICAL: {}", log_message);
            }
        }
    }

    /// 에러 자체의 기본 심각도로 처리합니다.
    pub fn handle(error: &ChannelError, component: &str, operation: &str) {
        Self::handle_error(error, error.severity(), component, operation);
    }
}

/// 결과 타입 별칭
pub type ChannelResult<T> = Result<T, ChannelError>;

impl From<std::io::Error> for ChannelError {
    fn from(err: std::io::Error) -> Self {
        Self::network("io_operation", err)
    }
}
