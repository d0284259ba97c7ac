//! 공통 에러 관리 시스템
//!
//! 월드 채널과 로그인 서버가 함께 쓰는 애플리케이션 에러를 정의합니다.
//! 설정, 외부 서비스, 접속 허가 단계에서 발생하는 에러를 분류하고
//! 심각도에 맞는 레벨로 로깅합니다.

use thiserror::Error;
use tracing::{error, info};

/// 공통 애플리케이션 에러 정의
///
/// 프로토콜 계층 바깥(설정, 외부 서비스 호출, 접속 허가)에서 발생하는 에러입니다.
/// 연결 단위 프로토콜 에러는 각 서버 크레이트가 별도로 정의합니다.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    // 설정 관련 에러
    #[error("설정 오류: {0}")]
    Configuration(String),

    // 외부 서비스 에러
    #[error("외부 API 호출 실패: {0}")]
    ExternalApiError(String),

    #[error("타임아웃: {0}")]
    Timeout(String),

    // 접속 허가 관련 에러
    #[error("접속 거부: {0}")]
    AdmissionRejected(String),

    #[error("세션 한도 초과: {current}/{max}")]
    SessionLimitReached { current: usize, max: usize },
}

impl AppError {
    /// 에러의 심각도를 반환합니다.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Critical: 서버 기동 불가
            AppError::Configuration(_) => ErrorSeverity::Critical,

            // High: 외부 의존성 실패 (재시도 대상)
            AppError::ExternalApiError(_) | AppError::Timeout(_) => ErrorSeverity::High,

            // Low: 정상 동작 중 발생하는 거부
            AppError::AdmissionRejected(_) | AppError::SessionLimitReached { .. } => {
                ErrorSeverity::Low
            }
        }
    }

    /// 재시도하면 성공할 수 있는 에러인지 확인합니다.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::ExternalApiError(_) | AppError::Timeout(_))
    }

    /// 에러를 로깅합니다.
    ///
    /// 심각도에 따라 적절한 로깅 레벨을 사용합니다.
    pub fn log(&self, context: &str) {
        let error_msg = self.to_string();

        match self.severity() {
            ErrorSeverity::Critical => {
                error!("[CRITICAL] {} - {}", context, error_msg);
            }
            ErrorSeverity::High => {
                error!("[HIGH] {} - {}", context, error_msg);
            }
            ErrorSeverity::Low => {
                info!("[LOW] {} - {}", context, error_msg);
            }
        }
    }
}

/// 에러 심각도 레벨
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Critical, // 시스템 장애
    High,     // 외부 의존성 실패
    Low,      // 일반적인 거부
}

/// 에러 처리 헬퍼 함수들
pub mod helpers {
    use super::*;

    /// anyhow 에러를 외부 API 에러로 감쌉니다.
    pub fn map_external<T>(result: anyhow::Result<T>, context: &str) -> Result<T, AppError> {
        result.map_err(|e| {
            let app_error = AppError::ExternalApiError(format!("{context}: {e}"));
            app_error.log(context);
            app_error
        })
    }

    /// 환경변수 문자열을 숫자로 파싱합니다. 실패 시 설정 에러를 반환합니다.
    pub fn parse_setting<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
        raw.trim()
            .parse::<T>()
            .map_err(|_| AppError::Configuration(format!("{key}={raw} 값을 해석할 수 없습니다")))
    }
}
