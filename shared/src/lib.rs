//! 공유 라이브러리
//!
//! 월드 채널 서버와 로그인 서버가 함께 사용하는 구성 요소입니다.
//!
//! - **tool**: 공통 에러 타입 (`AppError`)
//! - **logging**: tracing 기반 로깅 초기화
//! - **security**: IP 기반 접속 허가 필터

pub mod logging;
pub mod security;
pub mod tool;

pub use security::{AdmissionConfig, AdmissionDecision, AdmissionFilter};
pub use tool::{AppError, ErrorSeverity};
