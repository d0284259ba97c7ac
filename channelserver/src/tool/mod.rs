//! 채널 서버 공통 유틸리티 모듈
//!
//! 에러 분류와 시간 관련 유틸리티를 제공합니다.

pub mod error;
pub mod simple_utils;

pub use error::{ChannelError, ChannelResult, ErrorHandler, ErrorSeverity};
pub use simple_utils::*;
