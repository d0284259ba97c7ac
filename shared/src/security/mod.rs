//! 보안 모듈 - 접속 허가 필터
//!
//! 월드 채널과 로그인 서버의 리스너가 새 연결을 받기 전에 사용합니다.

pub mod admission_filter;

pub use admission_filter::*;
