//! 월드 채널 서버 라이브러리
//!
//! 레거시 텍스트 프로토콜을 쓰는 멀티플레이어 게임 채널 서버의 핵심입니다.
//!
//! # 주요 기능
//!
//! - **세션 프로토콜**: 핸드셰이크, 핸드셰이크 조각 조립, 킵얼라이브 검증, 명령 라우팅
//! - **와이어 코덱**: 월드/로그인 방언 난독화, 세션 언어별 코드 페이지
//! - **틱 스케줄러**: 고정 주파수 시뮬레이션 워커와 부하 기반 배정
//! - **리스너**: 접속 허가 필터, 세션 한도, 세션 레지스트리
//! - **클러스터 연동**: 생존 신호, 강제 퇴장 알림, 정상 종료 절차
//!
//! # 아키텍처
//!
//! ```text
//! Channel Server
//! ├── Protocol Layer (와이어 형식)
//! │   ├── world_codec / login_codec
//! │   ├── text_encoding
//! │   └── packet_flow (세션 상태 머신)
//! ├── Service Layer
//! │   ├── GameSession (연결 하나의 런타임)
//! │   ├── SessionManager (세션 레지스트리)
//! │   ├── TcpService (리스너)
//! │   ├── PulseService (생존 신호)
//! │   └── ChannelStopService (종료 절차)
//! ├── Handler Layer (외부 협력자 인터페이스)
//! ├── Tick Layer (TickScheduler, TickWorker)
//! └── Tool Layer (에러, 유틸리티)
//! ```

/// 환경 설정 관리
pub mod config;

/// 외부 협력자 인터페이스와 기본 구현
pub mod handler;

/// 와이어 코덱과 세션 프로토콜 상태 머신
pub mod protocol;

/// 세션 런타임과 채널 서비스들
pub mod service;

/// 고정 주기 틱 스케줄러
pub mod tick;

/// 공통 유틸리티 도구들
pub mod tool;

#[cfg(test)]
mod tests;

pub use config::{validate_config, ChannelServerConfig};
pub use handler::{AdminCommandExecutor, CommandDispatcher, ServerApi, SessionService};
pub use protocol::{PacketAction, PacketFlow, RegionLanguage, SessionStage};
pub use service::{
    ChannelState, ChannelStopService, GameSession, PulseService, SessionContext, SessionManager, SessionOptions,
    TcpService,
};
pub use tick::{Processable, TickConfig, TickScheduler};
pub use tool::{ChannelError, ChannelResult, SimpleUtils};
