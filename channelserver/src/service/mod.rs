//! 채널 서비스 레이어
//!
//! 세션 런타임, 세션 레지스트리, 리스너, 생존 신호, 종료 절차를 제공합니다.

pub mod channel_state;
pub mod identity;
pub mod pulse_service;
pub mod session;
pub mod session_manager;
pub mod stop_service;
pub mod tcp_service;

pub use channel_state::ChannelState;
pub use identity::{AccountInfo, AuthorityType, CharacterInfo, SessionId};
pub use pulse_service::{PulseService, PulseStats};
pub use session::{BoxedReader, BoxedWriter, GameSession, SessionContext, SessionOptions, SessionStats};
pub use session_manager::{SessionManager, SessionManagerStats};
pub use stop_service::ChannelStopService;
pub use tcp_service::{TcpService, TcpServiceStats};
