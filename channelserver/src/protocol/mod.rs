//! 레거시 텍스트 게임 프로토콜
//!
//! 와이어 난독화 코덱(월드/로그인 방언), 세션 언어별 코드 페이지,
//! 그리고 연결 하나의 핸드셰이크/킵얼라이브 상태 머신을 제공합니다.
//!
//! # 구조
//!
//! ```text
//! protocol
//! ├── text_encoding  (RegionLanguage → 8비트 코드 페이지)
//! ├── world_codec    (길이 접두 + 비트 반전 청크, 0xFF 트레일러)
//! ├── login_codec    (+15 / XOR 0xC3 변환)
//! └── packet_flow    (핸드셰이크 → 조각 조립 → 킵얼라이브 → 명령 라우팅)
//! ```

pub mod login_codec;
pub mod packet_flow;
pub mod text_encoding;
pub mod world_codec;

pub use packet_flow::{PacketAction, PacketFlow, SessionStage};
pub use text_encoding::RegionLanguage;

use thiserror::Error;

/// 패킷 구분 센티널 바이트 (월드 프레임 트레일러)
pub const PACKET_SENTINEL: u8 = 0xFF;

/// 코덱 에러
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// 청크 길이 바이트가 허용 범위(1..=126)를 벗어남
    #[error("잘못된 청크 길이 {length} (오프셋 {offset})")]
    InvalidChunkLength { length: u8, offset: usize },

    /// 트레일러 없이 끝난 프레임
    #[error("프레임이 {0}바이트에서 잘림")]
    TruncatedFrame(usize),

    /// 로그인 응답의 마지막 바이트가 센티널(25)이 아님
    #[error("로그인 응답 센티널 누락")]
    MissingLoginSentinel,

    /// 로그인 요청에 1바이트로 표현할 수 없는 문자가 있음
    #[error("1바이트 범위를 벗어난 문자: U+{0:04X}")]
    CharOutOfRange(u32),
}

/// 다이얼렉트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// 월드 채널 프로토콜
    World,
    /// 로그인 서버 프로토콜
    Login,
}
