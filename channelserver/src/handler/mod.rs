//! 채널 서버 핸들러 레이어
//!
//! 프로토콜 계층이 호출하는 외부 협력자의 인터페이스를 정의합니다.
//! 실제 게임 로직(전투, 퀘스트, 거래 등)은 이 트레이트를 구현하는 플러그인의 몫입니다.

pub mod default_handlers;
pub mod notification_handler;

pub use default_handlers::{LocalSessionService, StandaloneServerApi, UnhandledCommandLogger};
pub use notification_handler::{ClusterNotification, NotificationHandler};

use async_trait::async_trait;
use std::sync::Arc;

use crate::service::identity::CharacterInfo;
use crate::service::GameSession;

/// 명령 디스패처
///
/// 디코딩된 명령 헤더와 원본 라인을 받아 애플리케이션 로직을 실행합니다.
/// 에러를 반환해도 세션은 유지됩니다.
#[async_trait]
pub trait CommandDispatcher: Send + Sync {
    async fn dispatch(&self, session: &Arc<GameSession>, header: &str, line: &str) -> anyhow::Result<()>;
}

/// 관리자 명령 실행기 (`$`, `%` 접두 명령)
#[async_trait]
pub trait AdminCommandExecutor: Send + Sync {
    async fn execute(&self, session: &Arc<GameSession>, prefix: char, line: &str) -> anyhow::Result<()>;
}

/// 클러스터 세션 서비스
///
/// 로그인 슬롯 예약과 캐릭터 접속 상태를 관리하는 외부 서비스입니다.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// 캐릭터 선택 완료 알림
    async fn character_connected(
        &self,
        account_id: i64,
        session_key: i32,
        character: &CharacterInfo,
    ) -> anyhow::Result<()>;

    /// 세션 종료 알림 (캐릭터 선택 여부와 무관)
    async fn disconnect(&self, account_id: i64, session_key: i32) -> anyhow::Result<()>;
}

/// 마스터 서버 API
#[async_trait]
pub trait ServerApi: Send + Sync {
    /// 채널 생존 신호
    async fn pulse(&self, channel_id: u32, sessions_count: usize) -> anyhow::Result<()>;

    /// 채널 등록 해제
    async fn unregister_channel(&self, channel_id: u32) -> anyhow::Result<()>;
}
