//! 단독 실행용 기본 협력자
//!
//! 게임 로직 플러그인이나 마스터 서버 없이 채널을 띄울 때 사용합니다.
//! 모든 호출은 로깅만 하고 성공합니다.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{AdminCommandExecutor, CommandDispatcher, ServerApi, SessionService};
use crate::service::identity::CharacterInfo;
use crate::service::GameSession;

/// 처리되지 않은 명령을 로깅하는 디스패처
#[derive(Debug, Default)]
pub struct UnhandledCommandLogger {
    unhandled: AtomicU64,
}

impl UnhandledCommandLogger {
    pub fn unhandled_count(&self) -> u64 {
        self.unhandled.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CommandDispatcher for UnhandledCommandLogger {
    async fn dispatch(&self, session: &Arc<GameSession>, header: &str, line: &str) -> anyhow::Result<()> {
        self.unhandled.fetch_add(1, Ordering::Relaxed);
        warn!(
            session_id = session.id(),
            account_id = session.account_id().unwrap_or_default(),
            "UNRESOLVED_PACKET: {} ({}바이트)",
            header,
            line.len()
        );
        Ok(())
    }
}

#[async_trait]
impl AdminCommandExecutor for UnhandledCommandLogger {
    async fn execute(&self, session: &Arc<GameSession>, prefix: char, line: &str) -> anyhow::Result<()> {
        self.unhandled.fetch_add(1, Ordering::Relaxed);
        warn!(session_id = session.id(), "처리되지 않은 관리자 명령: {}{}", prefix, line);
        Ok(())
    }
}

/// 로컬 세션 서비스 (알림을 로깅만 함)
#[derive(Debug, Default)]
pub struct LocalSessionService;

#[async_trait]
impl SessionService for LocalSessionService {
    async fn character_connected(
        &self,
        account_id: i64,
        session_key: i32,
        character: &CharacterInfo,
    ) -> anyhow::Result<()> {
        info!(
            "캐릭터 접속: {} (계정 {}, 키 {})",
            character.name, account_id, session_key
        );
        Ok(())
    }

    async fn disconnect(&self, account_id: i64, session_key: i32) -> anyhow::Result<()> {
        debug!("세션 슬롯 해제: 계정 {}, 키 {}", account_id, session_key);
        Ok(())
    }
}

/// 마스터 서버 없이 동작하는 API
#[derive(Debug, Default)]
pub struct StandaloneServerApi;

#[async_trait]
impl ServerApi for StandaloneServerApi {
    async fn pulse(&self, channel_id: u32, sessions_count: usize) -> anyhow::Result<()> {
        debug!("[GAME_PULSE_SYSTEM] 채널 {} 세션 {}개", channel_id, sessions_count);
        Ok(())
    }

    async fn unregister_channel(&self, channel_id: u32) -> anyhow::Result<()> {
        info!("채널 {} 등록 해제", channel_id);
        Ok(())
    }
}
