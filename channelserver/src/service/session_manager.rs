//! 세션 레지스트리
//!
//! 연결된 모든 세션과 캐릭터 이름/ID 색인을 보관합니다.

use dashmap::DashMap;
use serde::Serialize;
use shared::tool::AppError;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::identity::{CharacterInfo, SessionId};
use super::session::GameSession;

/// 레지스트리 통계
#[derive(Debug, Clone, Serialize)]
pub struct SessionManagerStats {
    pub sessions: usize,
    pub characters: usize,
    pub max_sessions: usize,
    pub peak_sessions: usize,
    pub total_registered: u64,
}

/// 세션 레지스트리
#[derive(Debug)]
pub struct SessionManager {
    sessions: DashMap<SessionId, Arc<GameSession>>,
    by_character_id: DashMap<i64, SessionId>,
    /// 소문자 이름 → 세션
    by_character_name: DashMap<String, SessionId>,
    max_sessions: usize,
    peak_sessions: AtomicUsize,
    total_registered: AtomicU64,
}

impl SessionManager {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            by_character_id: DashMap::new(),
            by_character_name: DashMap::new(),
            max_sessions,
            peak_sessions: AtomicUsize::new(0),
            total_registered: AtomicU64::new(0),
        }
    }

    /// 새 연결 등록
    pub fn register_connection(&self, session: Arc<GameSession>) -> Result<(), AppError> {
        let current = self.sessions.len();
        if current >= self.max_sessions {
            return Err(AppError::SessionLimitReached {
                current,
                max: self.max_sessions,
            });
        }

        let id = session.id();
        if self.sessions.insert(id, session).is_some() {
            warn!(session_id = id, "이미 등록된 세션 ID를 덮어씀");
        }

        self.total_registered.fetch_add(1, Ordering::Relaxed);
        self.peak_sessions.fetch_max(self.sessions.len(), Ordering::Relaxed);
        debug!(session_id = id, "세션 등록 (현재 {}개)", self.sessions.len());
        Ok(())
    }

    /// 캐릭터 색인 등록. 같은 캐릭터로 접속 중인 이전 세션 색인은 덮어씁니다.
    pub fn register_character(&self, session: &Arc<GameSession>, character: &CharacterInfo) {
        let id = session.id();
        if let Some(previous) = self.by_character_id.insert(character.character_id, id) {
            if previous != id {
                warn!(
                    "캐릭터 {} 색인이 세션 {}에서 {}로 이동",
                    character.name, previous, id
                );
            }
        }
        self.by_character_name.insert(character.name.to_lowercase(), id);
    }

    /// 캐릭터 색인 해제. 다른 세션이 차지한 색인은 건드리지 않습니다.
    pub fn unregister_character(&self, session_id: SessionId, character: &CharacterInfo) {
        self.by_character_id
            .remove_if(&character.character_id, |_, owner| *owner == session_id);
        self.by_character_name
            .remove_if(&character.name.to_lowercase(), |_, owner| *owner == session_id);
    }

    /// 세션 해제
    pub fn unregister(&self, session_id: SessionId) -> Option<Arc<GameSession>> {
        let removed = self.sessions.remove(&session_id).map(|(_, session)| session);
        if removed.is_some() {
            debug!(session_id, "세션 해제 (남은 세션 {}개)", self.sessions.len());
        }
        removed
    }

    pub fn get(&self, session_id: SessionId) -> Option<Arc<GameSession>> {
        self.sessions.get(&session_id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn get_by_character_id(&self, character_id: i64) -> Option<Arc<GameSession>> {
        let session_id = *self.by_character_id.get(&character_id)?;
        self.get(session_id)
    }

    /// 이름은 대소문자를 구분하지 않습니다.
    pub fn get_by_character_name(&self, name: &str) -> Option<Arc<GameSession>> {
        let session_id = *self.by_character_name.get(&name.to_lowercase())?;
        self.get(session_id)
    }

    pub fn sessions_by_account(&self, account_id: i64) -> Vec<Arc<GameSession>> {
        self.sessions
            .iter()
            .filter(|entry| entry.value().account_id() == Some(account_id))
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn all_sessions(&self) -> Vec<Arc<GameSession>> {
        self.sessions.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn character_count(&self) -> usize {
        self.by_character_id.len()
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    pub fn is_full(&self) -> bool {
        self.sessions.len() >= self.max_sessions
    }

    /// 캐릭터를 선택한 모든 세션에 패킷 송신 예약
    pub fn broadcast(&self, packet: &str) -> usize {
        self.all_sessions()
            .into_iter()
            .filter(|session| session.is_character_bound())
            .filter(|session| session.send_packet(packet))
            .count()
    }

    /// 모든 세션 강제 종료
    pub async fn disconnect_all(&self) -> usize {
        let sessions = self.all_sessions();
        let count = sessions.len();

        let mut tasks = JoinSet::new();
        for session in sessions {
            tasks.spawn(async move { session.force_disconnect().await });
        }
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!("세션 종료 작업 실패: {}", e);
            }
        }

        info!("세션 {}개 강제 종료", count);
        count
    }

    /// 계정의 모든 세션 강제 종료
    pub async fn kick_account(&self, account_id: i64) -> usize {
        let sessions = self.sessions_by_account(account_id);
        for session in &sessions {
            session.force_disconnect().await;
        }
        sessions.len()
    }

    pub fn stats(&self) -> SessionManagerStats {
        SessionManagerStats {
            sessions: self.session_count(),
            characters: self.character_count(),
            max_sessions: self.max_sessions,
            peak_sessions: self.peak_sessions.load(Ordering::Relaxed),
            total_registered: self.total_registered.load(Ordering::Relaxed),
        }
    }
}
