//! 클러스터 알림 처리
//!
//! 마스터 서버가 보내는 강제 퇴장 알림을 세션 레지스트리에 적용합니다.
//! 모든 퇴장은 `force_disconnect`를 거치므로 로컬 종료와 겹쳐도 한 번만 처리됩니다.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::service::channel_state::ChannelState;
use crate::service::identity::AuthorityType;
use crate::service::session_manager::SessionManager;

/// 클러스터 알림
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClusterNotification {
    /// 캐릭터 ID 우선, 없으면 이름으로 찾음
    KickPlayer {
        #[serde(default)]
        character_id: Option<i64>,
        #[serde(default)]
        name: Option<String>,
    },
    KickAccount {
        account_id: i64,
    },
    /// GameMaster 이상 권한은 제외
    KickAll {
        #[serde(default)]
        targeted_service: String,
        #[serde(default)]
        is_global: bool,
    },
}

impl ClusterNotification {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("클러스터 알림 파싱 실패")
    }
}

/// 알림 적용기
pub struct NotificationHandler {
    sessions: Arc<SessionManager>,
    channel: Arc<ChannelState>,
}

impl NotificationHandler {
    pub fn new(sessions: Arc<SessionManager>, channel: Arc<ChannelState>) -> Self {
        Self { sessions, channel }
    }

    /// 알림 적용. 종료시킨 세션 수를 반환합니다.
    pub async fn apply(&self, notification: ClusterNotification) -> usize {
        match notification {
            ClusterNotification::KickPlayer { character_id, name } => {
                let session = match (character_id, name.as_deref()) {
                    (Some(id), _) => self.sessions.get_by_character_id(id),
                    (None, Some(name)) => self.sessions.get_by_character_name(name),
                    (None, None) => None,
                };

                let Some(session) = session else {
                    debug!("퇴장 대상 캐릭터가 이 채널에 없습니다");
                    return 0;
                };

                session.force_disconnect().await;
                1
            }
            ClusterNotification::KickAccount { account_id } => {
                let kicked = self.sessions.kick_account(account_id).await;
                if kicked > 0 {
                    info!("계정 {} 세션 {}개 퇴장", account_id, kicked);
                }
                kicked
            }
            ClusterNotification::KickAll {
                targeted_service,
                is_global,
            } => {
                if !is_global && targeted_service != self.channel.service_name() {
                    return 0;
                }

                let mut kicked = 0;
                for session in self.sessions.all_sessions() {
                    let privileged = session
                        .account()
                        .map(|account| account.authority >= AuthorityType::GameMaster)
                        .unwrap_or(false);
                    if privileged {
                        continue;
                    }

                    session.force_disconnect().await;
                    kicked += 1;
                }

                info!("🛑 전체 퇴장: 세션 {}개", kicked);
                kicked
            }
        }
    }

    /// JSON 알림 적용
    pub async fn apply_json(&self, json: &str) -> Result<usize> {
        let notification = ClusterNotification::from_json(json)?;
        Ok(self.apply(notification).await)
    }
}
