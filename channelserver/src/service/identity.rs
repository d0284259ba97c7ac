//! 세션에 연결되는 계정/캐릭터 정보

use serde::{Deserialize, Serialize};

use crate::protocol::RegionLanguage;

/// 세션 식별자 (리스너가 순차 할당)
pub type SessionId = u64;

/// 계정 권한 등급
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum AuthorityType {
    Banned,
    #[default]
    User,
    Vip,
    Moderator,
    GameMaster,
    SuperGameMaster,
    Owner,
}

/// 인증된 계정 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_id: i64,
    pub name: String,
    pub authority: AuthorityType,
    pub language: RegionLanguage,
    pub client_version: String,
}

impl AccountInfo {
    pub fn new(account_id: i64, name: impl Into<String>) -> Self {
        Self {
            account_id,
            name: name.into(),
            authority: AuthorityType::default(),
            language: RegionLanguage::default(),
            client_version: String::new(),
        }
    }

    pub fn with_authority(mut self, authority: AuthorityType) -> Self {
        self.authority = authority;
        self
    }

    pub fn with_language(mut self, language: RegionLanguage) -> Self {
        self.language = language;
        self
    }
}

/// 선택된 캐릭터 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterInfo {
    pub character_id: i64,
    pub name: String,
}

impl CharacterInfo {
    pub fn new(character_id: i64, name: impl Into<String>) -> Self {
        Self {
            character_id,
            name: name.into(),
        }
    }
}
