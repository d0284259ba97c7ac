//! 연결 하나의 패킷 흐름 상태 머신
//!
//! 소켓이나 타이머를 모르는 순수 상태 머신입니다. 디코딩된 패킷 문자열 하나를 받아
//! 세션이 수행할 동작([`PacketAction`])을 돌려줍니다.
//!
//! ```text
//! Unauthenticated ──"카운터 키"──▶ AwaitingHandshakeFragments ──조각 3개(DAC는 1개)──▶ Authenticated
//!                                                                                      │  ▲
//!                                                                      bind_character ▼  │ unbind_character
//!                                                                                 CharacterBound
//! (모든 상태) ──▶ Disconnected
//! ```

use serde::Serialize;

use crate::tool::error::ChannelError;

/// 핸드셰이크 완료 시 디스패치되는 합성 명령 헤더
pub const ENTRY_POINT_HEADER: &str = "entry";

/// 교차 서버 인증 마커
pub const CROSS_SERVER_MARKER: &str = "DAC";

/// 일반 핸드셰이크에서 기다리는 조각 수
pub const HANDSHAKE_FRAGMENT_COUNT: usize = 3;

/// 관리자 명령 접두 문자
pub const COMMAND_PREFIXES: [char; 2] = ['$', '%'];

/// 채팅 구분 문자
pub const CHAT_DELIMITERS: [char; 4] = ['/', ':', ';', '!'];

/// 세션 인증 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionStage {
    /// 세션 키 미할당 (키 = 0)
    Unauthenticated,
    /// 키 할당 후 로그인 조각 대기
    AwaitingHandshakeFragments,
    /// 인증 완료, 캐릭터 미선택
    Authenticated,
    /// 캐릭터 선택 완료
    CharacterBound,
    /// 종료됨
    Disconnected,
}

/// 연결을 끊어야 하는 프로토콜 위반
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// 핸드셰이크 카운터가 정수가 아님
    MalformedHandshake { packet: String },
    /// 킵얼라이브 순번 불일치
    KeepAliveMismatch { expected: u16, received: String },
}

impl ProtocolViolation {
    /// 세션 에러로 변환
    pub fn into_error(self, session_id: u64) -> ChannelError {
        match self {
            ProtocolViolation::MalformedHandshake { packet } => ChannelError::Handshake {
                session_id,
                message: format!("정수가 아닌 핸드셰이크 카운터: {:?}", packet),
            },
            ProtocolViolation::KeepAliveMismatch { expected, received } => ChannelError::KeepAlive {
                session_id,
                expected,
                received,
            },
        }
    }
}

/// 패킷 하나를 처리한 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketAction {
    /// 할 일 없음
    None,
    /// 세션 키 할당됨
    KeyAssigned(i32),
    /// 명령 디스패처로 전달
    Dispatch { header: String, line: String },
    /// 관리자 명령 실행기로 전달
    AdminCommand { prefix: char, line: String },
    /// 연결 강제 종료
    Reject(ProtocolViolation),
}

/// 패킷 흐름 상태
#[derive(Debug)]
pub struct PacketFlow {
    stage: SessionStage,
    session_key: i32,
    last_keepalive: u16,
    fragments: Vec<String>,
    required_fragments: usize,
}

impl Default for PacketFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketFlow {
    pub fn new() -> Self {
        Self {
            stage: SessionStage::Unauthenticated,
            session_key: 0,
            last_keepalive: 0,
            fragments: Vec::with_capacity(HANDSHAKE_FRAGMENT_COUNT),
            required_fragments: HANDSHAKE_FRAGMENT_COUNT,
        }
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    pub fn session_key(&self) -> i32 {
        self.session_key
    }

    pub fn last_keepalive(&self) -> u16 {
        self.last_keepalive
    }

    /// 버퍼에 쌓인 핸드셰이크 조각 수
    pub fn pending_fragments(&self) -> usize {
        self.fragments.len()
    }

    /// 디코딩된 패킷 하나를 처리합니다.
    pub fn handle(&mut self, packet: &str) -> PacketAction {
        if packet.is_empty() {
            return PacketAction::None;
        }

        match self.stage {
            SessionStage::Unauthenticated => self.handle_unauthenticated(packet),
            SessionStage::AwaitingHandshakeFragments => self.handle_fragment(packet),
            SessionStage::Authenticated | SessionStage::CharacterBound => self.handle_world(packet),
            SessionStage::Disconnected => PacketAction::None,
        }
    }

    /// 캐릭터 선택 완료 (Authenticated → CharacterBound)
    pub fn bind_character(&mut self) -> bool {
        if self.stage != SessionStage::Authenticated {
            return false;
        }
        self.stage = SessionStage::CharacterBound;
        true
    }

    /// 명시적인 로그아웃 (CharacterBound → Authenticated)
    pub fn unbind_character(&mut self) -> bool {
        if self.stage != SessionStage::CharacterBound {
            return false;
        }
        self.stage = SessionStage::Authenticated;
        true
    }

    /// 종료 상태로 전환. 이미 종료되었으면 `false`
    pub fn mark_disconnected(&mut self) -> bool {
        if self.stage == SessionStage::Disconnected {
            return false;
        }
        self.stage = SessionStage::Disconnected;
        self.fragments.clear();
        true
    }

    fn handle_unauthenticated(&mut self, packet: &str) -> PacketAction {
        let parts: Vec<&str> = packet.split(' ').collect();

        let Some(counter) = parse_handshake_counter(parts[0]) else {
            return PacketAction::Reject(ProtocolViolation::MalformedHandshake {
                packet: packet.to_string(),
            });
        };
        self.last_keepalive = counter;

        let Some(raw_key) = parts.get(1) else {
            return PacketAction::None;
        };

        let key = raw_key
            .split('\\')
            .next()
            .and_then(|token| token.parse::<i32>().ok())
            .unwrap_or(0);
        if key == 0 {
            return PacketAction::None;
        }

        self.session_key = key;
        self.fragments.clear();
        self.required_fragments = HANDSHAKE_FRAGMENT_COUNT;
        self.stage = SessionStage::AwaitingHandshakeFragments;
        PacketAction::KeyAssigned(key)
    }

    fn handle_fragment(&mut self, packet: &str) -> PacketAction {
        let packet_string = packet.replace('^', " ");
        let parts: Vec<&str> = packet_string.split(' ').collect();

        // 카운터가 붙은 조각이면 카운터를 기록하고 두 번째 토큰을 조각으로 사용
        let (rest, counted) = match parse_handshake_counter(parts[0]) {
            Some(counter) if parts.len() > 1 => {
                self.last_keepalive = counter;
                (&parts[1..], true)
            }
            _ => (&parts[..], false),
        };

        if rest.len() > 2 && rest[0] == CROSS_SERVER_MARKER {
            self.fragments.clear();
            self.fragments.push(rest.join(" "));
            self.required_fragments = 1;
        } else {
            let fragment = if counted { rest[0].to_string() } else { packet_string.clone() };
            if fragment.is_empty() {
                return PacketAction::None;
            }
            self.fragments.push(fragment);
        }

        if self.fragments.len() != self.required_fragments {
            return PacketAction::None;
        }

        let line = self.fragments.join(" ");
        let header = if self.required_fragments == 1 {
            line.split([' ', '^']).next().unwrap_or_default().to_string()
        } else {
            ENTRY_POINT_HEADER.to_string()
        };

        self.fragments.clear();
        self.required_fragments = HANDSHAKE_FRAGMENT_COUNT;
        self.stage = SessionStage::Authenticated;
        PacketAction::Dispatch { header, line }
    }

    fn handle_world(&mut self, packet: &str) -> PacketAction {
        let packet_string = packet.replace('^', " ");
        let parts: Vec<&str> = packet_string.split(' ').collect();

        let expected = self.last_keepalive.wrapping_add(1);
        match parts[0].parse::<u16>() {
            Ok(counter) if counter == expected => self.last_keepalive = counter,
            _ => {
                return PacketAction::Reject(ProtocolViolation::KeepAliveMismatch {
                    expected,
                    received: parts[0].to_string(),
                });
            }
        }

        let Some(command) = parts.get(1).filter(|c| !c.is_empty()) else {
            return PacketAction::None;
        };
        let Some(first) = command.chars().next() else {
            return PacketAction::None;
        };

        // 원문 그대로의 명령 부분 ('^'는 유지)
        let raw_command = command_remainder(packet, &packet_string);

        if COMMAND_PREFIXES.contains(&first) {
            return PacketAction::AdminCommand {
                prefix: first,
                line: raw_command.to_string(),
            };
        }

        if CHAT_DELIMITERS.contains(&first) {
            // 구분 문자 뒤에 공백을 넣어 헤더를 구분 문자 하나로 만든다
            let mut line = raw_command.to_string();
            line.insert(first.len_utf8(), ' ');
            return PacketAction::Dispatch {
                header: first.to_string(),
                line,
            };
        }

        if *command == "0" {
            return PacketAction::None;
        }

        PacketAction::Dispatch {
            header: command.replace('#', ""),
            line: after_first_space(&packet_string).to_string(),
        }
    }
}

fn after_first_space(packet: &str) -> &str {
    packet.split_once(' ').map(|(_, rest)| rest).unwrap_or_default()
}

/// 정규화한 패킷의 첫 구분자 위치로 원문에서 명령 부분을 잘라냅니다.
///
/// '^'와 공백은 모두 1바이트이므로 두 문자열의 바이트 위치가 같습니다.
fn command_remainder<'a>(raw: &'a str, normalized: &str) -> &'a str {
    normalized
        .find(' ')
        .and_then(|idx| raw.get(idx + 1..))
        .unwrap_or_default()
}

/// 핸드셰이크 카운터는 정수면 허용하고 킵얼라이브 범위(u16)로 줄입니다.
fn parse_handshake_counter(token: &str) -> Option<u16> {
    token.parse::<i32>().ok().map(|counter| counter as u16)
}
