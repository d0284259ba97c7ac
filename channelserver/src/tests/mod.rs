//! 채널 서버 테스트 모듈
//!
//! 각 기능별로 분리된 테스트 파일들과 공용 테스트 도구를 관리합니다.

pub mod test_service;

use anyhow::anyhow;
use async_trait::async_trait;
use bytes::BytesMut;
use chrono::{DateTime, Utc};
use encoding_rs::WINDOWS_1250;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream};

use crate::handler::{AdminCommandExecutor, CommandDispatcher, SessionService};
use crate::protocol::world_codec;
use crate::service::{
    AccountInfo, ChannelState, CharacterInfo, GameSession, SessionContext, SessionManager, SessionOptions,
};
use crate::tick::{Processable, ProcessableId, TickConfig, TickScheduler};

/// 기록된 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    pub session_id: u64,
    pub header: String,
    pub line: String,
}

/// 명령을 기록하는 테스트 디스패처
///
/// - `entry`: 계정 연결 후 `entry_ok` 송신
/// - `select <name>`: 캐릭터 선택 (틱 객체 포함)
/// - `fail`: 에러 반환
/// - `boom`: 패닉
#[derive(Default)]
pub struct RecordingDispatcher {
    commands: Mutex<Vec<RecordedCommand>>,
    processables: Mutex<Vec<Arc<TestProcessable>>>,
    in_flight: AtomicBool,
    overlapped: AtomicBool,
}

impl RecordingDispatcher {
    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.commands.lock().clone()
    }

    pub fn headers(&self) -> Vec<String> {
        self.commands.lock().iter().map(|c| c.header.clone()).collect()
    }

    pub fn command_count(&self) -> usize {
        self.commands.lock().len()
    }

    pub fn processables(&self) -> Vec<Arc<TestProcessable>> {
        self.processables.lock().clone()
    }

    /// 한 세션의 명령이 겹쳐 실행된 적이 있는지
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    fn record(&self, session: &Arc<GameSession>, header: &str, line: &str) {
        self.commands.lock().push(RecordedCommand {
            session_id: session.id(),
            header: header.to_string(),
            line: line.to_string(),
        });
    }
}

#[async_trait]
impl CommandDispatcher for RecordingDispatcher {
    async fn dispatch(&self, session: &Arc<GameSession>, header: &str, line: &str) -> anyhow::Result<()> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        self.record(session, header, line);

        let result = match header {
            "entry" => {
                let name = line.split(' ').next().unwrap_or_default();
                session.initialize_account(AccountInfo::new(100 + session.id() as i64, name));
                session.send_packet("entry_ok");
                Ok(())
            }
            "select" => {
                let name = line.split(' ').nth(1).unwrap_or("hero");
                let processable = Arc::new(TestProcessable::new(session.id()));
                self.processables.lock().push(Arc::clone(&processable));
                let processable: Arc<dyn Processable> = processable;
                session
                    .bind_character(CharacterInfo::new(session.id() as i64, name), Some(processable))
                    .await
                    .map_err(|e| anyhow!(e))
            }
            "slow" => {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(())
            }
            "fail" => Err(anyhow!("처리 실패")),
            "boom" => {
                self.in_flight.store(false, Ordering::SeqCst);
                panic!("핸들러 내부 패닉");
            }
            _ => Ok(()),
        };

        self.in_flight.store(false, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl AdminCommandExecutor for RecordingDispatcher {
    async fn execute(&self, session: &Arc<GameSession>, prefix: char, line: &str) -> anyhow::Result<()> {
        self.record(session, &prefix.to_string(), line);
        Ok(())
    }
}

/// 알림 횟수를 세는 세션 서비스
#[derive(Default)]
pub struct CountingSessionService {
    pub connected: AtomicU64,
    pub disconnected: AtomicU64,
    pub disconnected_keys: Mutex<Vec<(i64, i32)>>,
}

impl CountingSessionService {
    pub fn disconnect_count(&self) -> u64 {
        self.disconnected.load(Ordering::SeqCst)
    }

    pub fn connect_count(&self) -> u64 {
        self.connected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionService for CountingSessionService {
    async fn character_connected(
        &self,
        _account_id: i64,
        _session_key: i32,
        _character: &CharacterInfo,
    ) -> anyhow::Result<()> {
        self.connected.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self, account_id: i64, session_key: i32) -> anyhow::Result<()> {
        self.disconnected.fetch_add(1, Ordering::SeqCst);
        self.disconnected_keys.lock().push((account_id, session_key));
        Ok(())
    }
}

/// 틱 횟수와 중복 실행을 기록하는 틱 객체
pub struct TestProcessable {
    id: ProcessableId,
    name: String,
    ticks: AtomicU64,
    in_tick: AtomicBool,
    overlapped: AtomicBool,
}

impl TestProcessable {
    pub fn new(id: ProcessableId) -> Self {
        Self {
            id,
            name: format!("test-{}", id),
            ticks: AtomicU64::new(0),
            in_tick: AtomicBool::new(false),
            overlapped: AtomicBool::new(false),
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }
}

impl Processable for TestProcessable {
    fn id(&self) -> ProcessableId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn process_tick(&self, _now: DateTime<Utc>) -> anyhow::Result<()> {
        if self.in_tick.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        self.ticks.fetch_add(1, Ordering::SeqCst);
        self.in_tick.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// 테스트용 채널 구성
pub struct TestHarness {
    pub context: Arc<SessionContext>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub session_service: Arc<CountingSessionService>,
    pub sessions: Arc<SessionManager>,
    pub scheduler: Arc<TickScheduler>,
    pub channel: Arc<ChannelState>,
}

/// 테스트용 채널 구성 생성
pub fn create_test_harness(options: SessionOptions) -> TestHarness {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let session_service = Arc::new(CountingSessionService::default());
    let sessions = Arc::new(SessionManager::new(100));
    let scheduler = Arc::new(TickScheduler::new(TickConfig {
        tick_rate: 50,
        workers: 2,
    }));
    let channel = Arc::new(ChannelState::new(1, "channel-1"));

    let context = Arc::new(SessionContext {
        dispatcher: dispatcher.clone(),
        admin: dispatcher.clone(),
        session_service: session_service.clone(),
        session_manager: Arc::clone(&sessions),
        scheduler: Arc::clone(&scheduler),
        channel: Arc::clone(&channel),
        options,
    });

    TestHarness {
        context,
        dispatcher,
        session_service,
        sessions,
        scheduler,
        channel,
    }
}

/// 빠른 송신 주기를 쓰는 세션 옵션
pub fn fast_options() -> SessionOptions {
    SessionOptions {
        flush_interval: Duration::from_millis(5),
        ..SessionOptions::default()
    }
}

/// 메모리 스트림 위에 세션을 띄우고 클라이언트 쪽 스트림을 돌려줍니다.
pub fn spawn_duplex_session(harness: &TestHarness, id: u64) -> (Arc<GameSession>, TestClient<DuplexStream>) {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let (reader, writer) = tokio::io::split(server);
    let peer: SocketAddr = format!("127.0.0.1:{}", 40000 + id).parse().unwrap();

    let session = GameSession::new(id, peer, Box::new(writer), Arc::clone(&harness.context));
    harness.sessions.register_connection(Arc::clone(&session)).unwrap();
    session.start(Box::new(reader));

    (session, TestClient::new(client))
}

/// 조건이 참이 될 때까지 최대 5초 대기
pub async fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// 월드 방언 테스트 클라이언트
pub struct TestClient<S> {
    stream: S,
    buf: BytesMut,
    key: i32,
}

impl<S: AsyncRead + AsyncWrite + Unpin> TestClient<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buf: BytesMut::new(),
            key: 0,
        }
    }

    /// 이후 송신 프레임에 사용할 세션 키
    pub fn set_key(&mut self, key: i32) {
        self.key = key;
    }

    pub async fn send(&mut self, text: &str) -> std::io::Result<()> {
        let bytes = world_codec::encode_with_key(text, self.key, WINDOWS_1250);
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await
    }

    /// 다음 패킷 수신. 연결이 닫히거나 2초 안에 오지 않으면 `None`
    pub async fn recv(&mut self) -> Option<String> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            if let Ok(Some(packet)) = world_codec::decode_frame(&mut self.buf, 0, WINDOWS_1250) {
                if !packet.is_empty() {
                    return Some(packet);
                }
                continue;
            }

            let read = tokio::time::timeout_at(deadline, self.stream.read_buf(&mut self.buf)).await;
            match read {
                Ok(Ok(n)) if n > 0 => {}
                _ => return None,
            }
        }
    }

    /// 지정 바이트로 끝나는 응답 원본 수신 (로그인 방언용)
    pub async fn recv_raw_until(&mut self, terminator: u8) -> Option<Vec<u8>> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == terminator) {
                return Some(self.buf.split_to(pos + 1).to_vec());
            }

            let read = tokio::time::timeout_at(deadline, self.stream.read_buf(&mut self.buf)).await;
            match read {
                Ok(Ok(n)) if n > 0 => {}
                _ => return None,
            }
        }
    }

    /// 서버가 연결을 닫았는지 (남은 데이터는 버림)
    pub async fn is_closed(&mut self) -> bool {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let mut scratch = [0u8; 1024];
            match tokio::time::timeout_at(deadline, self.stream.read(&mut scratch)).await {
                Ok(Ok(0)) | Ok(Err(_)) => return true,
                Ok(Ok(_)) => continue,
                Err(_) => return false,
            }
        }
    }

    /// 핸드셰이크 전체 수행 (`entry` 디스패치까지)
    pub async fn handshake(&mut self, key: i32, user: &str) -> std::io::Result<()> {
        self.send(&format!("0 {}", key)).await?;
        self.set_key(key);
        self.send(user).await?;
        self.send("pw").await?;
        self.send("1.0").await
    }
}
