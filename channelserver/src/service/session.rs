//! 게임 세션
//!
//! TCP 연결 하나를 소유하고 다음 작업을 수행합니다.
//!
//! - **수신 루프**: 바이트를 프레임 단위로 디코딩해 패킷 흐름 상태 머신에 넣습니다.
//!   캐릭터 선택 전에는 즉시 처리하고, 선택 후에는 대기 큐에 넣습니다.
//! - **처리 루프**: 대기 큐에서 명령을 하나씩 꺼내 처리합니다. 수신 루프와 같은 명령 허가를
//!   공유하므로 한 세션의 명령은 절대 동시에 처리되지 않습니다.
//! - **송신 루프**: 고정 간격으로 송신 큐 전체를 인코딩해 한 번에 씁니다.
//!
//! 강제 종료는 한 번만 수행됩니다: 마지막 송신 → 큐 비우기 → 루프 취소 →
//! 틱/레지스트리 해제 및 외부 알림 → 소켓 종료.
//!
//! 핸들러 패닉은 에러와 같이 해당 명령만 건너뜁니다. 루프 자체가 패닉하면 세션을 강제 종료합니다.

use bytes::BytesMut;
use crossbeam_queue::ArrayQueue;
use encoding_rs::Encoding;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex, Semaphore};
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::channel_state::ChannelState;
use super::identity::{AccountInfo, CharacterInfo, SessionId};
use super::session_manager::SessionManager;
use crate::handler::{AdminCommandExecutor, CommandDispatcher, SessionService};
use crate::protocol::{login_codec, world_codec, Dialect, PacketAction, PacketFlow, RegionLanguage, SessionStage};
use crate::tick::{Processable, ProcessableId, TickScheduler};
use crate::tool::error::{ChannelError, ChannelResult, ErrorHandler, ErrorSeverity};
use crate::tool::SimpleUtils;

/// 세션 읽기 절반
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
/// 세션 쓰기 절반
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

const READ_BUFFER_SIZE: usize = 4096;
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// 세션 동작 옵션
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub dialect: Dialect,
    /// 송신 큐 비우기 주기
    pub flush_interval: Duration,
    /// 캐릭터 선택 후 명령 대기 큐 크기
    pub inbound_capacity: usize,
    /// 송신 큐에 쌓일 수 있는 패킷 묶음 수
    pub outbound_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::World,
            flush_interval: Duration::from_millis(50),
            inbound_capacity: 256,
            outbound_capacity: 4096,
        }
    }
}

/// 세션이 사용하는 협력자 묶음
///
/// 시작 시 한 번 만들어 모든 세션이 공유합니다.
pub struct SessionContext {
    pub dispatcher: Arc<dyn CommandDispatcher>,
    pub admin: Arc<dyn AdminCommandExecutor>,
    pub session_service: Arc<dyn SessionService>,
    pub session_manager: Arc<SessionManager>,
    pub scheduler: Arc<TickScheduler>,
    pub channel: Arc<ChannelState>,
    pub options: SessionOptions,
}

struct BoundCharacter {
    info: CharacterInfo,
    processable_id: Option<ProcessableId>,
}

#[derive(Debug, Default)]
struct SessionCounters {
    packets_received: AtomicU64,
    packets_sent: AtomicU64,
    bytes_received: AtomicU64,
    bytes_sent: AtomicU64,
}

/// 세션 상태 스냅샷
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub session_id: SessionId,
    pub peer: String,
    pub stage: SessionStage,
    pub session_key: i32,
    pub account_id: Option<i64>,
    pub character: Option<String>,
    pub pending_outbound: usize,
    pub packets_received: u64,
    pub packets_sent: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
}

/// 게임 세션
pub struct GameSession {
    id: SessionId,
    peer: SocketAddr,
    ctx: Arc<SessionContext>,
    flow: Mutex<PacketFlow>,
    language: RwLock<RegionLanguage>,
    account: RwLock<Option<AccountInfo>>,
    character: RwLock<Option<BoundCharacter>>,
    outbound: ArrayQueue<Vec<String>>,
    outbound_overflow: AtomicBool,
    inbound_tx: mpsc::Sender<String>,
    inbound_rx: Mutex<Option<mpsc::Receiver<String>>>,
    /// 한 세션의 명령을 직렬화하는 허가
    command_permit: Semaphore,
    writer: AsyncMutex<Option<BoxedWriter>>,
    disposing: AtomicBool,
    disconnecting: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    closed_tx: watch::Sender<bool>,
    counters: SessionCounters,
}

impl GameSession {
    /// 새 세션 생성. 루프는 [`GameSession::start`]에서 시작합니다.
    pub fn new(id: SessionId, peer: SocketAddr, writer: BoxedWriter, ctx: Arc<SessionContext>) -> Arc<Self> {
        let (inbound_tx, inbound_rx) = mpsc::channel(ctx.options.inbound_capacity.max(1));
        let (shutdown_tx, _) = watch::channel(false);
        let (closed_tx, _) = watch::channel(false);
        let outbound = ArrayQueue::new(ctx.options.outbound_capacity.max(1));

        Arc::new(Self {
            id,
            peer,
            flow: Mutex::new(PacketFlow::new()),
            language: RwLock::new(RegionLanguage::default()),
            account: RwLock::new(None),
            character: RwLock::new(None),
            outbound,
            outbound_overflow: AtomicBool::new(false),
            inbound_tx,
            inbound_rx: Mutex::new(Some(inbound_rx)),
            command_permit: Semaphore::new(1),
            writer: AsyncMutex::new(Some(writer)),
            disposing: AtomicBool::new(false),
            disconnecting: AtomicBool::new(false),
            shutdown_tx,
            closed_tx,
            counters: SessionCounters::default(),
            ctx,
        })
    }

    /// 수신/처리/송신 루프 시작
    pub fn start(self: &Arc<Self>, reader: BoxedReader) {
        let Some(inbound_rx) = self.inbound_rx.lock().take() else {
            warn!(session_id = self.id, "세션 루프가 이미 시작되었습니다");
            return;
        };

        tokio::spawn(Arc::clone(self).supervise("flush_loop", Arc::clone(self).flush_loop()));
        tokio::spawn(Arc::clone(self).supervise("drain_loop", Arc::clone(self).drain_loop(inbound_rx)));
        tokio::spawn(Arc::clone(self).supervise("read_loop", Arc::clone(self).read_loop(reader)));

        debug!(session_id = self.id, peer = %self.peer, "세션 시작");
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn dialect(&self) -> Dialect {
        self.ctx.options.dialect
    }

    pub fn stage(&self) -> SessionStage {
        self.flow.lock().stage()
    }

    pub fn session_key(&self) -> i32 {
        self.flow.lock().session_key()
    }

    pub fn last_keepalive(&self) -> u16 {
        self.flow.lock().last_keepalive()
    }

    pub fn language(&self) -> RegionLanguage {
        *self.language.read()
    }

    pub fn set_language(&self, language: RegionLanguage) {
        *self.language.write() = language;
    }

    pub fn account(&self) -> Option<AccountInfo> {
        self.account.read().clone()
    }

    pub fn account_id(&self) -> Option<i64> {
        self.account.read().as_ref().map(|account| account.account_id)
    }

    pub fn character(&self) -> Option<CharacterInfo> {
        self.character.read().as_ref().map(|bound| bound.info.clone())
    }

    pub fn is_character_bound(&self) -> bool {
        self.stage() == SessionStage::CharacterBound
    }

    pub fn is_disposing(&self) -> bool {
        self.disposing.load(Ordering::Acquire)
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnecting.load(Ordering::Acquire)
    }

    /// 송신 대기 중인 패킷 묶음 수
    pub fn pending_outbound(&self) -> usize {
        self.outbound.len()
    }

    /// 계정 연결. 세션 언어가 계정 언어로 바뀝니다.
    pub fn initialize_account(&self, account: AccountInfo) {
        self.set_language(account.language);
        debug!(
            session_id = self.id,
            account_id = account.account_id,
            "계정 연결 ({})",
            account.language.as_str()
        );
        *self.account.write() = Some(account);
    }

    /// 캐릭터 선택 완료
    ///
    /// 세션 레지스트리에 캐릭터를 등록하고 캐릭터의 틱 객체를 스케줄러에 넘깁니다.
    /// 이후 수신 패킷은 명령 대기 큐를 거칩니다.
    pub async fn bind_character(
        self: &Arc<Self>,
        character: CharacterInfo,
        processable: Option<Arc<dyn Processable>>,
    ) -> ChannelResult<()> {
        {
            let mut flow = self.flow.lock();
            if self.is_disposing() || !flow.bind_character() {
                return Err(ChannelError::InvalidState {
                    session_id: self.id,
                    message: format!("{:?} 단계에서는 캐릭터를 선택할 수 없습니다", flow.stage()),
                });
            }

            *self.character.write() = Some(BoundCharacter {
                info: character.clone(),
                processable_id: processable.as_ref().map(|p| p.id()),
            });
            self.ctx.session_manager.register_character(self, &character);
            if let Some(processable) = processable {
                self.ctx.scheduler.register(processable);
            }
        }

        if let Some(account_id) = self.account_id() {
            if let Err(e) = self
                .ctx
                .session_service
                .character_connected(account_id, self.session_key(), &character)
                .await
            {
                let error = ChannelError::internal("SessionService", format!("{:#}", e));
                ErrorHandler::handle_error(&error, ErrorSeverity::Warning, "GameSession", "character_connected");
            }
        }

        info!(session_id = self.id, "캐릭터 선택: {} ({})", character.name, character.character_id);
        Ok(())
    }

    /// 캐릭터 선택 해제 (로그아웃 후 캐릭터 선택 화면)
    pub fn unbind_character(&self) -> ChannelResult<CharacterInfo> {
        let bound = {
            let mut flow = self.flow.lock();
            if !flow.unbind_character() {
                return Err(ChannelError::InvalidState {
                    session_id: self.id,
                    message: format!("{:?} 단계에서는 캐릭터 선택을 해제할 수 없습니다", flow.stage()),
                });
            }
            self.character.write().take()
        };

        let Some(bound) = bound else {
            return Err(ChannelError::InvalidState {
                session_id: self.id,
                message: "선택된 캐릭터 정보가 없습니다".to_string(),
            });
        };

        if let Some(processable_id) = bound.processable_id {
            self.ctx.scheduler.remove(processable_id);
        }
        self.ctx.session_manager.unregister_character(self.id, &bound.info);

        debug!(session_id = self.id, "캐릭터 선택 해제: {}", bound.info.name);
        Ok(bound.info)
    }

    /// 패킷 하나 송신 예약
    pub fn send_packet(&self, packet: impl Into<String>) -> bool {
        let packet = packet.into();
        if packet.is_empty() || !self.can_read_or_send() {
            return false;
        }
        self.enqueue(vec![packet])
    }

    /// 패킷 묶음 송신 예약. 묶음은 순서대로 함께 전송됩니다.
    pub fn send_packets<I>(&self, packets: I) -> bool
    where
        I: IntoIterator<Item = String>,
    {
        if !self.can_read_or_send() {
            return false;
        }

        let group: Vec<String> = packets.into_iter().filter(|p| !p.is_empty()).collect();
        if group.is_empty() {
            return false;
        }
        self.enqueue(group)
    }

    /// 송신 큐 전체를 인코딩해 한 번에 씁니다.
    pub async fn flush(&self) -> ChannelResult<usize> {
        let mut writer = self.writer.lock().await;

        if self.outbound.is_empty() {
            return Ok(0);
        }

        let encoding = self.encoding();
        let mut bytes = Vec::new();
        let mut count = 0u64;
        while let Some(group) = self.outbound.pop() {
            for packet in group {
                bytes.extend(self.encode_packet(&packet, encoding));
                count += 1;
            }
        }

        let Some(stream) = writer.as_mut() else {
            return Ok(0);
        };

        let write = async {
            stream.write_all(&bytes).await?;
            stream.flush().await
        };
        match timeout(WRITE_TIMEOUT, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(ChannelError::network("flush", e)),
            Err(_) => {
                return Err(ChannelError::network(
                    "flush",
                    std::io::Error::new(std::io::ErrorKind::TimedOut, "송신 시간 초과"),
                ))
            }
        }

        self.counters.packets_sent.fetch_add(count, Ordering::Relaxed);
        self.counters.bytes_sent.fetch_add(bytes.len() as u64, Ordering::Relaxed);
        Ok(count as usize)
    }

    /// 강제 종료 (여러 번 호출해도 한 번만 수행)
    pub async fn force_disconnect(&self) {
        if self.disconnecting.swap(true, Ordering::AcqRel) {
            debug!(session_id = self.id, "[TCP_SESSION] 이미 종료 중...");
            return;
        }

        debug!(session_id = self.id, "[TCP_SESSION] 강제 종료 시작");
        self.disposing.store(true, Ordering::Release);

        if let Err(e) = self.flush().await {
            ErrorHandler::handle_error(&e, ErrorSeverity::Info, "GameSession", "final_flush");
        }
        while self.outbound.pop().is_some() {}
        self.shutdown_tx.send_replace(true);

        let bound = {
            let mut flow = self.flow.lock();
            flow.mark_disconnected();
            self.character.write().take()
        };

        if let Some(bound) = &bound {
            if let Some(processable_id) = bound.processable_id {
                self.ctx.scheduler.remove(processable_id);
            }
            self.ctx.session_manager.unregister_character(self.id, &bound.info);
        }
        self.ctx.session_manager.unregister(self.id);

        if let Some(account_id) = self.account_id() {
            if let Err(e) = self.ctx.session_service.disconnect(account_id, self.session_key()).await {
                let error = ChannelError::internal("SessionService", format!("{:#}", e));
                ErrorHandler::handle_error(&error, ErrorSeverity::Warning, "GameSession", "disconnect_notify");
            }
        }

        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            let _ = timeout(WRITE_TIMEOUT, writer.shutdown()).await;
        }
        self.closed_tx.send_replace(true);

        match bound {
            Some(bound) => info!("[TCP_SESSION] {} - {} 연결 종료", bound.info.name, self.peer),
            None => debug!("[TCP_SESSION] {} 캐릭터 선택 없이 연결 종료", self.peer),
        }
    }

    /// 종료가 끝날 때까지 대기
    pub async fn closed(&self) {
        let mut closed = self.closed_tx.subscribe();
        let _ = closed.wait_for(|closed| *closed).await;
    }

    /// 상태 스냅샷
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.id,
            peer: self.peer.to_string(),
            stage: self.stage(),
            session_key: self.session_key(),
            account_id: self.account_id(),
            character: self.character().map(|c| c.name),
            pending_outbound: self.pending_outbound(),
            packets_received: self.counters.packets_received.load(Ordering::Relaxed),
            packets_sent: self.counters.packets_sent.load(Ordering::Relaxed),
            bytes_received: self.counters.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.counters.bytes_sent.load(Ordering::Relaxed),
        }
    }

    fn can_read_or_send(&self) -> bool {
        !self.is_disposing()
            && !self.ctx.channel.in_shutdown()
            && !self.outbound_overflow.load(Ordering::Acquire)
    }

    fn encoding(&self) -> &'static Encoding {
        match self.ctx.options.dialect {
            Dialect::World => self.language().encoding(),
            Dialect::Login => login_codec::login_encoding(),
        }
    }

    fn encode_packet(&self, packet: &str, encoding: &'static Encoding) -> Vec<u8> {
        match self.ctx.options.dialect {
            Dialect::World => world_codec::encode(packet, encoding),
            Dialect::Login => login_codec::encode(packet, encoding),
        }
    }

    fn enqueue(&self, group: Vec<String>) -> bool {
        match self.outbound.push(group) {
            Ok(()) => true,
            Err(_) => {
                // 다음 송신 주기에 강제 종료
                if !self.outbound_overflow.swap(true, Ordering::AcqRel) {
                    warn!(session_id = self.id, peer = %self.peer, "송신 큐 포화");
                }
                false
            }
        }
    }

    /// 루프가 패닉으로 끝나도 세션이 정리되도록 감쌉니다.
    async fn supervise(self: Arc<Self>, name: &'static str, task: impl Future<Output = ()>) {
        let Err(payload) = AssertUnwindSafe(task).catch_unwind().await else {
            return;
        };

        let error = ChannelError::internal("GameSession", SimpleUtils::panic_message(payload.as_ref()));
        drop(payload);
        ErrorHandler::handle_error(&error, ErrorSeverity::Critical, "GameSession", name);
        self.force_disconnect().await;
    }

    async fn read_loop(self: Arc<Self>, mut reader: BoxedReader) {
        let mut shutdown = self.shutdown_tx.subscribe();
        let mut buf = BytesMut::with_capacity(READ_BUFFER_SIZE);

        loop {
            if *shutdown.borrow() {
                break;
            }

            let read = tokio::select! {
                _ = shutdown.changed() => break,
                read = reader.read_buf(&mut buf) => read,
            };

            match read {
                Ok(0) => {
                    debug!(session_id = self.id, "클라이언트가 연결을 닫았습니다");
                    break;
                }
                Ok(n) => {
                    self.counters.bytes_received.fetch_add(n as u64, Ordering::Relaxed);
                    if let Err(e) = self.on_received(&mut buf).await {
                        ErrorHandler::handle(&e, "GameSession", "on_received");
                        if e.is_fatal_to_connection() {
                            break;
                        }
                    }
                }
                Err(e) => {
                    ErrorHandler::handle(&ChannelError::network("read", e), "GameSession", "read_loop");
                    break;
                }
            }
        }

        self.force_disconnect().await;
    }

    async fn on_received(self: &Arc<Self>, buf: &mut BytesMut) -> ChannelResult<()> {
        match self.ctx.options.dialect {
            Dialect::World => self.on_world_received(buf).await,
            Dialect::Login => self.on_login_received(buf).await,
        }
    }

    async fn on_world_received(self: &Arc<Self>, buf: &mut BytesMut) -> ChannelResult<()> {
        loop {
            if !self.can_read_or_send() {
                buf.clear();
                return Ok(());
            }

            // 키는 프레임마다 다시 읽는다 (핸드셰이크 중 바뀜)
            let key = self.session_key();
            let Some(packet) = world_codec::decode_frame(buf, key, self.encoding())? else {
                return Ok(());
            };
            if packet.is_empty() {
                continue;
            }
            self.counters.packets_received.fetch_add(1, Ordering::Relaxed);

            if self.is_character_bound() {
                if self.inbound_tx.send(packet).await.is_err() {
                    return Ok(());
                }
            } else {
                self.handle_packet(&packet).await?;
            }
        }
    }

    async fn on_login_received(self: &Arc<Self>, buf: &mut BytesMut) -> ChannelResult<()> {
        let raw = buf.split();
        if !self.can_read_or_send() {
            return Ok(());
        }

        let packet = login_codec::decode(&raw);
        let normalized = packet.replace('^', " ");
        let header = normalized.split(' ').next().unwrap_or_default();
        if header.trim().is_empty() {
            return Err(ChannelError::Handshake {
                session_id: self.id,
                message: "로그인 요청 헤더가 비어 있습니다".to_string(),
            });
        }
        self.counters.packets_received.fetch_add(1, Ordering::Relaxed);

        let header = header.replace('#', "");
        let _permit = self.acquire_command_permit().await?;
        self.trigger_handler(&header, &packet).await;
        Ok(())
    }

    async fn drain_loop(self: Arc<Self>, mut inbound: mpsc::Receiver<String>) {
        let mut shutdown = self.shutdown_tx.subscribe();

        loop {
            if *shutdown.borrow() {
                break;
            }

            let packet = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                packet = inbound.recv() => packet,
            };

            let Some(packet) = packet else {
                break;
            };

            if let Err(e) = self.handle_packet(&packet).await {
                ErrorHandler::handle(&e, "GameSession", "drain_loop");
                if e.is_fatal_to_connection() {
                    self.force_disconnect().await;
                    break;
                }
            }
        }

        inbound.close();
        while inbound.try_recv().is_ok() {}
    }

    async fn flush_loop(self: Arc<Self>) {
        let mut shutdown = self.shutdown_tx.subscribe();
        let mut ticker = interval(self.ctx.options.flush_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }
            if *shutdown.borrow() {
                break;
            }

            let result = if self.outbound_overflow.load(Ordering::Acquire) {
                Err(ChannelError::QueueFull {
                    session_id: self.id,
                    pending: self.outbound.len(),
                })
            } else {
                self.flush().await
            };

            if let Err(e) = result {
                ErrorHandler::handle(&e, "GameSession", "flush_loop");
                self.force_disconnect().await;
                break;
            }
        }
    }

    async fn acquire_command_permit(&self) -> ChannelResult<tokio::sync::SemaphorePermit<'_>> {
        self.command_permit
            .acquire()
            .await
            .map_err(|_| ChannelError::internal("GameSession", "명령 허가가 닫혔습니다"))
    }

    /// 패킷 하나를 상태 머신에 넣고 결과 동작을 실행합니다.
    ///
    /// 연결에 치명적인 위반만 에러로 반환합니다.
    async fn handle_packet(self: &Arc<Self>, packet: &str) -> ChannelResult<()> {
        let _permit = self.acquire_command_permit().await?;

        let action = self.flow.lock().handle(packet);
        match action {
            PacketAction::None => {}
            PacketAction::KeyAssigned(key) => {
                debug!(session_id = self.id, key, "세션 키 할당");
            }
            PacketAction::Dispatch { header, line } => {
                self.trigger_handler(&header, &line).await;
            }
            PacketAction::AdminCommand { prefix, line } => {
                self.trigger_admin_command(prefix, &line).await;
            }
            PacketAction::Reject(violation) => {
                warn!(session_id = self.id, peer = %self.peer, "CORRUPTED_PACKET_FLOW: {:?}", violation);
                return Err(violation.into_error(self.id));
            }
        }

        Ok(())
    }

    async fn trigger_handler(self: &Arc<Self>, header: &str, line: &str) {
        if self.ctx.channel.in_shutdown() {
            return;
        }

        if self.is_disposing() {
            warn!(session_id = self.id, "[CLIENTSESSION] DISPOSING");
            return;
        }

        let dispatched = AssertUnwindSafe(self.ctx.dispatcher.dispatch(self, header, line))
            .catch_unwind()
            .await;
        let error = match dispatched {
            Ok(Ok(())) => return,
            Ok(Err(e)) => ChannelError::dispatch(header, format!("{:#}", e)),
            Err(payload) => {
                let message = SimpleUtils::panic_message(payload.as_ref());
                ChannelError::dispatch(header, format!("핸들러 패닉: {}", message))
            }
        };
        ErrorHandler::handle(&error, "GameSession", "trigger_handler");
    }

    async fn trigger_admin_command(self: &Arc<Self>, prefix: char, line: &str) {
        if self.ctx.channel.in_shutdown() || self.is_disposing() {
            return;
        }

        let executed = AssertUnwindSafe(self.ctx.admin.execute(self, prefix, line))
            .catch_unwind()
            .await;
        let error = match executed {
            Ok(Ok(())) => return,
            Ok(Err(e)) => ChannelError::dispatch(&prefix.to_string(), format!("{:#}", e)),
            Err(payload) => {
                let message = SimpleUtils::panic_message(payload.as_ref());
                ChannelError::dispatch(&prefix.to_string(), format!("관리자 명령 패닉: {}", message))
            }
        };
        ErrorHandler::handle(&error, "GameSession", "admin_command");
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("stage", &self.stage())
            .finish()
    }
}
