//! 채널 리스너
//!
//! 접속을 받아 허가 필터와 세션 한도를 확인한 뒤 세션을 만들어 등록합니다.

use anyhow::{Context, Result};
use serde::Serialize;
use shared::security::AdmissionFilter;
use shared::tool::AppError;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::session::{GameSession, SessionContext};

/// 리스너 통계
#[derive(Debug, Clone, Serialize)]
pub struct TcpServiceStats {
    pub is_running: bool,
    pub bind_address: String,
    pub local_addr: Option<String>,
    pub sessions: usize,
    pub accepted: u64,
    pub rejected: u64,
}

#[derive(Debug, Default)]
struct AcceptCounters {
    accepted: AtomicU64,
    rejected: AtomicU64,
}

/// 채널 리스너
pub struct TcpService {
    bind_address: String,
    context: Arc<SessionContext>,
    admission: Arc<AdmissionFilter>,
    next_session_id: Arc<AtomicU64>,
    counters: Arc<AcceptCounters>,
    is_running: Arc<Mutex<bool>>,
    shutdown_tx: Mutex<Option<watch::Sender<bool>>>,
    accept_handle: Mutex<Option<JoinHandle<()>>>,
    local_addr: parking_lot::Mutex<Option<SocketAddr>>,
}

impl TcpService {
    pub fn new(bind_address: impl Into<String>, context: Arc<SessionContext>, admission: Arc<AdmissionFilter>) -> Self {
        Self {
            bind_address: bind_address.into(),
            context,
            admission,
            next_session_id: Arc::new(AtomicU64::new(1)),
            counters: Arc::new(AcceptCounters::default()),
            is_running: Arc::new(Mutex::new(false)),
            shutdown_tx: Mutex::new(None),
            accept_handle: Mutex::new(None),
            local_addr: parking_lot::Mutex::new(None),
        }
    }

    /// 리스너 시작. 실제로 바인드된 주소를 반환합니다.
    pub async fn start(&self) -> Result<SocketAddr> {
        let mut is_running = self.is_running.lock().await;

        if *is_running {
            warn!("채널 리스너가 이미 실행 중입니다");
            return (*self.local_addr.lock()).context("리스너 주소를 알 수 없습니다");
        }

        let listener = TcpListener::bind(&self.bind_address)
            .await
            .with_context(|| format!("TCP 리스너 바인드 실패: {}", self.bind_address))?;
        let local_addr = listener.local_addr().context("리스너 주소 조회 실패")?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(Self::accept_loop(
            listener,
            Arc::clone(&self.context),
            Arc::clone(&self.admission),
            Arc::clone(&self.next_session_id),
            Arc::clone(&self.counters),
            shutdown_rx,
        ));

        *self.shutdown_tx.lock().await = Some(shutdown_tx);
        *self.accept_handle.lock().await = Some(handle);
        *self.local_addr.lock() = Some(local_addr);
        *is_running = true;

        info!("✅ 채널 {} 리스너가 {}에서 실행 중입니다", self.context.channel.channel_id(), local_addr);
        Ok(local_addr)
    }

    /// 리스너 중지. 이미 연결된 세션은 건드리지 않습니다.
    pub async fn stop(&self) -> Result<()> {
        let mut is_running = self.is_running.lock().await;

        if !*is_running {
            warn!("채널 리스너가 이미 중지되어 있습니다");
            return Ok(());
        }

        *is_running = false;
        drop(is_running);

        if let Some(shutdown_tx) = self.shutdown_tx.lock().await.take() {
            shutdown_tx.send_replace(true);
        }

        let handle = self.accept_handle.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("접속 수락 작업 종료 실패: {}", e);
            }
        }

        info!("🛑 채널 리스너 중지");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.lock().await
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    pub async fn stats(&self) -> TcpServiceStats {
        TcpServiceStats {
            is_running: self.is_running().await,
            bind_address: self.bind_address.clone(),
            local_addr: self.local_addr().map(|addr| addr.to_string()),
            sessions: self.context.session_manager.session_count(),
            accepted: self.counters.accepted.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
        }
    }

    async fn accept_loop(
        listener: TcpListener,
        context: Arc<SessionContext>,
        admission: Arc<AdmissionFilter>,
        next_session_id: Arc<AtomicU64>,
        counters: Arc<AcceptCounters>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            let accepted = tokio::select! {
                _ = shutdown.changed() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, addr)) => {
                    let admitted = Self::on_accepted(&context, &admission, &next_session_id, stream, addr);
                    let counter = if admitted { &counters.accepted } else { &counters.rejected };
                    counter.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    error!("클라이언트 연결 수락 실패: {}", e);
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                }
            }
        }

        debug!("접속 수락 루프 종료");
    }

    fn on_accepted(
        context: &Arc<SessionContext>,
        admission: &AdmissionFilter,
        next_session_id: &AtomicU64,
        stream: TcpStream,
        addr: SocketAddr,
    ) -> bool {
        if context.channel.is_idle() {
            debug!("유휴 상태 - {} 연결 거부", addr);
            return false;
        }

        let decision = admission.check(addr.ip());
        if !decision.is_accepted() {
            AppError::AdmissionRejected(format!("{} ({:?})", addr, decision)).log("TcpService");
            return false;
        }

        if context.session_manager.is_full() {
            warn!(
                "세션 한도 도달 ({}개) - {} 연결 거부",
                context.session_manager.max_sessions(),
                addr
            );
            return false;
        }

        if let Err(e) = stream.set_nodelay(true) {
            debug!("TCP_NODELAY 설정 실패 ({}): {}", addr, e);
        }

        let (reader, writer) = stream.into_split();
        let session_id = next_session_id.fetch_add(1, Ordering::Relaxed);
        let session = GameSession::new(session_id, addr, Box::new(writer), Arc::clone(context));

        if let Err(e) = context.session_manager.register_connection(Arc::clone(&session)) {
            e.log("세션 등록");
            return false;
        }

        info!(session_id, "새 클라이언트 연결: {}", addr);
        session.start(Box::new(reader));
        true
    }
}
