//! 서비스 레이어 테스트
//!
//! 리스너, 생존 신호, 종료 절차를 검증합니다.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::security::{AdmissionConfig, AdmissionFilter};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

use super::{create_test_harness, fast_options, spawn_duplex_session, wait_until, TestClient};
use crate::handler::ServerApi;
use crate::service::{ChannelStopService, PulseService, TcpService};

/// 호출을 기록하는 마스터 서버 API
#[derive(Default)]
struct RecordingServerApi {
    pulses: AtomicU64,
    last_sessions: AtomicU64,
    unregistered: AtomicBool,
    fail_pulses: bool,
    stall_pulses: bool,
}

#[async_trait]
impl ServerApi for RecordingServerApi {
    async fn pulse(&self, _channel_id: u32, sessions_count: usize) -> Result<()> {
        self.pulses.fetch_add(1, Ordering::SeqCst);
        self.last_sessions.store(sessions_count as u64, Ordering::SeqCst);
        if self.stall_pulses {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        if self.fail_pulses {
            return Err(anyhow!("마스터 서버 응답 없음"));
        }
        Ok(())
    }

    async fn unregister_channel(&self, _channel_id: u32) -> Result<()> {
        self.unregistered.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn open_admission() -> Arc<AdmissionFilter> {
    Arc::new(AdmissionFilter::new(AdmissionConfig {
        max_attempts_before_blacklist: 100,
        min_interval: Duration::ZERO,
    }))
}

/// 리스너 시작/중지 테스트
#[tokio::test]
async fn test_listener_lifecycle() -> Result<()> {
    let harness = create_test_harness(fast_options());
    let listener = TcpService::new("127.0.0.1:0", Arc::clone(&harness.context), open_admission());

    let addr = listener.start().await?;
    assert_eq!(listener.start().await?, addr, "두 번째 시작은 같은 주소를 반환해야 함");
    assert!(listener.is_running().await);

    let stream = TcpStream::connect(addr).await?;
    let mut client = TestClient::new(stream);
    client.handshake(321, "alice").await?;

    assert!(wait_until(|| harness.dispatcher.command_count() == 1).await);
    assert_eq!(harness.sessions.session_count(), 1);
    assert_eq!(client.recv().await.as_deref(), Some("entry_ok"));

    listener.stop().await?;
    listener.stop().await?;
    assert!(!listener.is_running().await);

    // 리스너를 멈춰도 기존 세션은 유지
    assert_eq!(harness.sessions.session_count(), 1);
    assert_eq!(listener.stats().await.accepted, 1);

    println!("✅ 리스너 생명주기 테스트 통과");
    Ok(())
}

/// 유휴 상태 연결 거부 테스트
#[tokio::test]
async fn test_listener_refuses_when_idle() -> Result<()> {
    let harness = create_test_harness(fast_options());
    let listener = TcpService::new("127.0.0.1:0", Arc::clone(&harness.context), open_admission());
    let addr = listener.start().await?;

    harness.channel.put_idle();
    let stream = TcpStream::connect(addr).await?;
    let mut client = TestClient::new(stream);
    assert!(client.is_closed().await);
    assert_eq!(harness.sessions.session_count(), 0);
    assert_eq!(listener.stats().await.rejected, 1);

    listener.stop().await?;
    println!("✅ 유휴 상태 연결 거부 테스트 통과");
    Ok(())
}

/// 생존 신호 실패는 다음 주기에 재시도되는지 테스트
#[tokio::test]
async fn test_pulse_retries_after_failure() -> Result<()> {
    let harness = create_test_harness(fast_options());
    let api = Arc::new(RecordingServerApi {
        fail_pulses: true,
        ..Default::default()
    });
    let pulse = PulseService::new(
        api.clone(),
        Arc::clone(&harness.channel),
        Arc::clone(&harness.sessions),
        Duration::from_millis(20),
    );

    pulse.start().await?;
    pulse.start().await?;
    assert!(wait_until(|| api.pulses.load(Ordering::SeqCst) >= 3).await);

    pulse.stop().await?;
    pulse.stop().await?;
    assert!(!pulse.is_running().await);

    let stats = pulse.stats();
    assert!(stats.failed_pulses >= 3);
    assert_eq!(stats.total_pulses, stats.failed_pulses);
    assert!(stats.last_pulse_timestamp.is_none());

    println!("✅ 생존 신호 재시도 테스트 통과");
    Ok(())
}

/// 응답 없는 마스터 서버는 한 주기 후 실패로 처리되는지 테스트
#[tokio::test]
async fn test_pulse_times_out_stalled_api() -> Result<()> {
    let harness = create_test_harness(fast_options());
    let api = Arc::new(RecordingServerApi {
        stall_pulses: true,
        ..Default::default()
    });
    let pulse = PulseService::new(
        api.clone(),
        Arc::clone(&harness.channel),
        Arc::clone(&harness.sessions),
        Duration::from_millis(20),
    );

    pulse.start().await?;
    assert!(wait_until(|| pulse.stats().failed_pulses >= 2).await);
    assert!(api.pulses.load(Ordering::SeqCst) >= 2);
    pulse.stop().await?;

    assert!(pulse.stats().last_pulse_timestamp.is_none());
    println!("✅ 생존 신호 타임아웃 테스트 통과");
    Ok(())
}

/// 생존 신호 세션 수 보고 테스트
#[tokio::test]
async fn test_pulse_reports_session_count() -> Result<()> {
    let harness = create_test_harness(fast_options());
    let (_s1, _c1) = spawn_duplex_session(&harness, 1);
    let (_s2, _c2) = spawn_duplex_session(&harness, 2);

    let api = Arc::new(RecordingServerApi::default());
    let pulse = PulseService::new(
        api.clone(),
        Arc::clone(&harness.channel),
        Arc::clone(&harness.sessions),
        Duration::from_millis(20),
    );
    pulse.start().await?;

    assert!(wait_until(|| api.pulses.load(Ordering::SeqCst) >= 1).await);
    assert_eq!(api.last_sessions.load(Ordering::SeqCst), 2);
    pulse.stop().await?;

    assert!(pulse.stats().last_pulse_timestamp.is_some());
    println!("✅ 생존 신호 세션 수 테스트 통과");
    Ok(())
}

/// 정상 종료 절차 테스트
#[tokio::test]
async fn test_stop_service_broadcasts_then_disconnects() -> Result<()> {
    let harness = create_test_harness(fast_options());
    let api = Arc::new(RecordingServerApi::default());
    let listener = Arc::new(TcpService::new("127.0.0.1:0", Arc::clone(&harness.context), open_admission()));
    let pulse = Arc::new(PulseService::new(
        api.clone(),
        Arc::clone(&harness.channel),
        Arc::clone(&harness.sessions),
        Duration::from_secs(5),
    ));
    listener.start().await?;
    pulse.start().await?;
    harness.scheduler.start()?;

    let (session, mut client) = spawn_duplex_session(&harness, 1);
    client.handshake(8, "alice").await?;
    assert_eq!(client.recv().await.as_deref(), Some("entry_ok"));
    client.send("1 select Alice").await?;
    assert!(wait_until(|| session.is_character_bound()).await);

    let stop_service = ChannelStopService::new(
        api.clone(),
        Arc::clone(&harness.channel),
        Arc::clone(&harness.sessions),
        Arc::clone(&listener),
        Arc::clone(&harness.scheduler),
        Arc::clone(&pulse),
        Duration::from_millis(10),
    );
    stop_service.stop("say 1 0 10 bye").await?;

    assert_eq!(client.recv().await.as_deref(), Some("say 1 0 10 bye"));
    assert!(client.is_closed().await);

    assert!(api.unregistered.load(Ordering::SeqCst));
    assert!(harness.channel.in_shutdown());
    assert_eq!(harness.sessions.session_count(), 0);
    assert_eq!(harness.scheduler.tracked_count(), 0);
    assert!(!harness.scheduler.is_started());
    assert!(!listener.is_running().await);
    assert!(!pulse.is_running().await);

    // 두 번째 호출은 무시
    stop_service.stop("again").await?;

    println!("✅ 정상 종료 절차 테스트 통과");
    Ok(())
}
