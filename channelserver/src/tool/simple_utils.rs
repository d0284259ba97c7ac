//! 간단한 공통 유틸리티

use std::any::Any;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// 간단한 시간 유틸리티
pub struct SimpleUtils;

impl SimpleUtils {
    /// 현재 타임스탬프 (초)
    ///
    /// 시스템 시간이 UNIX_EPOCH 이전이면 0을 반환합니다.
    pub fn current_timestamp() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    /// 틱 주파수(Hz)를 틱 주기로 변환
    ///
    /// 0 Hz는 1 Hz로 취급합니다.
    pub fn tick_period(tick_rate: u32) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(tick_rate.max(1)))
    }

    /// 패닉 페이로드에서 메시지 추출
    pub fn panic_message(payload: &(dyn Any + Send)) -> String {
        if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "알 수 없는 패닉".to_string()
        }
    }

    /// 경과 시간을 "1h 2m 3s" 형태로 표시
    pub fn format_uptime(elapsed: Duration) -> String {
        let secs = elapsed.as_secs();
        let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_timestamp() {
        let timestamp = SimpleUtils::current_timestamp();
        assert!(timestamp > 1_600_000_000);
    }

    #[test]
    fn test_tick_period() {
        assert_eq!(SimpleUtils::tick_period(20), Duration::from_millis(50));
        assert_eq!(SimpleUtils::tick_period(0), Duration::from_secs(1));
    }

    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("틱 실패 {}", 7)).unwrap_err();
        assert_eq!(SimpleUtils::panic_message(payload.as_ref()), "틱 실패 7");

        let payload = std::panic::catch_unwind(|| std::panic::panic_any(42u8)).unwrap_err();
        assert_eq!(SimpleUtils::panic_message(payload.as_ref()), "알 수 없는 패닉");
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(SimpleUtils::format_uptime(Duration::from_secs(5)), "5s");
        assert_eq!(SimpleUtils::format_uptime(Duration::from_secs(125)), "2m 5s");
        assert_eq!(SimpleUtils::format_uptime(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
