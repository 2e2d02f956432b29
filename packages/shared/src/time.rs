//! Time-related utilities with clock abstraction for testability.

use chrono::{DateTime, TimeZone, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get current Unix timestamp (seconds)
    fn now_unix_secs(&self) -> i64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_secs(&self) -> i64 {
        get_unix_timestamp()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
}

impl FixedClock {
    /// Create a new fixed clock with the given timestamp
    pub fn new(fixed_time_secs: i64) -> Self {
        Self {
            fixed_time: fixed_time_secs,
        }
    }
}

impl Clock for FixedClock {
    fn now_unix_secs(&self) -> i64 {
        self.fixed_time
    }
}

/// Get current Unix timestamp (seconds)
pub fn get_unix_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Convert Unix timestamp (seconds) to RFC 3339 format in UTC
///
/// Out-of-range timestamps fall back to the Unix epoch.
pub fn timestamp_to_rfc3339(timestamp_secs: i64) -> String {
    let dt: DateTime<Utc> = Utc
        .timestamp_opt(timestamp_secs, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH);
    dt.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_returns_non_zero_timestamp() {
        // テスト項目: SystemClock が 0 以外のタイムスタンプを返す
        // given (前提条件):
        let clock = SystemClock;

        // when (操作):
        let timestamp = clock.now_unix_secs();

        // then (期待する結果):
        assert!(timestamp > 0);
    }

    #[test]
    fn test_system_clock_does_not_go_backwards() {
        // テスト項目: SystemClock が呼び出すたびに減少しないタイムスタンプを返す
        // given (前提条件):
        let clock = SystemClock;

        // when (操作):
        let timestamp1 = clock.now_unix_secs();
        let timestamp2 = clock.now_unix_secs();

        // then (期待する結果):
        assert!(timestamp2 >= timestamp1);
    }

    #[test]
    fn test_fixed_clock_returns_fixed_timestamp() {
        // テスト項目: FixedClock が固定されたタイムスタンプを返す
        // given (前提条件):
        let clock = FixedClock::new(1_700_000_000);

        // when (操作):
        let timestamp1 = clock.now_unix_secs();
        let timestamp2 = clock.now_unix_secs();

        // then (期待する結果):
        assert_eq!(timestamp1, 1_700_000_000);
        assert_eq!(timestamp2, 1_700_000_000);
    }

    #[test]
    fn test_timestamp_to_rfc3339_format() {
        // テスト項目: タイムスタンプが UTC の RFC 3339 形式に変換される
        // given (前提条件):
        // 2023-01-01 00:00:00 UTC
        let timestamp = 1_672_531_200;

        // when (操作):
        let result = timestamp_to_rfc3339(timestamp);

        // then (期待する結果):
        assert_eq!(result, "2023-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_timestamp_to_rfc3339_out_of_range_falls_back_to_epoch() {
        // テスト項目: 範囲外のタイムスタンプは Unix エポックに丸められる
        // given (前提条件):
        let timestamp = i64::MAX;

        // when (操作):
        let result = timestamp_to_rfc3339(timestamp);

        // then (期待する結果):
        assert_eq!(result, "1970-01-01T00:00:00+00:00");
    }
}
