//! # Clock（時刻プロバイダ）
//!
//! `Utc::now()` の直接呼び出しを置き換え、テストで時刻を注入・前進させる
//! ための抽象化。お問い合わせメールの受信日時とレートリミッターの補充計算で使う。

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// 現在時刻を提供するトレイト
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 実際のシステム時刻を返す実装
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 手動で進めるテスト用実装
///
/// `advance()` を呼ぶまで同じ時刻を返し続ける。
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// 時刻を `delta` だけ進める
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += delta;
    }

    /// 時刻を任意の値に設定する
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_は現在時刻を返す() {
        let clock = SystemClock;
        let before = Utc::now();
        let result = clock.now();
        let after = Utc::now();

        assert!(result >= before);
        assert!(result <= after);
    }

    #[test]
    fn test_manual_clock_はadvanceするまで同じ時刻を返す() {
        let fixed_time = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let clock = ManualClock::new(fixed_time);

        assert_eq!(clock.now(), fixed_time);
        assert_eq!(clock.now(), fixed_time);
    }

    #[test]
    fn test_manual_clock_のadvanceで時刻が進む() {
        let fixed_time = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let clock = ManualClock::new(fixed_time);

        clock.advance(Duration::seconds(6));

        assert_eq!(clock.now(), fixed_time + Duration::seconds(6));
    }

    #[test]
    fn test_manual_clock_のsetで時刻を上書きできる() {
        let clock = ManualClock::new(DateTime::from_timestamp(0, 0).unwrap());
        let later = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        clock.set(later);

        assert_eq!(clock.now(), later);
    }
}
