//! トークンバケット
//!
//! 補充はバックグラウンドタイマーではなく、チェック時に前回チェックからの
//! 経過時間で遅延計算する。
//!
//! アイドル期間は満杯までの補充時間（`容量 × 補充間隔`）以上でなければならない。
//! これを満たすとき、アイドルバケットを破棄して満杯から作り直しても、
//! 補充で得られる以上のトークンは与えない。

use std::{num::NonZeroU32, time::Duration};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// レート制限パラメータの不正
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitPolicyError {
    /// `per / refill` が 0 になる
    #[error("補充間隔が 0 になります（per={per:?}, refill={refill}）")]
    ZeroRefillInterval { per: Duration, refill: u32 },

    /// アイドル期間が満杯までの補充時間より短い
    #[error("アイドル期間 {idle_expiry:?} は満杯までの補充時間 {full_refill:?} 以上である必要があります")]
    IdleExpiryTooShort {
        idle_expiry: Duration,
        full_refill: Duration,
    },
}

/// レート制限パラメータ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// バケット容量（バーストサイズ）
    capacity:        NonZeroU32,
    /// トークン 1 個が補充されるまでの時間
    refill_interval: Duration,
    /// この時間チェックがなかったバケットは破棄してよい
    idle_expiry:     Duration,
}

impl RateLimitPolicy {
    /// `per` あたり `refill` 個の速度で補充するポリシーを作る
    ///
    /// 例: `new(30, 10, 1 分, 3 分)` は容量 30、毎分 10 トークン補充。
    pub fn new(
        capacity: NonZeroU32,
        refill: NonZeroU32,
        per: Duration,
        idle_expiry: Duration,
    ) -> Result<Self, RateLimitPolicyError> {
        let refill_interval = per / refill.get();
        if refill_interval.is_zero() {
            return Err(RateLimitPolicyError::ZeroRefillInterval {
                per,
                refill: refill.get(),
            });
        }

        let full_refill = refill_interval.saturating_mul(capacity.get());
        if idle_expiry < full_refill {
            return Err(RateLimitPolicyError::IdleExpiryTooShort {
                idle_expiry,
                full_refill,
            });
        }

        Ok(Self {
            capacity,
            refill_interval,
            idle_expiry,
        })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity.get()
    }

    pub fn refill_interval(&self) -> Duration {
        self.refill_interval
    }

    pub fn idle_expiry(&self) -> Duration {
        self.idle_expiry
    }

    /// 空のバケットが満杯に戻るまでの時間
    pub fn full_refill(&self) -> Duration {
        self.refill_interval.saturating_mul(self.capacity.get())
    }
}

/// レート制限の判定結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateLimitDecision {
    /// 許可（消費後の残りトークン数）
    Allowed { remaining: u32 },
    /// 拒否（次のトークンが補充されるまでの時間）
    Limited { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// `Retry-After` ヘッダー用の秒数（切り上げ、最低 1 秒）
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::Allowed { .. } => None,
            Self::Limited { retry_after } => {
                let secs = retry_after.as_secs_f64().ceil() as u64;
                Some(secs.max(1))
            }
        }
    }
}

/// クライアント 1 つ分のバケット状態
#[derive(Debug, Clone, PartialEq)]
pub struct TokenBucket {
    tokens:       f64,
    last_checked: DateTime<Utc>,
}

impl TokenBucket {
    /// 満杯のバケットを作る（初回リクエスト時）
    pub fn full(policy: &RateLimitPolicy, now: DateTime<Utc>) -> Self {
        Self {
            tokens:       f64::from(policy.capacity()),
            last_checked: now,
        }
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn last_checked(&self) -> DateTime<Utc> {
        self.last_checked
    }

    /// 補充してからトークンを 1 つ消費する
    pub fn try_acquire(&mut self, policy: &RateLimitPolicy, now: DateTime<Utc>) -> RateLimitDecision {
        self.refill(policy, now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            RateLimitDecision::Allowed {
                remaining: self.tokens.floor() as u32,
            }
        } else {
            let missing = 1.0 - self.tokens;
            RateLimitDecision::Limited {
                retry_after: policy.refill_interval.mul_f64(missing),
            }
        }
    }

    /// 最終チェックから `idle_expiry` 以上経過しているか
    pub fn is_idle(&self, policy: &RateLimitPolicy, now: DateTime<Utc>) -> bool {
        elapsed_since(self.last_checked, now) >= policy.idle_expiry
    }

    fn refill(&mut self, policy: &RateLimitPolicy, now: DateTime<Utc>) {
        // 時計が巻き戻った場合は補充しない
        if now <= self.last_checked {
            return;
        }

        let elapsed = elapsed_since(self.last_checked, now);
        let added = elapsed.as_secs_f64() / policy.refill_interval.as_secs_f64();
        self.tokens = (self.tokens + added).min(f64::from(policy.capacity()));
        self.last_checked = now;
    }
}

fn elapsed_since(earlier: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - earlier).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    /// 容量 30、毎分 10 トークン
    #[fixture]
    fn policy() -> RateLimitPolicy {
        RateLimitPolicy::new(
            NonZeroU32::new(30).unwrap(),
            NonZeroU32::new(10).unwrap(),
            Duration::from_secs(60),
            Duration::from_secs(180),
        )
        .unwrap()
    }

    #[rstest]
    fn test_補充間隔は速度から計算される(policy: RateLimitPolicy) {
        assert_eq!(policy.refill_interval(), Duration::from_secs(6));
        assert_eq!(policy.full_refill(), Duration::from_secs(180));
    }

    #[rstest]
    #[case(0)]
    #[case(179)]
    fn test_アイドル期間が満杯までの補充時間より短いとエラー(#[case] expiry_secs: u64) {
        let result = RateLimitPolicy::new(
            NonZeroU32::new(30).unwrap(),
            NonZeroU32::new(10).unwrap(),
            Duration::from_secs(60),
            Duration::from_secs(expiry_secs),
        );

        assert_eq!(
            result,
            Err(RateLimitPolicyError::IdleExpiryTooShort {
                idle_expiry: Duration::from_secs(expiry_secs),
                full_refill: Duration::from_secs(180),
            })
        );
    }

    #[test]
    fn test_補充間隔が0になる速度はエラー() {
        let result = RateLimitPolicy::new(
            NonZeroU32::new(30).unwrap(),
            NonZeroU32::new(10).unwrap(),
            Duration::ZERO,
            Duration::from_secs(180),
        );

        assert!(matches!(
            result,
            Err(RateLimitPolicyError::ZeroRefillInterval { refill: 10, .. })
        ));
    }

    #[rstest]
    fn test_容量ぶん許可し31回目を拒否する(policy: RateLimitPolicy, now: DateTime<Utc>) {
        let mut bucket = TokenBucket::full(&policy, now);

        for i in 0..30 {
            let decision = bucket.try_acquire(&policy, now);
            assert_eq!(
                decision,
                RateLimitDecision::Allowed {
                    remaining: 29 - i,
                }
            );
        }

        let decision = bucket.try_acquire(&policy, now);
        assert_eq!(
            decision,
            RateLimitDecision::Limited {
                retry_after: Duration::from_secs(6),
            }
        );
    }

    #[rstest]
    fn test_1トークン分待てば再び許可される(policy: RateLimitPolicy, now: DateTime<Utc>) {
        let mut bucket = TokenBucket::full(&policy, now);
        for _ in 0..30 {
            bucket.try_acquire(&policy, now);
        }
        assert!(!bucket.try_acquire(&policy, now).is_allowed());

        let later = now + TimeDelta::seconds(6);

        assert!(bucket.try_acquire(&policy, later).is_allowed());
        assert!(!bucket.try_acquire(&policy, later).is_allowed());
    }

    #[rstest]
    fn test_補充は容量を超えない(policy: RateLimitPolicy, now: DateTime<Utc>) {
        let mut bucket = TokenBucket::full(&policy, now);
        bucket.try_acquire(&policy, now);

        let decision = bucket.try_acquire(&policy, now + TimeDelta::hours(1));

        assert_eq!(decision, RateLimitDecision::Allowed { remaining: 29 });
    }

    #[rstest]
    fn test_時計が巻き戻っても補充しない(policy: RateLimitPolicy, now: DateTime<Utc>) {
        let mut bucket = TokenBucket::full(&policy, now);
        bucket.try_acquire(&policy, now);

        bucket.try_acquire(&policy, now - TimeDelta::seconds(60));

        assert_eq!(bucket.tokens(), 28.0);
        assert_eq!(bucket.last_checked(), now);
    }

    #[rstest]
    fn test_アイドル判定は最終チェックからの経過で行う(
        policy: RateLimitPolicy,
        now: DateTime<Utc>,
    ) {
        let bucket = TokenBucket::full(&policy, now);

        assert!(!bucket.is_idle(&policy, now + TimeDelta::seconds(179)));
        assert!(bucket.is_idle(&policy, now + TimeDelta::seconds(180)));
    }

    #[test]
    fn test_retry_after_secsは切り上げる() {
        let decision = RateLimitDecision::Limited {
            retry_after: Duration::from_millis(1_200),
        };

        assert_eq!(decision.retry_after_secs(), Some(2));
        assert_eq!(
            RateLimitDecision::Allowed { remaining: 3 }.retry_after_secs(),
            None
        );
    }

    #[test]
    fn test_retry_after_secsは最低1秒() {
        let decision = RateLimitDecision::Limited {
            retry_after: Duration::ZERO,
        };

        assert_eq!(decision.retry_after_secs(), Some(1));
    }
}
