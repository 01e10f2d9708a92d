//! # レートリミッター
//!
//! クライアント識別子（IP）ごとのトークンバケットをプロセス内で管理する。
//!
//! ## 設計方針
//!
//! - **シャード単位のロック**: `DashMap` により異なる識別子同士は競合しない
//! - **同一識別子は直列化**: エントリのロックを保持したまま補充・消費を行い、
//!   バーストが容量を超える lost update を防ぐ
//! - **遅延補充・遅延掃除**: タイマーは使わず、チェック時に補充し、
//!   アイドル期間ごとに一度だけ期限切れバケットを掃除する

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use formmail_domain::{
    access::{RateLimitDecision, RateLimitPolicy, TokenBucket},
    clock::Clock,
};

/// レート制限チェック
///
/// 呼び出し側には `check` のみを公開し、内部状態は隠蔽する。
pub trait RateLimiter: Send + Sync {
    /// 識別子のリクエストを 1 件消費し、許可/拒否を返す
    fn check(&self, identifier: &str) -> RateLimitDecision;
}

/// インメモリのトークンバケットレートリミッター
pub struct InMemoryRateLimiter {
    policy:     RateLimitPolicy,
    buckets:    DashMap<String, TokenBucket>,
    clock:      Arc<dyn Clock>,
    last_sweep: Mutex<DateTime<Utc>>,
}

impl InMemoryRateLimiter {
    pub fn new(policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            policy,
            buckets: DashMap::new(),
            clock,
            last_sweep: Mutex::new(now),
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// 管理中のバケット数
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    /// アイドル期間を過ぎたバケットを破棄し、破棄した件数を返す
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(self.clock.now())
    }

    fn evict_idle_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| !bucket.is_idle(&self.policy, now));
        let evicted = before.saturating_sub(self.buckets.len());
        if evicted > 0 {
            tracing::debug!(evicted, "アイドル状態のレート制限バケットを破棄");
        }
        evicted
    }

    /// 前回の掃除からアイドル期間が経過していれば掃除する
    ///
    /// エントリのロックを取得する前に呼ぶこと（`retain` は全シャードをロックする）。
    fn sweep_if_due(&self, now: DateTime<Utc>) {
        // 他のスレッドが掃除中ならスキップ
        let Ok(mut last_sweep) = self.last_sweep.try_lock() else {
            return;
        };

        let due = (now - *last_sweep)
            .to_std()
            .is_ok_and(|elapsed| elapsed >= self.policy.idle_expiry());
        if !due {
            return;
        }

        *last_sweep = now;
        self.evict_idle_at(now);
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn check(&self, identifier: &str) -> RateLimitDecision {
        let now = self.clock.now();
        self.sweep_if_due(now);

        let mut bucket = self
            .buckets
            .entry(identifier.to_string())
            .or_insert_with(|| TokenBucket::full(&self.policy, now));

        // 掃除の間隔内でも、アイドル期間を過ぎたバケットは新規扱い
        if bucket.is_idle(&self.policy, now) {
            *bucket = TokenBucket::full(&self.policy, now);
        }

        bucket.try_acquire(&self.policy, now)
    }
}
