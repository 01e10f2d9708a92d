//! # Formmail インフラ層
//!
//! 外部システムとの接続とプロセス内共有状態を扱う。
//!
//! ## モジュール構成
//!
//! - [`notification`] - メールリレーへの送信（SMTP / Noop）
//! - [`rate_limiter`] - クライアント単位のレート制限状態
//! - `mock` - テスト用モック（`test-utils` feature）

pub mod notification;
pub mod rate_limiter;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use notification::NotificationSender;
pub use rate_limiter::{InMemoryRateLimiter, RateLimiter};
