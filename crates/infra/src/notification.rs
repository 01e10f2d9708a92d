//! # 通知送信
//!
//! 組み立て済みメッセージをメールリレーへ送信するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `NotificationSender` trait でメール送信を抽象化
//! - **2 つの実装**: SMTP（本番・認証付きリレー）、Noop（ローカル開発用）
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択
//! - **リトライなし**: 1 回の送信失敗はそのまま呼び出し元に返す

mod noop;
mod smtp;

use async_trait::async_trait;
use formmail_domain::notification::{NotificationError, OutgoingMessage};
pub use noop::NoopNotificationSender;
pub use smtp::{SmtpNotificationSender, SmtpSettings, SmtpTls};

/// メール送信トレイト
///
/// 通知基盤の中核。1 回の呼び出しで 1 通のメッセージを全宛先へ送信する。
/// 冪等ではない（2 回呼べば 2 回送信される）。
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// メールを送信する
    async fn send_email(&self, message: &OutgoingMessage) -> Result<(), NotificationError>;
}
