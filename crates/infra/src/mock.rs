//! # テスト用モック
//!
//! ユースケース・ハンドラテストで使用するインメモリモック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! formmail-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{
    Arc,
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use formmail_domain::notification::{NotificationError, OutgoingMessage};

use crate::notification::NotificationSender;

// ===== MockNotificationSender =====

/// 送信されたメッセージを記録するモック送信
///
/// `fail_with_error()` 以降は送信を記録せずに `SendFailed` を返す。
#[derive(Clone, Default)]
pub struct MockNotificationSender {
    sent:    Arc<Mutex<Vec<OutgoingMessage>>>,
    failing: Arc<AtomicBool>,
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// 常に失敗するモックを作る
    pub fn failing() -> Self {
        let sender = Self::new();
        sender.fail_with_error();
        sender
    }

    pub fn fail_with_error(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// これまでに送信されたメッセージ
    pub fn sent_emails(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send_email(&self, message: &OutgoingMessage) -> Result<(), NotificationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::SendFailed(
                "535 5.7.8 authentication failed for user mailer@example.com password=hunter2"
                    .to_string(),
            ));
        }

        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}
