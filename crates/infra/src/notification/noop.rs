//! リレーに接続しない送信実装
//!
//! `NOTIFICATION_BACKEND=noop` のときに使う。宛先と件名を info で、
//! 本文を debug で出力して成功を返す。

use async_trait::async_trait;
use formmail_domain::notification::{NotificationError, OutgoingMessage};

use super::NotificationSender;

/// ログに書くだけの送信
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotificationSender;

#[async_trait]
impl NotificationSender for NoopNotificationSender {
    async fn send_email(&self, message: &OutgoingMessage) -> Result<(), NotificationError> {
        tracing::info!(
            recipients = %message.to_header(),
            recipient_count = message.recipients().len(),
            subject = %message.subject(),
            body_bytes = message.html_body().len(),
            "Noop: リレーに送らずに破棄"
        );
        tracing::debug!(body = %message.html_body(), "Noop: 本文");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn 複数宛先でも成功を返す() {
        let message = OutgoingMessage::compose(
            "Contact Form Submission",
            vec!["ops@example.com".to_string(), "sales@example.com".to_string()],
            "<p>問い合わせ本文</p>",
        )
        .unwrap();

        let result = NoopNotificationSender.send_email(&message).await;

        assert!(result.is_ok());
    }
}
