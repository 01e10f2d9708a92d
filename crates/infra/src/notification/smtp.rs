//! SMTP 通知送信実装
//!
//! lettre の `AsyncSmtpTransport` で認証付きメールリレーに送信する。
//! メッセージ本体は組み立て済みのバイト列を `send_raw` でそのまま渡す。

use std::{fmt, str::FromStr, time::Duration};

use async_trait::async_trait;
use formmail_domain::notification::{NotificationError, OutgoingMessage};
use lettre::{
    Address,
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    address::Envelope,
    transport::smtp::authentication::Credentials,
};

use super::NotificationSender;

/// リレーとの接続方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmtpTls {
    /// 平文で接続し STARTTLS で昇格する（587 番ポート）
    #[default]
    StartTls,
    /// 最初から TLS で接続する（465 番ポート）
    Tls,
    /// TLS なし（Mailpit 等のローカル SMTP 向け）
    None,
}

impl FromStr for SmtpTls {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starttls" => Ok(Self::StartTls),
            "tls" => Ok(Self::Tls),
            "none" => Ok(Self::None),
            other => Err(format!("unknown SMTP TLS mode: {other}")),
        }
    }
}

/// SMTP リレーの接続設定
#[derive(Clone)]
pub struct SmtpSettings {
    pub host:         String,
    pub port:         u16,
    pub username:     String,
    pub password:     String,
    /// エンベロープ送信元アドレス
    pub from_address: String,
    pub tls:          SmtpTls,
    /// 接続・コマンドのタイムアウト
    pub timeout:      Duration,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("tls", &self.tls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// SMTP 通知送信
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
pub struct SmtpNotificationSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from:      Address,
}

impl SmtpNotificationSender {
    /// 新しい SMTP 送信インスタンスを作成
    ///
    /// 接続はこの時点では行わない。送信元アドレスとリレー設定の不正のみ検出し、
    /// `InvalidSettings` として返す。
    pub fn new(settings: SmtpSettings) -> Result<Self, NotificationError> {
        let from: Address = settings
            .from_address
            .parse()
            .map_err(|e| NotificationError::InvalidSettings(format!("送信元アドレス不正: {e}")))?;

        let builder = match settings.tls {
            SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                .map_err(|e| NotificationError::InvalidSettings(format!("SMTP リレー設定失敗: {e}")))?,
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
                .map_err(|e| NotificationError::InvalidSettings(format!("SMTP リレー設定失敗: {e}")))?,
            // builder_dangerous: TLS なしで接続
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host),
        };

        let transport = builder
            .port(settings.port)
            .credentials(Credentials::new(settings.username, settings.password))
            .timeout(Some(settings.timeout))
            .build();

        Ok(Self { transport, from })
    }

    fn envelope(&self, message: &OutgoingMessage) -> Result<Envelope, NotificationError> {
        let to = message
            .recipients()
            .iter()
            .map(|r| r.parse::<Address>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| NotificationError::SendFailed(format!("宛先アドレス不正: {e}")))?;

        Envelope::new(Some(self.from.clone()), to)
            .map_err(|e| NotificationError::SendFailed(format!("エンベロープ構築失敗: {e}")))
    }
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    async fn send_email(&self, message: &OutgoingMessage) -> Result<(), NotificationError> {
        let envelope = self.envelope(message)?;

        self.transport
            .send_raw(&envelope, &message.to_bytes())
            .await
            .map_err(|e| NotificationError::SendFailed(format!("SMTP 送信失敗: {e}")))?;

        Ok(())
    }
}
