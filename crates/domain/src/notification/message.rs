//! 送信メッセージの組み立て
//!
//! 件名・宛先・HTML 本文から、SMTP の DATA にそのまま渡せる単一パートの
//! メッセージバッファを生成する。添付・CC/BCC・マルチパートは扱わない。

use super::NotificationError;

/// 送信用メッセージ
///
/// `compose` で検証済みの状態でのみ生成され、トランスポートに一度だけ渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    subject:    String,
    recipients: Vec<String>,
    html_body:  String,
}

impl OutgoingMessage {
    /// メッセージを組み立てる
    ///
    /// # エラー
    ///
    /// - 宛先が 0 件
    /// - 件名・宛先に改行が含まれる（ヘッダーインジェクション）
    pub fn compose(
        subject: impl Into<String>,
        recipients: Vec<String>,
        html_body: impl Into<String>,
    ) -> Result<Self, NotificationError> {
        let subject = subject.into();

        if recipients.is_empty() {
            return Err(NotificationError::InvalidMessage(
                "宛先が設定されていません".to_string(),
            ));
        }

        if contains_line_break(&subject) {
            return Err(NotificationError::InvalidMessage(
                "件名に改行が含まれています".to_string(),
            ));
        }

        if recipients.iter().any(|r| contains_line_break(r)) {
            return Err(NotificationError::InvalidMessage(
                "宛先に改行が含まれています".to_string(),
            ));
        }

        Ok(Self {
            subject,
            recipients,
            html_body: html_body.into(),
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// 宛先（挿入順）
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn html_body(&self) -> &str {
        &self.html_body
    }

    /// `To` ヘッダーの値
    pub fn to_header(&self) -> String {
        self.recipients.join(", ")
    }

    /// 送信用の生バイト列
    ///
    /// `Subject` / `To` / `Content-Type` ヘッダー、空行、本文の順。
    /// 改行はすべて CRLF に正規化する。
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = String::with_capacity(self.html_body.len() + 256);
        buf.push_str("Subject: ");
        buf.push_str(&self.subject);
        buf.push_str("\r\n");
        buf.push_str("To: ");
        buf.push_str(&self.to_header());
        buf.push_str("\r\n");
        buf.push_str("Content-Type: text/html; charset=UTF-8\r\n");
        buf.push_str("\r\n");

        for line in self.html_body.lines() {
            buf.push_str(line);
            buf.push_str("\r\n");
        }

        buf.into_bytes()
    }
}

fn contains_line_break(value: &str) -> bool {
    value.contains(['\r', '\n'])
}
