//! # 成功レスポンス
//!
//! 通知エンドポイントの成功時レスポンス `{ "message": "..." }` を提供する。

use serde::{Deserialize, Serialize};

/// 成功メッセージ
///
/// ## 使用例
///
/// ```
/// use formmail_shared::MessageResponse;
///
/// let response = MessageResponse::new("Email sent successfully!");
/// assert_eq!(response.message, "Email sent successfully!");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializeを正しいjson形状にする() {
        let response = MessageResponse::new("Emails sent successfully!");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "message": "Emails sent successfully!" })
        );
    }
}
