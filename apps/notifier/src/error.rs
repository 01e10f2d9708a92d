//! # Notifier エラー定義
//!
//! Notifier 固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! バリデーション・アクセス制御のエラーは内容をそのままクライアントに返す。
//! レンダリング・送信のエラーはクライアントには固定文言を返す
//! （認証情報やテンプレートの内部を漏らさない）。詳細は
//! `NotificationService::dispatch` が `notification.failed` イベントとして記録
//! 済みのため、ここでは出力しない。

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use formmail_domain::{notification::NotificationError, validation::ValidationErrors};
use formmail_shared::{ErrorResponse, FieldViolation};
use thiserror::Error;

use crate::usecase::DispatchError;

/// Notifier で発生するエラー
#[derive(Debug, Error)]
pub enum NotifierError {
    /// JSON として解釈できないリクエストボディ
    #[error("リクエストボディが不正です: {0}")]
    InvalidPayload(#[from] JsonRejection),

    /// 項目単位のバリデーションエラー
    #[error(transparent)]
    Validation(ValidationErrors),

    /// 送信元 IP が許可されていない、または特定できない
    #[error("アクセスが拒否されました: {0}")]
    AccessDenied(String),

    /// レート制限超過
    #[error("レート制限を超過しました（{retry_after_secs} 秒後に再試行可能）")]
    RateLimited { retry_after_secs: u64 },

    /// 本文の生成に失敗
    #[error("本文の生成に失敗: {0}")]
    Render(NotificationError),

    /// メールリレーへの送信に失敗
    #[error("メール送信に失敗: {0}")]
    Transport(NotificationError),

    /// その他の内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl From<DispatchError> for NotifierError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Validation(e) => Self::Validation(e),
            DispatchError::Render(e) => Self::Render(e),
            DispatchError::Compose(e) => Self::Internal(e.to_string()),
            DispatchError::Transport(e) => Self::Transport(e),
        }
    }
}

impl IntoResponse for NotifierError {
    fn into_response(self) -> Response {
        match self {
            NotifierError::InvalidPayload(rejection) => {
                let status = rejection.status();
                let body = match status {
                    StatusCode::PAYLOAD_TOO_LARGE => ErrorResponse::new(
                        "payload-too-large",
                        "Payload Too Large",
                        status.as_u16(),
                        "Request body is too large",
                    ),
                    StatusCode::UNSUPPORTED_MEDIA_TYPE => ErrorResponse::new(
                        "unsupported-media-type",
                        "Unsupported Media Type",
                        status.as_u16(),
                        "Expected request with `Content-Type: application/json`",
                    ),
                    _ => ErrorResponse {
                        status: status.as_u16(),
                        ..ErrorResponse::bad_request(rejection.body_text())
                    },
                };
                (status, Json(body)).into_response()
            }
            NotifierError::Validation(errors) => {
                let violations = errors
                    .into_errors()
                    .into_iter()
                    .map(|e| FieldViolation {
                        field:   e.field.to_string(),
                        message: e.message,
                    })
                    .collect();
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::validation_error(
                        "Request validation failed",
                        violations,
                    )),
                )
                    .into_response()
            }
            NotifierError::AccessDenied(_) => (
                StatusCode::FORBIDDEN,
                Json(ErrorResponse::forbidden("Access denied")),
            )
                .into_response(),
            NotifierError::RateLimited { retry_after_secs } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(ErrorResponse::too_many_requests("Rate limit exceeded")),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
                response
            }
            NotifierError::Render(_) | NotifierError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error()),
            )
                .into_response(),
            NotifierError::Transport(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::delivery_failed("Failed to send email")),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use formmail_domain::validation::Validator;
    use pretty_assertions::assert_eq;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_バリデーションエラーは400で項目一覧を返す() {
        let errors = Validator::new()
            .required("id", "")
            .required_email("email", "nope")
            .finish()
            .unwrap_err();

        let response = NotifierError::Validation(errors).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["status"], 400);
        assert_eq!(json["errors"][0]["field"], "id");
        assert_eq!(json["errors"][1]["field"], "email");
    }

    #[tokio::test]
    async fn test_レート制限は429でretry_afterヘッダーを付ける() {
        let response = NotifierError::RateLimited {
            retry_after_secs: 7,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "7");
    }

    #[tokio::test]
    async fn test_送信エラーは固定文言の500で詳細を含まない() {
        let error = NotifierError::Transport(NotificationError::SendFailed(
            "535 authentication failed password=hunter2".to_string(),
        ));

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let text = body_json(response).await.to_string();
        assert!(!text.contains("535"));
        assert!(!text.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_レンダリングエラーはテンプレート名を含まない500() {
        let error = NotifierError::Render(NotificationError::TemplateFailed(
            "Variable `token` not found in context while rendering 'signup.html'".to_string(),
        ));

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["detail"], "An internal error occurred");
        assert!(!json.to_string().contains("signup.html"));
    }

    #[test]
    fn test_組み立てエラーは内部エラーに変換される() {
        let err: NotifierError = DispatchError::Compose(NotificationError::InvalidMessage(
            "宛先が設定されていません".to_string(),
        ))
        .into();

        assert!(matches!(err, NotifierError::Internal(_)));
    }
}
