//! # エラーレスポンス（RFC 9457 Problem Details）
//!
//! 全エンドポイントで共通のエラーレスポンス構造体を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換は notifier アプリの責務（shared に axum 依存を入れない）
//! - よく使うエラー種別は便利コンストラクタで提供し、URI のハードコードを排除
//! - 5xx の detail は固定文言とし、内部情報（認証情報、テンプレート内容）を含めない

use serde::{Deserialize, Serialize};

/// error_type URI のベースパス
const ERROR_TYPE_BASE: &str = "https://formmail.example.com/errors";

/// 項目単位の違反（バリデーションエラーの拡張メンバー）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field:   String,
    pub message: String,
}

/// エラーレスポンス（RFC 9457 Problem Details）
///
/// `type` フィールドは URI で問題の種類を識別する。
/// バリデーションエラーの場合のみ `errors` に項目単位の違反を列挙する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title:      String,
    pub status:     u16,
    pub detail:     String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors:     Vec<FieldViolation>,
}

impl ErrorResponse {
    /// 汎用コンストラクタ
    ///
    /// `error_type_suffix` はベース URI に付加される（例: `"payload-too-large"`）。
    pub fn new(
        error_type_suffix: &str,
        title: impl Into<String>,
        status: u16,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            error_type: format!("{ERROR_TYPE_BASE}/{error_type_suffix}"),
            title: title.into(),
            status,
            detail: detail.into(),
            errors: Vec::new(),
        }
    }

    /// 400 Bad Request
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new("bad-request", "Bad Request", 400, detail)
    }

    /// 403 Forbidden
    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new("forbidden", "Forbidden", 403, detail)
    }

    /// 400 Validation Error（項目単位の違反付き）
    pub fn validation_error(detail: impl Into<String>, errors: Vec<FieldViolation>) -> Self {
        Self {
            errors,
            ..Self::new("validation-error", "Validation Error", 400, detail)
        }
    }

    /// 429 Too Many Requests
    pub fn too_many_requests(detail: impl Into<String>) -> Self {
        Self::new("too-many-requests", "Too Many Requests", 429, detail)
    }

    /// 500 Internal Server Error
    ///
    /// detail は固定値（内部情報を漏らさないため）。
    pub fn internal_error() -> Self {
        Self::new(
            "internal-error",
            "Internal Server Error",
            500,
            "An internal error occurred",
        )
    }

    /// 500 通知送信失敗
    ///
    /// detail は固定値。リレーの応答や認証情報は含めない。
    pub fn delivery_failed(detail: impl Into<String>) -> Self {
        Self::new("delivery-failed", "Internal Server Error", 500, detail)
    }
}
