//! # ヘルスチェックハンドラ
//!
//! ```text
//! GET /health
//! ```
//!
//! アクセス制御の対象外。ロードバランサーやコンテナの死活監視に使う。

use axum::Json;
use formmail_shared::HealthResponse;

/// ヘルスチェックエンドポイント
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status:  "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
