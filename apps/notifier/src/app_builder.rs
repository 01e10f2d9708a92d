//! # Notifier アプリケーション構築
//!
//! DI（サービス・State）の初期化とルーター構築を担当する。
//! `main.rs` はインフラ初期化とサーバー起動に集中する。
//!
//! ## レイヤー構成（外側から）
//!
//! ```text
//! TraceLayer → CatchPanicLayer → CorsLayer → DefaultBodyLimit
//!     → access_guard（通知ルートのみ） → handler
//! ```

use std::{any::Any, sync::Arc};

use axum::{
    Json,
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderName, Method, StatusCode, header},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use formmail_domain::{clock::Clock, notification::NotificationError};
use formmail_infra::{NotificationSender, RateLimiter};
use formmail_shared::{ErrorResponse, observability::make_request_span};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::NotifierConfig,
    handler::{
        NotificationState,
        activate,
        completed_password_reset,
        health_check,
        reset_password,
        signup,
        submit_contact,
    },
    middleware::{AccessGuardState, access_guard},
    usecase::{NotificationService, TemplateRenderer},
};

/// CORS で許可するリクエストヘッダー
const ALLOWED_HEADERS: [HeaderName; 4] = [
    header::ORIGIN,
    header::CONTENT_TYPE,
    header::ACCEPT,
    header::AUTHORIZATION,
];

/// DI コンテナの構築とルーター定義を行う
///
/// 送信・レート制限・時刻は外部から受け取る（テストではモックを注入する）。
/// テンプレートの登録に失敗した場合はエラーを返す。
pub fn build_app(
    config: &NotifierConfig,
    sender: Arc<dyn NotificationSender>,
    rate_limiter: Arc<dyn RateLimiter>,
    clock: Arc<dyn Clock>,
) -> Result<Router, NotificationError> {
    let template_renderer = TemplateRenderer::new(config.base_url.clone())?;

    let notification_state = Arc::new(NotificationState {
        service: NotificationService::new(
            sender,
            template_renderer,
            clock,
            config.recipients.clone(),
        ),
    });

    let guard_state = AccessGuardState {
        allowed_ips: Arc::new(config.allowed_ips.clone()),
        rate_limiter,
        trust_proxy_headers: config.trust_proxy_headers,
    };

    // アクセス制御は通知ルートのみ（/health は対象外）
    let notification_routes = Router::new()
        .route("/submit-contact", post(submit_contact))
        .route("/signup", post(signup))
        .route("/activate", post(activate))
        .route("/resetpwd", post(reset_password))
        .route("/completedpwdreset", post(completed_password_reset))
        .route_layer(from_fn_with_state(guard_state, access_guard))
        .with_state(notification_state);

    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(ALLOWED_HEADERS);

    Ok(Router::new()
        .route("/health", get(health_check))
        .merge(notification_routes)
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(cors)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>)))
}

/// パニックを 500 の問題詳細レスポンスに変換する
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "ハンドラでパニックが発生しました");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::internal_error()),
    )
        .into_response()
}
