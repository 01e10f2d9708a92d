//! # アクセス制御ミドルウェア
//!
//! 通知エンドポイントの前段で、IP 許可リストとレート制限を順に評価する。
//! 許可リストで拒否されたリクエストはトークンを消費しない。
//!
//! クライアント IP は `X-Forwarded-For` の先頭 → `X-Real-IP` → 接続元アドレス
//! の順に決定する。どれも取得できない場合は 403 を返す。
//!
//! 転送ヘッダーはクライアントが自由に設定できるため、信頼するのは
//! `trust_proxy_headers` が有効な場合（リバースプロキシの背後）のみ。
//! 無効なら接続元アドレスだけを使う。

use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use formmail_domain::access::{AllowedIps, RateLimitDecision};
use formmail_infra::RateLimiter;
use formmail_shared::{event_log::event, log_business_event};

use crate::error::NotifierError;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// アクセス制御の状態
#[derive(Clone)]
pub struct AccessGuardState {
    pub allowed_ips:         Arc<AllowedIps>,
    pub rate_limiter:        Arc<dyn RateLimiter>,
    pub trust_proxy_headers: bool,
}

/// リクエストからクライアント IP を取得する
pub fn client_ip(request: &Request<Body>, trust_proxy_headers: bool) -> Option<String> {
    let peer = || {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    };

    if !trust_proxy_headers {
        return peer();
    }

    let headers = request.headers();
    headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get(X_REAL_IP)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .map(str::to_string)
        .or_else(peer)
}

/// アクセス制御ミドルウェア
pub async fn access_guard(
    State(state): State<AccessGuardState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(ip) = client_ip(&request, state.trust_proxy_headers) else {
        tracing::warn!(path = %request.uri().path(), "クライアント IP を特定できません");
        return NotifierError::AccessDenied("unknown client".to_string()).into_response();
    };

    if !state.allowed_ips.permits(&ip) {
        log_business_event!(
            event.category = event::category::ACCESS,
            event.action = event::action::IP_DENIED,
            event.result = event::result::FAILURE,
            client.ip = %ip,
            "許可されていない IP からのリクエストを拒否"
        );
        return NotifierError::AccessDenied(ip).into_response();
    }

    match state.rate_limiter.check(&ip) {
        RateLimitDecision::Allowed { remaining } => {
            tracing::debug!(
                client.ip = %ip,
                remaining,
                from = "received",
                to = "guarded",
                "通知処理の状態遷移"
            );
            next.run(request).await
        }
        decision @ RateLimitDecision::Limited { .. } => {
            let retry_after_secs = decision.retry_after_secs().unwrap_or(1);
            log_business_event!(
                event.category = event::category::ACCESS,
                event.action = event::action::RATE_LIMITED,
                event.result = event::result::FAILURE,
                client.ip = %ip,
                retry_after_secs,
                "レート制限によりリクエストを拒否"
            );
            NotifierError::RateLimited { retry_after_secs }.into_response()
        }
    }
}
