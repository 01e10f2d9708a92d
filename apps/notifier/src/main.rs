//! # Notifier サーバー
//!
//! Web フォームからの送信を受け付け、トランザクションメールを送る。
//!
//! ## 役割
//!
//! - **お問い合わせ**: フォームの内容を運営者の固定宛先リストに転送
//! - **アカウント通知**: 新規登録・有効化・パスワード再設定・変更完了をユーザーに送信
//! - **アクセス制御**: IP 許可リストとクライアント IP 単位のレート制限
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `PORT` | No | ポート番号（デフォルト: `8080`） |
//! | `NOTIFICATION_BACKEND` | No | `smtp`（デフォルト）または `noop` |
//! | `EMAIL_HOST` | smtp 時 | メールリレーのホスト |
//! | `EMAIL_USER` / `EMAIL_PASS` | smtp 時 | メールリレーの認証情報 |
//! | `RECIPIENTS` | No | お問い合わせの宛先（カンマ区切り） |
//! | `ALLOWED_IP` | No | 許可する IP（カンマ区切り、空なら全許可） |
//! | `TRUST_PROXY_HEADERS` | No | `X-Forwarded-For` / `X-Real-IP` を信頼するか（デフォルト: `true`） |
//!
//! その他の変数は [`NotifierConfig`] を参照。
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（送信せずログ出力のみ）
//! NOTIFICATION_BACKEND=noop cargo run -p formmail-notifier
//!
//! # 本番環境
//! EMAIL_HOST=smtp.example.com EMAIL_USER=... EMAIL_PASS=... cargo run -p formmail-notifier --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use formmail_domain::clock::{Clock, SystemClock};
use formmail_infra::{
    InMemoryRateLimiter,
    NotificationSender,
    RateLimiter,
    notification::{NoopNotificationSender, SmtpNotificationSender},
};
use formmail_notifier::{
    build_app,
    config::{NotificationBackend, NotifierConfig},
};
use formmail_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// Notifier サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    init_tracing(TracingConfig::from_env("formmail-notifier"));

    // 設定読み込み
    let config = NotifierConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "Notifier サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // 送信バックエンドの初期化
    let sender: Arc<dyn NotificationSender> = match config.backend {
        NotificationBackend::Smtp => {
            let settings = config
                .smtp
                .clone()
                .context("SMTP 設定が読み込まれていません")?;
            tracing::info!(
                host = %settings.host,
                port = settings.port,
                tls = ?settings.tls,
                "SMTP 送信バックエンドを使用します"
            );
            Arc::new(
                SmtpNotificationSender::new(settings).context("SMTP 送信バックエンドの初期化に失敗しました")?,
            )
        }
        NotificationBackend::Noop => {
            tracing::warn!("Noop 送信バックエンドを使用します（メールは送信されません）");
            Arc::new(NoopNotificationSender)
        }
    };

    if config.recipients.is_empty() {
        tracing::warn!("RECIPIENTS が未設定のため、お問い合わせは送信に失敗します");
    }
    if config.allowed_ips.is_open() {
        tracing::info!("ALLOWED_IP が未設定のため、すべての IP を許可します");
    }
    if config.trust_proxy_headers {
        tracing::info!(
            "X-Forwarded-For / X-Real-IP をクライアント IP として信頼します（プロキシ配下以外では TRUST_PROXY_HEADERS=false を推奨）"
        );
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let rate_limiter: Arc<dyn RateLimiter> =
        Arc::new(InMemoryRateLimiter::new(config.rate_limit, clock.clone()));

    let app = build_app(&config, sender, rate_limiter, clock)?;

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Notifier サーバーが起動しました: {}", addr);

    // 接続元アドレスをクライアント IP のフォールバックに使う
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
