//! # ログ・トレース初期化
//!
//! notifier プロセスのトレーシングサブスクライバーを組み立てる。
//!
//! - 出力形式は `LOG_FORMAT`（`json` / `pretty`）で選ぶ
//! - フィルタは `RUST_LOG`、未設定なら [`TracingConfig::default_filter`]
//! - HTTP リクエストごとのスパンは [`make_request_span`] で作る
//!   （`TraceLayer::make_span_with` に渡す）

use std::str::FromStr;

use thiserror::Error;

/// `RUST_LOG` 未設定時のフィルタ
pub const DEFAULT_FILTER: &str = "info,formmail=debug";

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 1 行 1 JSON（ログ基盤への転送向け）
    Json,
    /// 人間向けの整形出力
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(UnknownLogFormat(other.to_string())),
        }
    }
}

/// 未知の `LOG_FORMAT` 値
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown LOG_FORMAT {0:?} (expected json or pretty)")]
pub struct UnknownLogFormat(pub String);

/// トレーシング初期化設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// 起動ログに出すサービス名
    pub service_name:   String,
    pub log_format:     LogFormat,
    /// `RUST_LOG` 未設定時のフィルタ
    pub default_filter: String,
}

impl TracingConfig {
    pub fn new(service_name: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            service_name: service_name.into(),
            log_format,
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }

    /// 環境変数 `LOG_FORMAT` から設定を作る
    ///
    /// 値が不正な場合は Pretty にフォールバックする。サブスクライバーは
    /// まだないため警告は stderr に直接出す。
    pub fn from_env(service_name: impl Into<String>) -> Self {
        let log_format = match std::env::var("LOG_FORMAT") {
            Ok(value) => value.parse().unwrap_or_else(|e: UnknownLogFormat| {
                eprintln!("WARNING: {e}, falling back to pretty");
                LogFormat::Pretty
            }),
            Err(_) => LogFormat::default(),
        };
        Self::new(service_name, log_format)
    }
}

/// グローバルなトレーシングサブスクライバーを登録する
///
/// 2 回目以降の呼び出しは何もしない（テストで複数回呼ばれても失敗しない）。
#[cfg(feature = "observability")]
pub fn init_tracing(config: TracingConfig) {
    use tracing_subscriber::{EnvFilter, Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let format_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().with_target(false).boxed(),
    };

    let registered = tracing_subscriber::registry()
        .with(filter)
        .with(format_layer)
        .try_init()
        .is_ok();

    if registered {
        tracing::info!(
            service = %config.service_name,
            log_format = ?config.log_format,
            "ログ出力を開始します"
        );
    }
}

/// HTTP リクエスト 1 件分のスパンを作る
///
/// `X-Forwarded-For` の先頭要素をクライアント IP として記録する。
/// ヘッダーがなければ空のまま（接続元アドレスはミドルウェア側で扱う）。
#[cfg(feature = "observability")]
pub fn make_request_span<B>(request: &http::Request<B>) -> tracing::Span {
    let forwarded_for = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .unwrap_or_default();

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        client.forwarded_for = forwarded_for,
    )
}
