//! # 構造化イベントログ
//!
//! 運用上追跡したい出来事（メール送信、アクセス拒否）をフィールド名を揃えて出力する。
//!
//! `event.kind = "business_event"` が付いた行だけを抜き出せば、送信実績と
//! 拒否の履歴を追える:
//!
//! ```text
//! jq 'select(.["event.kind"] == "business_event")'
//! ```
//!
//! フィールド名はドット区切り（`event.action`、`error.kind`）。JSON 出力では
//! そのままフラットなキーになる。

/// `event.kind = "business_event"` 付きで info ログを出す
///
/// `event.category` / `event.action` / `event.result` は
/// [`event`] モジュールの定数を使うこと。
///
/// ```
/// use formmail_shared::{event_log::event, log_business_event};
///
/// log_business_event!(
///     event.category = event::category::NOTIFICATION,
///     event.action = event::action::NOTIFICATION_SENT,
///     event.result = event::result::SUCCESS,
///     "通知メール送信成功"
/// );
/// ```
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(event.kind = "business_event", $($args)*)
    };
}

/// `event.*` フィールドの値
pub mod event {
    pub mod category {
        /// メール通知の送信
        pub const NOTIFICATION: &str = "notification";
        /// IP 許可リスト・レート制限
        pub const ACCESS: &str = "access";
    }

    pub mod action {
        pub const NOTIFICATION_SENT: &str = "notification.sent";
        pub const NOTIFICATION_FAILED: &str = "notification.failed";
        pub const IP_DENIED: &str = "access.ip_denied";
        pub const RATE_LIMITED: &str = "access.rate_limited";
    }

    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// `error.*` フィールドの値（`tracing::error!` などに直接付ける）
pub mod error {
    pub mod category {
        /// メールリレー起因
        pub const EXTERNAL_SERVICE: &str = "external_service";
        /// テンプレート・メッセージ組み立てなどプロセス内の不整合
        pub const INTERNAL: &str = "internal";
    }

    pub mod kind {
        pub const TEMPLATE: &str = "template";
        pub const MESSAGE: &str = "message";
        pub const MAIL_RELAY: &str = "mail_relay";
    }
}
