//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで通知メールの HTML 本文を生成する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: テンプレートはバイナリに埋め込まれる
//! - **自動エスケープ**: テンプレート名が `.html` で終わるため、tera が全変数を
//!   HTML エスケープする。ユーザー入力を `safe` フィルタに通してはならない
//! - **未定義変数はエラー**: プレースホルダーに対応する値がなければレンダリング失敗
//! - **リンク**: `{base_url}/activate?token=...`、`{base_url}/reset?token=...`

use chrono::{DateTime, Utc};
use formmail_domain::notification::{Notification, NotificationError};
use tera::{Context, Tera};

/// お問い合わせの受信日時の表示形式（例: `January 2, 2006 at 3:04 PM`）
const RECEIVED_AT_FORMAT: &str = "%B %-d, %Y at %-I:%M %p";

/// テンプレートレンダラー
///
/// 通知種別ごとに 1 つのテンプレート（`{kind}.html`）を持つ。
pub struct TemplateRenderer {
    engine:   Tera,
    base_url: String,
}

impl TemplateRenderer {
    /// 新しいレンダラーインスタンスを作成
    ///
    /// `include_str!` で埋め込んだテンプレートを tera に登録する。
    pub fn new(base_url: impl Into<String>) -> Result<Self, NotificationError> {
        Self::with_templates(
            vec![
                (
                    "contact_us.html",
                    include_str!("../../../templates/notifications/contact_us.html"),
                ),
                (
                    "signup.html",
                    include_str!("../../../templates/notifications/signup.html"),
                ),
                (
                    "activation.html",
                    include_str!("../../../templates/notifications/activation.html"),
                ),
                (
                    "password_reset.html",
                    include_str!("../../../templates/notifications/password_reset.html"),
                ),
                (
                    "reset_completed.html",
                    include_str!("../../../templates/notifications/reset_completed.html"),
                ),
            ],
            base_url,
        )
    }

    /// 任意のテンプレート集合でレンダラーを作成
    pub(crate) fn with_templates(
        templates: Vec<(&str, &str)>,
        base_url: impl Into<String>,
    ) -> Result<Self, NotificationError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(templates)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(Self {
            engine,
            base_url: base_url.into(),
        })
    }

    /// 通知から HTML 本文を生成する
    ///
    /// # 引数
    ///
    /// - `notification`: 検証済みの通知
    /// - `received_at`: 受信日時（お問い合わせ本文に UTC で表示）
    pub fn render(
        &self,
        notification: &Notification,
        received_at: DateTime<Utc>,
    ) -> Result<String, NotificationError> {
        let template_name = format!("{}.html", notification.kind());
        let context = self.build_context(notification, received_at);

        self.engine
            .render(&template_name, &context)
            .map_err(|e| NotificationError::TemplateFailed(render_error_chain(&e)))
    }

    /// 種別ごとのテンプレートコンテキストを構築する
    fn build_context(&self, notification: &Notification, received_at: DateTime<Utc>) -> Context {
        let mut context = Context::new();

        match notification {
            Notification::ContactUs(form) => {
                context.insert(
                    "formatted_date",
                    &received_at.format(RECEIVED_AT_FORMAT).to_string(),
                );
                context.insert("first_name", &form.first_name);
                context.insert("last_name", &form.last_name);
                context.insert("email", &form.email);
                context.insert("phone", &form.phone);
                context.insert("service", &form.service);
                context.insert("message", &form.message);
            }
            Notification::Signup(data) => {
                context.insert("base_url", &self.base_url);
                context.insert("id", &data.id);
                context.insert("token", &data.token);
            }
            Notification::Activation(data) => {
                context.insert("base_url", &self.base_url);
                context.insert("token", &data.token);
            }
            Notification::PasswordReset(data) => {
                context.insert("base_url", &self.base_url);
                context.insert("token", &data.token);
            }
            Notification::ResetCompleted(_) => {}
        }

        context
    }
}

/// tera のエラーは原因がネストするため、連結してログに残す
fn render_error_chain(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
