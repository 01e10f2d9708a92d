//! # 通知
//!
//! フォーム送信から生成されるメール通知のドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 宛先 |
//! |---|------------|------|
//! | [`NotificationKind::ContactUs`] | お問い合わせ | 設定された固定の宛先リスト |
//! | [`NotificationKind::Signup`] | 新規登録（ようこそ） | ペイロードのメールアドレス |
//! | [`NotificationKind::Activation`] | アカウント有効化 | ペイロードのメールアドレス |
//! | [`NotificationKind::PasswordReset`] | パスワード再設定依頼 | ペイロードのメールアドレス |
//! | [`NotificationKind::ResetCompleted`] | パスワード変更完了 | ペイロードのメールアドレス |
//!
//! ## 設計方針
//!
//! - **enum による通知種別**: 各バリアントが 1 つのエンドポイントに対応
//! - **同期送信**: 通知はリクエスト処理中に送信し、結果をそのままレスポンスに反映する
//! - **テンプレート分離**: 通知とメール本文の生成は分離（TemplateRenderer は notifier アプリ側）

mod message;
mod payload;

pub use message::OutgoingMessage;
pub use payload::{
    ActivationRequest,
    ContactForm,
    PasswordResetRequest,
    ResetCompletedRequest,
    SignupRequest,
};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use thiserror::Error;

use crate::validation::{Validate, ValidationErrors};

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// メール送信に失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    TemplateFailed(String),

    /// メッセージ組み立てに失敗（宛先なし、ヘッダー不正）
    #[error("メッセージ組み立てに失敗: {0}")]
    InvalidMessage(String),

    /// 送信設定が不正（起動時に検出する）
    #[error("送信設定が不正: {0}")]
    InvalidSettings(String),
}

/// 通知種別
///
/// ログの `notification.kind` フィールドに snake_case で出力される。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    /// お問い合わせフォーム → 運営者宛て
    ContactUs,
    /// 新規登録 → 登録ユーザー宛て
    Signup,
    /// アカウント有効化 → ユーザー宛て
    Activation,
    /// パスワード再設定依頼 → ユーザー宛て
    PasswordReset,
    /// パスワード変更完了 → ユーザー宛て
    ResetCompleted,
}

impl NotificationKind {
    /// 種別ごとに固定の件名
    pub fn subject(self) -> &'static str {
        match self {
            Self::ContactUs => "Contact Form Submission",
            Self::Signup => "Welcome to Rent Management System - Account Activation Required",
            Self::Activation => "Rent Management System - Account Activation Required",
            Self::PasswordReset => "Password Reset Request for Rent Management System",
            Self::ResetCompleted => "Password Changed for Rent Management System",
        }
    }
}

/// 通知リクエスト
///
/// ワイヤ上のペイロードから構築され、一度だけ検証・送信されて破棄される。
#[derive(Debug, Clone)]
pub enum Notification {
    ContactUs(ContactForm),
    Signup(SignupRequest),
    Activation(ActivationRequest),
    PasswordReset(PasswordResetRequest),
    ResetCompleted(ResetCompletedRequest),
}

impl Notification {
    /// 通知種別を返す
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::ContactUs(_) => NotificationKind::ContactUs,
            Self::Signup(_) => NotificationKind::Signup,
            Self::Activation(_) => NotificationKind::Activation,
            Self::PasswordReset(_) => NotificationKind::PasswordReset,
            Self::ResetCompleted(_) => NotificationKind::ResetCompleted,
        }
    }

    /// 宛先を決定する
    ///
    /// お問い合わせは設定された固定リスト（順序維持）、それ以外はペイロードが
    /// 指すユーザー 1 名。
    pub fn recipients(&self, contact_recipients: &[String]) -> Vec<String> {
        match self {
            Self::ContactUs(_) => contact_recipients.to_vec(),
            Self::Signup(SignupRequest { email, .. })
            | Self::Activation(ActivationRequest { email, .. })
            | Self::PasswordReset(PasswordResetRequest { email, .. })
            | Self::ResetCompleted(ResetCompletedRequest { email }) => {
                vec![email.trim().to_string()]
            }
        }
    }
}

impl Validate for Notification {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::ContactUs(form) => form.validate(),
            Self::Signup(data) => data.validate(),
            Self::Activation(data) => data.validate(),
            Self::PasswordReset(data) => data.validate(),
            Self::ResetCompleted(data) => data.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;

    fn contact_form() -> ContactForm {
        ContactForm {
            first_name: "Jane".to_string(),
            last_name:  "Doe".to_string(),
            email:      "jane@example.com".to_string(),
            phone:      "+1 555 0100".to_string(),
            service:    "Consulting".to_string(),
            message:    "Hello".to_string(),
        }
    }

    #[test]
    fn notification_kind_の文字列変換が正しい() {
        assert_eq!(NotificationKind::ContactUs.to_string(), "contact_us");
        assert_eq!(NotificationKind::Signup.to_string(), "signup");
        assert_eq!(NotificationKind::Activation.to_string(), "activation");
        assert_eq!(NotificationKind::PasswordReset.to_string(), "password_reset");
        assert_eq!(
            NotificationKind::ResetCompleted.to_string(),
            "reset_completed"
        );
        assert_eq!(
            NotificationKind::from_str("password_reset").unwrap(),
            NotificationKind::PasswordReset
        );
    }

    #[test]
    fn 全種別の件名が空でなく互いに異なる() {
        let subjects: Vec<&str> = NotificationKind::iter().map(|k| k.subject()).collect();

        assert_eq!(subjects.len(), 5);
        for (i, subject) in subjects.iter().enumerate() {
            assert!(!subject.is_empty());
            assert!(!subjects[i + 1..].contains(subject));
        }
    }

    #[test]
    fn お問い合わせは固定の宛先リストを順序どおり使う() {
        let notification = Notification::ContactUs(contact_form());
        let list = vec!["ops@example.com".to_string(), "sales@example.com".to_string()];

        assert_eq!(notification.recipients(&list), list);
    }

    #[test]
    fn お問い合わせ以外はペイロードのメールアドレス宛て() {
        let notification = Notification::Signup(SignupRequest {
            id:    "u1".to_string(),
            email: " a@b.com ".to_string(),
            token: "tok".to_string(),
        });
        let list = vec!["ops@example.com".to_string()];

        assert_eq!(notification.recipients(&list), vec!["a@b.com".to_string()]);
        assert_eq!(notification.kind(), NotificationKind::Signup);
    }

    #[test]
    fn validateは種別ごとのスキーマに委譲する() {
        let notification = Notification::ResetCompleted(ResetCompletedRequest {
            email: "invalid".to_string(),
        });

        let errors = notification.validate().unwrap_err();
        assert!(errors.has_field("email"));
    }
}
