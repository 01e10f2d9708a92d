//! 通知種別ごとのペイロード
//!
//! すべてのフィールドは `#[serde(default)]` で空文字列になる。欠落したフィールドは
//! デコードエラーではなく、そのフィールドのバリデーション違反として報告される。

use serde::Deserialize;

use crate::validation::{Validate, ValidationErrors, Validator};

/// お問い合わせフォーム
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub first_name: String,
    pub last_name:  String,
    pub email:      String,
    pub phone:      String,
    pub service:    String,
    pub message:    String,
}

impl Validate for ContactForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required("first_name", &self.first_name)
            .required("last_name", &self.last_name)
            .required_email("email", &self.email)
            .required("phone", &self.phone)
            .required("service", &self.service)
            .required("message", &self.message)
            .finish()
    }
}

/// 新規登録
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub id:    String,
    pub email: String,
    pub token: String,
}

impl Validate for SignupRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required("id", &self.id)
            .required_email("email", &self.email)
            .required("token", &self.token)
            .finish()
    }
}

/// アカウント有効化
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActivationRequest {
    pub email: String,
    pub token: String,
}

impl Validate for ActivationRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required_email("email", &self.email)
            .required("token", &self.token)
            .finish()
    }
}

/// パスワード再設定依頼
///
/// 形は [`ActivationRequest`] と同じだが、テンプレートと件名が異なるため別の型にする。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PasswordResetRequest {
    pub email: String,
    pub token: String,
}

impl Validate for PasswordResetRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required_email("email", &self.email)
            .required("token", &self.token)
            .finish()
    }
}

/// パスワード変更完了
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResetCompletedRequest {
    pub email: String,
}

impl Validate for ResetCompletedRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new().required_email("email", &self.email).finish()
    }
}
