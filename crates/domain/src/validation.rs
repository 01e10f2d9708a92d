//! # リクエストバリデーション
//!
//! 通知リクエストの必須項目チェックとメールアドレス形式チェックを行う。
//!
//! ## 設計方針
//!
//! - **全件収集**: 最初の違反で打ち切らず、すべての違反を [`ValidationErrors`] に集める
//! - **正規化なし**: trim 以外の変換（大文字小文字、空白除去）は行わない
//! - **通知種別ごとのスキーマ**: 各ペイロード型が [`Validate`] を実装する

use serde::Serialize;
use thiserror::Error;
use validator::ValidateEmail;

/// 項目単位のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// JSON 上のフィールド名
    pub field:   &'static str,
    /// クライアント向けメッセージ
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// バリデーションエラーの集合
///
/// 空の状態では生成されない（[`Validator::finish`] が `Ok(())` を返す）。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", fields_summary(.0))]
pub struct ValidationErrors(Vec<FieldError>);

fn fields_summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.0
    }

    /// 指定フィールドの違反が含まれるか
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

/// ペイロードのスキーマ検証
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// 違反を蓄積するビルダー
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// trim 後に空であれば違反とする
    pub fn required(mut self, field: &'static str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.errors.push(FieldError::new(field, "is required"));
        }
        self
    }

    /// 必須かつメールアドレス形式であること
    ///
    /// 空の場合は `is required` のみを記録し、形式エラーは重ねない。
    pub fn required_email(mut self, field: &'static str, value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.errors.push(FieldError::new(field, "is required"));
        } else if !is_valid_email(trimmed) {
            self.errors
                .push(FieldError::new(field, "must be a valid email address"));
        }
        self
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

/// メールアドレスの形式チェック
///
/// `local@domain` 形式で、ドメイン部に先頭・末尾以外のドットを含むこと。
pub fn is_valid_email(value: &str) -> bool {
    if !value.validate_email() {
        return false;
    }

    let Some((_, domain)) = value.rsplit_once('@') else {
        return false;
    };

    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
