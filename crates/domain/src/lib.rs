//! # Formmail ドメイン層
//!
//! フォーム送信を通知メールに変換するためのドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **I/O なし**: HTTP、SMTP、時刻取得の具体実装には依存しない
//! - **値の検証はここで完結**: 必須項目・メール形式・ヘッダーインジェクションの検査
//! - **状態を持つ構造は純粋に**: トークンバケットは時刻を引数で受け取る
//!
//! ## 依存関係の方向
//!
//! ```text
//! notifier → infra → domain
//!     └────→ shared
//! ```
//!
//! ## モジュール構成
//!
//! - [`notification`] - 通知種別、ペイロード、送信メッセージ
//! - [`validation`] - 項目単位のバリデーション
//! - [`access`] - IP 許可リストとトークンバケット
//! - [`clock`] - 時刻プロバイダ
//!
//! ## 使用例
//!
//! ```rust
//! use formmail_domain::{
//!     notification::{Notification, ResetCompletedRequest},
//!     validation::Validate,
//! };
//!
//! let notification = Notification::ResetCompleted(ResetCompletedRequest {
//!     email: "user@example.com".to_string(),
//! });
//! assert!(notification.validate().is_ok());
//! ```

pub mod access;
pub mod clock;
pub mod notification;
pub mod validation;
