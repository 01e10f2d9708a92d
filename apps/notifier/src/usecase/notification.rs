//! # 通知ユースケース
//!
//! フォーム送信を検証し、メール本文を生成してリレーへ送信する。
//!
//! ## モジュール構成
//!
//! - [`template_renderer`] - tera テンプレートエンジンによる本文生成
//! - [`service`] - 検証 + レンダリング + 組み立て + 送信の統合サービス

pub mod service;
pub mod template_renderer;

pub use service::{DispatchError, DispatchStage, NotificationService};
pub use template_renderer::TemplateRenderer;
