//! # ユースケース層
//!
//! Notifier のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: 送信・時刻取得を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//!
//! ## モジュール構成
//!
//! - `notification`: 通知の検証・レンダリング・送信

pub mod notification;

pub use notification::{DispatchError, DispatchStage, NotificationService, TemplateRenderer};
