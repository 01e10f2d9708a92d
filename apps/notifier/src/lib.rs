//! # Formmail Notifier ライブラリ
//!
//! フォーム送信を受け付けて通知メールを送る HTTP サービス。
//! バイナリ（`main.rs`）と統合テストからルーター構築を共有するために公開する。

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod usecase;

pub use app_builder::build_app;
