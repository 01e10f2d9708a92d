//! # Formmail 共有ユーティリティ
//!
//! notifier アプリとインフラ層で使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - axum などの Web フレームワークには依存しない
//! - 外部クレートへの依存は最小限に抑える

pub mod error_response;
pub mod event_log;
pub mod health;
pub mod message_response;
pub mod observability;

pub use error_response::{ErrorResponse, FieldViolation};
pub use health::HealthResponse;
pub use message_response::MessageResponse;
