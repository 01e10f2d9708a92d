//! # ミドルウェア
//!
//! Notifier 用のミドルウェアを提供する。

mod access_guard;

pub use access_guard::{AccessGuardState, access_guard, client_ip};
