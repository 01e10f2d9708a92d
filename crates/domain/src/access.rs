//! # アクセス制御
//!
//! 通知パイプラインの手前で評価する 2 つの独立したポリシーを定義する。
//!
//! - [`AllowedIps`]: 送信元 IP の許可リスト（完全一致）
//! - [`TokenBucket`]: クライアント単位のトークンバケット
//!
//! どちらも純粋なデータ構造で、共有状態の管理はインフラ層が担う。

mod allow_list;
mod token_bucket;

pub use allow_list::AllowedIps;
pub use token_bucket::{RateLimitDecision, RateLimitPolicy, RateLimitPolicyError, TokenBucket};
