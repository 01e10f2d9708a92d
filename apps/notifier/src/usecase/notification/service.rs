//! # 通知サービス
//!
//! 検証 → テンプレートレンダリング → メッセージ組み立て → 送信を統合するサービス。
//!
//! ## 設計方針
//!
//! - **同期送信**: `dispatch()` は送信完了まで待ち、結果をそのまま返す
//! - **リトライなし**: 1 回の送信失敗は 1 回の失敗としてそのまま返す
//! - **部分成功なし**: お問い合わせの複数宛先は 1 回の送信で全員に送る
//! - **依存性注入**: `NotificationSender` と `Clock` は trait で抽象化
//!
//! ## 状態遷移
//!
//! ```text
//! Received → Guarded → Validated → Rendered → Composed → Sent
//!               │          │          │          │
//!               └──────────┴──────────┴──────────┴──→ Failed
//! ```
//!
//! `Received → Guarded` はアクセス制御ミドルウェアが担当し、
//! このサービスは `Guarded` 状態の通知を受け取る。

use std::sync::Arc;

use formmail_domain::{
    clock::Clock,
    notification::{Notification, NotificationError, NotificationKind, OutgoingMessage},
    validation::{Validate, ValidationErrors},
};
use formmail_infra::NotificationSender;
use formmail_shared::{
    event_log::{error, event},
    log_business_event,
};
use strum::IntoStaticStr;
use thiserror::Error;

use super::TemplateRenderer;

/// 1 リクエスト分の処理段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DispatchStage {
    /// リクエストを受信した
    Received,
    /// IP 許可リストとレート制限を通過した
    Guarded,
    /// ペイロードの検証を通過した
    Validated,
    /// 本文を生成した
    Rendered,
    /// 送信メッセージを組み立てた
    Composed,
    /// リレーが受け付けた
    Sent,
    /// いずれかの段階で失敗した
    Failed,
}

/// 通知処理のエラー
///
/// どの段階で失敗したかを保持する。
#[derive(Debug, Error)]
pub enum DispatchError {
    /// ペイロードの検証に失敗（クライアントが修正可能）
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// 本文の生成に失敗（テンプレートとプレースホルダーの不整合）
    #[error("本文の生成に失敗: {0}")]
    Render(NotificationError),

    /// 送信メッセージの組み立てに失敗（宛先なし、ヘッダー不正）
    #[error("メッセージの組み立てに失敗: {0}")]
    Compose(NotificationError),

    /// リレーへの送信に失敗（接続、認証、拒否）
    #[error("メールリレーへの送信に失敗: {0}")]
    Transport(NotificationError),
}

impl DispatchError {
    /// 失敗した段階（到達できなかった状態）
    pub fn failed_stage(&self) -> DispatchStage {
        match self {
            Self::Validation(_) => DispatchStage::Validated,
            Self::Render(_) => DispatchStage::Rendered,
            Self::Compose(_) => DispatchStage::Composed,
            Self::Transport(_) => DispatchStage::Sent,
        }
    }
}

/// 通知サービス
///
/// 5 種類の通知はすべて同じ状態機械を通り、検証スキーマ・テンプレート・
/// 宛先の決定方法だけが異なる。
pub struct NotificationService {
    sender:             Arc<dyn NotificationSender>,
    template_renderer:  TemplateRenderer,
    clock:              Arc<dyn Clock>,
    contact_recipients: Vec<String>,
}

impl NotificationService {
    pub fn new(
        sender: Arc<dyn NotificationSender>,
        template_renderer: TemplateRenderer,
        clock: Arc<dyn Clock>,
        contact_recipients: Vec<String>,
    ) -> Self {
        Self {
            sender,
            template_renderer,
            clock,
            contact_recipients,
        }
    }

    /// 通知を送信する
    ///
    /// いずれかの段階で失敗した時点で残りの段階は実行しない。
    pub async fn dispatch(&self, notification: Notification) -> Result<(), DispatchError> {
        let kind = notification.kind();
        let kind_str: &str = kind.into();

        let result = self.run(&notification).await;

        match &result {
            Ok(recipient_count) => {
                transition(kind, DispatchStage::Composed, DispatchStage::Sent);
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SENT,
                    event.result = event::result::SUCCESS,
                    notification.kind = kind_str,
                    notification.recipient_count = recipient_count,
                    "通知メール送信成功"
                );
            }
            Err(DispatchError::Validation(e)) => {
                transition(kind, DispatchStage::Guarded, DispatchStage::Failed);
                tracing::info!(
                    notification.kind = kind_str,
                    error = %e,
                    "通知リクエストのバリデーションに失敗"
                );
            }
            Err(e) => {
                let error_kind = match e {
                    DispatchError::Render(_) => error::kind::TEMPLATE,
                    DispatchError::Compose(_) => error::kind::MESSAGE,
                    _ => error::kind::MAIL_RELAY,
                };
                let error_category = match e {
                    DispatchError::Transport(_) => error::category::EXTERNAL_SERVICE,
                    _ => error::category::INTERNAL,
                };
                let stage: &str = e.failed_stage().into();
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.result = event::result::FAILURE,
                    notification.kind = kind_str,
                    dispatch.failed_stage = stage,
                    error.category = error_category,
                    error.kind = error_kind,
                    error = %e,
                    "通知メール送信失敗"
                );
            }
        }

        result.map(|_| ())
    }

    /// 各段階を順に実行し、成功時は宛先数を返す
    async fn run(&self, notification: &Notification) -> Result<usize, DispatchError> {
        let kind = notification.kind();

        notification.validate()?;
        transition(kind, DispatchStage::Guarded, DispatchStage::Validated);

        let html_body = self
            .template_renderer
            .render(notification, self.clock.now())
            .map_err(DispatchError::Render)?;
        transition(kind, DispatchStage::Validated, DispatchStage::Rendered);

        let recipients = notification.recipients(&self.contact_recipients);
        let message = OutgoingMessage::compose(kind.subject(), recipients, html_body)
            .map_err(DispatchError::Compose)?;
        transition(kind, DispatchStage::Rendered, DispatchStage::Composed);

        self.sender
            .send_email(&message)
            .await
            .map_err(DispatchError::Transport)?;

        Ok(message.recipients().len())
    }
}

fn transition(kind: NotificationKind, from: DispatchStage, to: DispatchStage) {
    tracing::debug!(
        notification.kind = %kind,
        from = %from,
        to = %to,
        "通知処理の状態遷移"
    );
}
