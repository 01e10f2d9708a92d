//! # 通知ハンドラ
//!
//! フォーム送信を受け付け、通知メールを同期的に送信する。
//!
//! ## エンドポイント
//!
//! | メソッド | パス | ペイロード | 宛先 |
//! |---------|------|-----------|------|
//! | POST | `/submit-contact` | first_name, last_name, email, phone, service, message | 設定された固定リスト |
//! | POST | `/signup` | id, email, token | `email` |
//! | POST | `/activate` | email, token | `email` |
//! | POST | `/resetpwd` | email, token | `email` |
//! | POST | `/completedpwdreset` | email | `email` |

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use formmail_domain::notification::{
    ActivationRequest,
    ContactForm,
    Notification,
    PasswordResetRequest,
    ResetCompletedRequest,
    SignupRequest,
};
use formmail_shared::MessageResponse;

use crate::{error::NotifierError, usecase::NotificationService};

const CONTACT_SENT: &str = "Emails sent successfully!";
const EMAIL_SENT: &str = "Email sent successfully!";

/// 通知ハンドラの State
pub struct NotificationState {
    pub service: NotificationService,
}

async fn dispatch(
    state: &NotificationState,
    notification: Notification,
    message: &str,
) -> Result<Json<MessageResponse>, NotifierError> {
    state.service.dispatch(notification).await?;
    Ok(Json(MessageResponse::new(message)))
}

/// POST /submit-contact
pub async fn submit_contact(
    State(state): State<Arc<NotificationState>>,
    payload: Result<Json<ContactForm>, JsonRejection>,
) -> Result<Json<MessageResponse>, NotifierError> {
    let Json(form) = payload?;
    dispatch(&state, Notification::ContactUs(form), CONTACT_SENT).await
}

/// POST /signup
pub async fn signup(
    State(state): State<Arc<NotificationState>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, NotifierError> {
    let Json(data) = payload?;
    dispatch(&state, Notification::Signup(data), EMAIL_SENT).await
}

/// POST /activate
pub async fn activate(
    State(state): State<Arc<NotificationState>>,
    payload: Result<Json<ActivationRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, NotifierError> {
    let Json(data) = payload?;
    dispatch(&state, Notification::Activation(data), EMAIL_SENT).await
}

/// POST /resetpwd
pub async fn reset_password(
    State(state): State<Arc<NotificationState>>,
    payload: Result<Json<PasswordResetRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, NotifierError> {
    let Json(data) = payload?;
    dispatch(&state, Notification::PasswordReset(data), EMAIL_SENT).await
}

/// POST /completedpwdreset
pub async fn completed_password_reset(
    State(state): State<Arc<NotificationState>>,
    payload: Result<Json<ResetCompletedRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, NotifierError> {
    let Json(data) = payload?;
    dispatch(&state, Notification::ResetCompleted(data), EMAIL_SENT).await
}
