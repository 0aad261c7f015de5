use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::AppState;
use crate::domain::entity::{Miniprogram, SmsMessage, TemplateField, WechatTemplate};
use crate::usecase::{spawn_background, DispatchError, SendEmailMessageInput, SendWechatMessageInput};

/// 受付完了時のレスポンス本文。
const ACCEPTED: &str = "success";

#[derive(Debug, Deserialize)]
pub struct SmsMessageRequest {
    /// SMS プラットフォームで審査済みのテンプレート名。
    pub template_name: String,
    /// 送信先電話番号。
    pub to_users: Vec<String>,
    pub message: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct EmailMessageRequest {
    pub subject: String,
    /// HTML テンプレートのファイル名（拡張子なし）。
    pub template_name: String,
    pub to_users: Vec<String>,
    #[serde(default)]
    pub cc_users: Option<Vec<String>>,
    pub message: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct WechatMessageRequest {
    pub template_id: String,
    /// unionid 一覧。
    pub to_users: Vec<String>,
    pub message: BTreeMap<String, TemplateField>,
    #[serde(default)]
    pub miniprogram: Option<Miniprogram>,
}

/// POST /api/v1/services/sms/messages
pub async fn push_sms_message(
    State(state): State<AppState>,
    Json(req): Json<SmsMessageRequest>,
) -> Json<&'static str> {
    let message = SmsMessage {
        template_name: req.template_name,
        to_users: req.to_users,
        template_params: req.message,
    };
    let uc = state.send_sms_uc.clone();
    spawn_background("sms", async move { uc.execute(message).await });
    Json(ACCEPTED)
}

/// POST /api/v1/services/email/messages
///
/// テンプレートが存在しない場合は送信を起動せず 404 を返す。
pub async fn push_email_message(
    State(state): State<AppState>,
    Json(req): Json<EmailMessageRequest>,
) -> Response {
    let input = SendEmailMessageInput {
        subject: req.subject,
        template_name: req.template_name,
        to_users: req.to_users,
        cc_users: req.cc_users.unwrap_or_default(),
        variables: req.message,
    };

    let message = match state.send_email_uc.prepare(input).await {
        Ok(message) => message,
        Err(DispatchError::TemplateNotFound(name)) => {
            let err = ErrorResponse::new(
                "TEMPLATE_NOT_FOUND",
                &format!("template {name}.html does not exist"),
            );
            return (StatusCode::NOT_FOUND, Json(err)).into_response();
        }
        Err(e) => {
            let err = ErrorResponse::new("TEMPLATE_RENDER_FAILED", &e.to_string());
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(err)).into_response();
        }
    };

    let uc = state.send_email_uc.clone();
    spawn_background("email", async move { uc.execute(message).await });
    Json(ACCEPTED).into_response()
}

/// POST /api/v1/services/wechat/messages
pub async fn push_wechat_message(
    State(state): State<AppState>,
    Json(req): Json<WechatMessageRequest>,
) -> Json<&'static str> {
    let mut template = WechatTemplate::new(req.template_id, req.message);
    if let Some(miniprogram) = req.miniprogram {
        template = template.with_miniprogram(miniprogram);
    }
    let input = SendWechatMessageInput {
        to_users: req.to_users,
        template,
    };
    let uc = state.send_wechat_uc.clone();
    spawn_background("wechat", async move { uc.execute(input).await });
    Json(ACCEPTED)
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            error: ErrorBody {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }
}
