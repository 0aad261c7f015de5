use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::entity::{EmailMessage, SmsMessage, TemplateMessagePayload};

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("delivery rejected: {0}")]
    Rejected(String),

    #[error("no external identity for recipient {0}")]
    IdentityResolutionMiss(String),

    #[error("access token unavailable: {0}")]
    TokenUnavailable(String),

    #[error("delivery error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),

    #[error("template render failed: {0}")]
    Render(String),
}

/// 公众号テンプレートメッセージを 1 受信者へ送る。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateMessageClient: Send + Sync {
    async fn send(
        &self,
        access_token: &str,
        payload: &TemplateMessagePayload,
    ) -> Result<(), DeliveryError>;
}

/// 内部ユーザー ID を外部チャネルの ID（openid）に変換する。
/// マッピングが存在しない場合は `DeliveryError::IdentityResolutionMiss`。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, user_id: &str) -> Result<String, DeliveryError>;
}

/// 公众号 API 呼び出し用のアクセストークンを払い出す。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WechatTokenSource: Send + Sync {
    async fn fetch_access_token(&self) -> Result<String, DeliveryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsClient: Send + Sync {
    async fn send(&self, message: &SmsMessage) -> Result<(), DeliveryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailClient: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), DeliveryError>;
}

/// HTML メールテンプレートの存在確認と描画。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    async fn exists(&self, template_name: &str) -> bool;
    async fn render(
        &self,
        template_name: &str,
        variables: &Map<String, Value>,
    ) -> Result<String, TemplateError>;
}
