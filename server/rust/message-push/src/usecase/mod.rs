pub mod background;
pub mod fan_out;
pub mod send_email_message;
pub mod send_sms_message;
pub mod send_wechat_message;

pub use background::spawn_background;
pub use fan_out::{FanOutReport, FanOutSender};
pub use send_email_message::{SendEmailMessageInput, SendEmailMessageUseCase};
pub use send_sms_message::SendSmsMessageUseCase;
pub use send_wechat_message::{SendWechatMessageInput, SendWechatMessageUseCase};

use crate::domain::service::{DeliveryError, TemplateError};

/// メッセージ送信処理全体を中断させるエラー。
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("token acquisition failed: {0}")]
    TokenAcquisitionFailed(String),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("template render failed: {0}")]
    TemplateRender(String),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl From<TemplateError> for DispatchError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::NotFound(name) => DispatchError::TemplateNotFound(name),
            TemplateError::Render(msg) => DispatchError::TemplateRender(msg),
        }
    }
}
