pub mod email_message;
pub mod sms_message;
pub mod wechat_template;

pub use email_message::EmailMessage;
pub use sms_message::SmsMessage;
pub use wechat_template::{Miniprogram, TemplateField, TemplateMessagePayload, WechatTemplate};
