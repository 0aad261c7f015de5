pub mod email_client;
pub mod sms_client;
pub mod token_center;
pub mod wechat_client;

pub use email_client::SmtpEmailClient;
pub use sms_client::SmsGatewayClient;
pub use token_center::WechatTokenCenter;
pub use wechat_client::WechatTemplateClient;
