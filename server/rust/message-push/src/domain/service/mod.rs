pub mod delivery_client;

pub use delivery_client::{
    DeliveryError, EmailClient, IdentityResolver, SmsClient, TemplateError, TemplateMessageClient,
    TemplateRenderer, WechatTokenSource,
};

#[cfg(test)]
pub use delivery_client::{
    MockEmailClient, MockIdentityResolver, MockSmsClient, MockTemplateMessageClient,
    MockTemplateRenderer, MockWechatTokenSource,
};
