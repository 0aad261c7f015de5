use std::sync::Arc;

use tracing::{error, info};

use crate::domain::entity::WechatTemplate;
use crate::domain::service::{DeliveryError, WechatTokenSource};
use crate::usecase::{DispatchError, FanOutReport, FanOutSender};

#[derive(Debug, Clone)]
pub struct SendWechatMessageInput {
    /// 微信開放プラットフォームの unionid 一覧。
    pub to_users: Vec<String>,
    pub template: WechatTemplate,
}

/// トークンセンターからアクセストークンを 1 度だけ取得し、全受信者へファンアウトする。
pub struct SendWechatMessageUseCase {
    token_source: Arc<dyn WechatTokenSource>,
    sender: Arc<FanOutSender>,
}

impl SendWechatMessageUseCase {
    pub fn new(token_source: Arc<dyn WechatTokenSource>, sender: Arc<FanOutSender>) -> Self {
        Self {
            token_source,
            sender,
        }
    }

    pub async fn execute(&self, input: SendWechatMessageInput) -> Result<FanOutReport, DispatchError> {
        info!(recipients = input.to_users.len(), "prepare to send wechat message");

        let access_token = self.token_source.fetch_access_token().await.map_err(|e| {
            error!(error = %e, "could not get wechat access token");
            DispatchError::TokenAcquisitionFailed(match e {
                DeliveryError::TokenUnavailable(reason) => reason,
                other => other.to_string(),
            })
        })?;

        let report = self
            .sender
            .send(&input.to_users, input.template, &access_token)
            .await;
        Ok(report)
    }
}
