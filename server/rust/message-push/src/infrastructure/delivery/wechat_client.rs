use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::domain::entity::TemplateMessagePayload;
use crate::domain::service::{DeliveryError, TemplateMessageClient};

/// 微信は HTTP 200 でも本文の errcode で失敗を返す。
#[derive(Debug, Default, Deserialize)]
struct WechatResponse {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

pub struct WechatTemplateClient {
    send_url: String,
    client: Client,
}

impl WechatTemplateClient {
    pub fn new(send_url: impl Into<String>, client: Client) -> Self {
        Self {
            send_url: send_url.into(),
            client,
        }
    }
}

#[async_trait]
impl TemplateMessageClient for WechatTemplateClient {
    async fn send(
        &self,
        access_token: &str,
        payload: &TemplateMessagePayload,
    ) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.send_url)
            .query(&[("access_token", access_token)])
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/json; charset=utf-8",
            )
            .json(payload)
            .send()
            .await
            .map_err(|e| DeliveryError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        info!(
            openid = %payload.touser,
            status = %status,
            content = %body,
            "response from wechat"
        );

        if !status.is_success() {
            return Err(DeliveryError::Rejected(format!(
                "wechat returned {status}: {body}"
            )));
        }

        let parsed: WechatResponse = serde_json::from_str(&body).unwrap_or_default();
        if parsed.errcode != 0 {
            return Err(DeliveryError::Rejected(format!(
                "errcode {}: {}",
                parsed.errcode, parsed.errmsg
            )));
        }
        Ok(())
    }
}
