use std::sync::Arc;

use async_trait::async_trait;
use msgpush_serviceauth::AccessTokenProvider;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info};

use crate::domain::service::{DeliveryError, WechatTokenSource};

#[derive(Debug, Deserialize)]
struct TokenCenterResponse {
    access_token: String,
}

/// 公众号アクセストークンを集中管理するトークンセンターのクライアント。
///
/// トークンセンター自体はクライアントクレデンシャルトークンで認証する。
pub struct WechatTokenCenter {
    url: String,
    provider: Arc<dyn AccessTokenProvider>,
    client: Client,
}

impl WechatTokenCenter {
    pub fn new(url: impl Into<String>, provider: Arc<dyn AccessTokenProvider>, client: Client) -> Self {
        Self {
            url: url.into(),
            provider,
            client,
        }
    }
}

#[async_trait]
impl WechatTokenSource for WechatTokenCenter {
    async fn fetch_access_token(&self) -> Result<String, DeliveryError> {
        let credential = self
            .provider
            .get_token()
            .await
            .map_err(|e| DeliveryError::TokenUnavailable(e.to_string()))?;

        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::AUTHORIZATION, credential.authorization_header())
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "token center request failed");
                DeliveryError::ConnectionFailed(e.to_string())
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, content = %body, "get weixin token error");
            return Err(DeliveryError::TokenUnavailable(format!(
                "token center returned {status}"
            )));
        }

        let body: TokenCenterResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::TokenUnavailable(e.to_string()))?;
        info!("get weixin token successfully");
        Ok(body.access_token)
    }
}
