use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{error, info};

use crate::domain::entity::SmsMessage;
use crate::domain::service::{DeliveryError, SmsClient};

pub struct SmsGatewayClient {
    api_server: String,
    api_version: String,
    account: String,
    auth_key: SecretString,
    client: Client,
}

impl SmsGatewayClient {
    pub fn new(
        api_server: impl Into<String>,
        api_version: impl Into<String>,
        account: impl Into<String>,
        auth_key: SecretString,
        client: Client,
    ) -> Self {
        Self {
            api_server: api_server.into(),
            api_version: api_version.into(),
            account: account.into(),
            auth_key,
            client,
        }
    }
}

#[async_trait]
impl SmsClient for SmsGatewayClient {
    async fn send(&self, message: &SmsMessage) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.api_server)
            .query(&[("api-version", self.api_version.as_str())])
            .header("Account", &self.account)
            .header(
                reqwest::header::AUTHORIZATION,
                self.auth_key.expose_secret().as_str(),
            )
            .json(&message.request_body())
            .send()
            .await
            .map_err(|e| DeliveryError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::OK {
            info!(content = %body, "send sms message successfully");
            Ok(())
        } else {
            error!(status = %status, content = %body, "send sms message error");
            Err(DeliveryError::Rejected(format!(
                "sms gateway returned {status}: {body}"
            )))
        }
    }
}
