use std::sync::Arc;

use tracing::info;

use crate::domain::entity::SmsMessage;
use crate::domain::service::SmsClient;
use crate::usecase::DispatchError;

pub struct SendSmsMessageUseCase {
    client: Arc<dyn SmsClient>,
}

impl SendSmsMessageUseCase {
    pub fn new(client: Arc<dyn SmsClient>) -> Self {
        Self { client }
    }

    pub async fn execute(&self, message: SmsMessage) -> Result<(), DispatchError> {
        info!(
            template = %message.template_name,
            recipients = message.to_users.len(),
            "prepare to send sms message"
        );
        self.client.send(&message).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::service::{DeliveryError, MockSmsClient};
    use serde_json::Map;

    fn message() -> SmsMessage {
        SmsMessage {
            template_name: "event-push".to_string(),
            to_users: vec!["15000000000".to_string(), "15000000001".to_string()],
            template_params: Map::new(),
        }
    }

    #[tokio::test]
    async fn success_sends_once_for_all_numbers() {
        let mut client = MockSmsClient::new();
        client
            .expect_send()
            .withf(|m| m.to_users.len() == 2 && m.template_name == "event-push")
            .times(1)
            .returning(|_| Ok(()));

        let uc = SendSmsMessageUseCase::new(Arc::new(client));
        assert!(uc.execute(message()).await.is_ok());
    }

    #[tokio::test]
    async fn gateway_rejection_is_returned() {
        let mut client = MockSmsClient::new();
        client
            .expect_send()
            .returning(|_| Err(DeliveryError::Rejected("HTTP 400".to_string())));

        let uc = SendSmsMessageUseCase::new(Arc::new(client));
        let result = uc.execute(message()).await;
        assert!(matches!(
            result,
            Err(DispatchError::Delivery(DeliveryError::Rejected(_)))
        ));
    }
}
