use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::info;

use crate::domain::entity::EmailMessage;
use crate::domain::service::{EmailClient, TemplateRenderer};
use crate::usecase::DispatchError;

#[derive(Debug, Clone)]
pub struct SendEmailMessageInput {
    pub subject: String,
    /// テンプレート名（拡張子なしの HTML ファイル名）。
    pub template_name: String,
    pub to_users: Vec<String>,
    pub cc_users: Vec<String>,
    pub variables: Map<String, Value>,
}

/// テンプレート描画はリクエスト処理内で行い、SMTP 送信だけを後段に回す。
pub struct SendEmailMessageUseCase {
    renderer: Arc<dyn TemplateRenderer>,
    client: Arc<dyn EmailClient>,
}

impl SendEmailMessageUseCase {
    pub fn new(renderer: Arc<dyn TemplateRenderer>, client: Arc<dyn EmailClient>) -> Self {
        Self { renderer, client }
    }

    /// テンプレートの存在確認と描画を行い、送信可能なメールを返す。
    pub async fn prepare(
        &self,
        input: SendEmailMessageInput,
    ) -> Result<EmailMessage, DispatchError> {
        if !self.renderer.exists(&input.template_name).await {
            return Err(DispatchError::TemplateNotFound(input.template_name));
        }
        let html_body = self
            .renderer
            .render(&input.template_name, &input.variables)
            .await?;

        Ok(EmailMessage {
            subject: input.subject,
            to_users: input.to_users,
            cc_users: input.cc_users,
            html_body,
        })
    }

    pub async fn execute(&self, message: EmailMessage) -> Result<(), DispatchError> {
        info!(
            subject = %message.subject,
            to = message.to_users.len(),
            cc = message.cc_users.len(),
            "prepare to send email"
        );
        self.client.send(&message).await?;
        info!("send email successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::service::{MockEmailClient, MockTemplateRenderer, TemplateError};

    fn input(template_name: &str) -> SendEmailMessageInput {
        let mut variables = Map::new();
        variables.insert("service_no".to_string(), Value::from("202009090999"));
        SendEmailMessageInput {
            subject: "Service order".to_string(),
            template_name: template_name.to_string(),
            to_users: vec!["ops@example.com".to_string()],
            cc_users: vec![],
            variables,
        }
    }

    #[tokio::test]
    async fn prepare_missing_template_is_not_found() {
        let mut renderer = MockTemplateRenderer::new();
        renderer.expect_exists().returning(|_| false);
        renderer.expect_render().never();
        let uc = SendEmailMessageUseCase::new(Arc::new(renderer), Arc::new(MockEmailClient::new()));

        match uc.prepare(input("missing")).await {
            Err(DispatchError::TemplateNotFound(name)) => assert_eq!(name, "missing"),
            other => unreachable!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn prepare_renders_body() {
        let mut renderer = MockTemplateRenderer::new();
        renderer
            .expect_exists()
            .withf(|name| name == "service_order")
            .returning(|_| true);
        renderer
            .expect_render()
            .returning(|_, vars| Ok(format!("<p>{}</p>", vars["service_no"].as_str().unwrap_or(""))));
        let uc = SendEmailMessageUseCase::new(Arc::new(renderer), Arc::new(MockEmailClient::new()));

        let message = uc.prepare(input("service_order")).await.unwrap();
        assert_eq!(message.html_body, "<p>202009090999</p>");
        assert_eq!(message.subject, "Service order");
    }

    #[tokio::test]
    async fn prepare_render_failure_is_render_error() {
        let mut renderer = MockTemplateRenderer::new();
        renderer.expect_exists().returning(|_| true);
        renderer
            .expect_render()
            .returning(|_, _| Err(TemplateError::Render("unclosed block".to_string())));
        let uc = SendEmailMessageUseCase::new(Arc::new(renderer), Arc::new(MockEmailClient::new()));

        match uc.prepare(input("broken")).await {
            Err(DispatchError::TemplateRender(msg)) => assert_eq!(msg, "unclosed block"),
            other => unreachable!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn execute_delegates_to_client() {
        let mut client = MockEmailClient::new();
        client
            .expect_send()
            .withf(|m| m.to_users == vec!["ops@example.com".to_string()])
            .times(1)
            .returning(|_| Ok(()));
        let uc = SendEmailMessageUseCase::new(Arc::new(MockTemplateRenderer::new()), Arc::new(client));

        let message = EmailMessage {
            subject: "s".to_string(),
            to_users: vec!["ops@example.com".to_string()],
            cc_users: vec![],
            html_body: "<p>hi</p>".to_string(),
        };
        assert!(uc.execute(message).await.is_ok());
    }
}
