use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::domain::entity::EmailMessage;
use crate::domain::service::{DeliveryError, EmailClient};

/// STARTTLS で SMTP リレーへ接続し HTML メールを送る。
pub struct SmtpEmailClient {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpEmailClient {
    pub fn new(
        smtp_host: &str,
        smtp_port: u16,
        username: &str,
        password: &SecretString,
        from_address: &str,
    ) -> Result<Self, DeliveryError> {
        let creds = Credentials::new(username.to_string(), password.expose_secret().clone());

        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)
                .map_err(|e: lettre::transport::smtp::Error| {
                    DeliveryError::ConnectionFailed(e.to_string())
                })?
                .port(smtp_port)
                .credentials(creds)
                .build();

        Ok(Self {
            mailer,
            from_address: from_address.to_string(),
        })
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, DeliveryError> {
        let from: Mailbox = self
            .from_address
            .parse()
            .map_err(|e: lettre::address::AddressError| {
                DeliveryError::Other(format!("invalid from address: {e}"))
            })?;

        let mut builder = Message::builder().from(from).subject(message.subject.as_str());
        for to in &message.to_users {
            builder = builder.to(parse_mailbox(to)?);
        }
        for cc in &message.cc_users {
            builder = builder.cc(parse_mailbox(cc)?);
        }

        builder
            .header(ContentType::TEXT_HTML)
            .body(message.html_body.clone())
            .map_err(|e| DeliveryError::Other(format!("failed to build email: {e}")))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .parse()
        .map_err(|e: lettre::address::AddressError| {
            DeliveryError::Other(format!("invalid recipient address {address}: {e}"))
        })
}

#[async_trait]
impl EmailClient for SmtpEmailClient {
    async fn send(&self, message: &EmailMessage) -> Result<(), DeliveryError> {
        let email = self.build_message(message)?;

        self.mailer
            .send(email)
            .await
            .map_err(|e: lettre::transport::smtp::Error| {
                DeliveryError::ConnectionFailed(e.to_string())
            })?;

        info!(subject = %message.subject, "email accepted by smtp relay");
        Ok(())
    }
}
