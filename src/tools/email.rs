use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::{string_arg, Tool};
use crate::config::SmtpConfig;
use crate::models::FunctionSchema;

pub const SEND_EMAIL: &str = "send_email";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

/// Sends mail through an authenticated STARTTLS relay, one session per message.
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let host = self.config.host.as_deref().context("SMTP_SERVER not configured")?;
        let sender = self.config.sender.as_deref().context("EMAIL_SENDER not configured")?;
        let password = self.config.password.clone().unwrap_or_default();

        let message = build_message(sender, email)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .with_context(|| format!("Failed to set up SMTP relay {host}"))?
            .port(self.config.port)
            .credentials(Credentials::new(sender.to_string(), password))
            .build();

        transport
            .send(message)
            .await
            .with_context(|| format!("Failed to send email via {host}:{}", self.config.port))?;

        tracing::info!("Email sent to {}", email.to);
        Ok(())
    }
}

fn build_message(sender: &str, email: &OutgoingEmail) -> Result<Message> {
    let from: Mailbox = sender
        .parse()
        .with_context(|| format!("Invalid sender address '{sender}'"))?;
    let to: Mailbox = email
        .to
        .parse()
        .with_context(|| format!("Invalid recipient address '{}'", email.to))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(email.body.clone())
        .context("Failed to build email")
}

/// The `send_email(to_email, subject, body)` function offered to the model.
pub struct SendEmailTool {
    mailer: Arc<dyn Mailer>,
}

impl SendEmailTool {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }
}

#[async_trait]
impl Tool for SendEmailTool {
    fn schema(&self) -> FunctionSchema {
        FunctionSchema {
            name: SEND_EMAIL.to_string(),
            description: "Send an email to the patient".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "to_email": {
                        "type": "string",
                        "description": "Recipient email address"
                    },
                    "subject": {
                        "type": "string",
                        "description": "Email subject"
                    },
                    "body": {
                        "type": "string",
                        "description": "Email body"
                    }
                },
                "required": ["to_email", "subject", "body"]
            }),
        }
    }

    async fn invoke(&self, arguments: &Map<String, Value>) -> Result<()> {
        let email = OutgoingEmail {
            to: string_arg(arguments, "to_email")?.to_string(),
            subject: string_arg(arguments, "subject")?.to_string(),
            body: string_arg(arguments, "body")?.to_string(),
        };
        tracing::info!("Model requested email to {} ({:?})", email.to, email.subject);
        self.mailer.send(&email).await
    }
}
