use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use shared_config::AppConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailReceipt {
    #[serde(alias = "id")]
    pub message_id: Option<String>,
}

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Mail transport is not configured")]
    NotConfigured,

    #[error("Mail transport request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Mail provider rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Outbound mail seam. Each call sends exactly one message and never retries.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<MailReceipt, MailError>;

    /// Address used in the `From` header.
    fn sender(&self) -> &str;
}

/// Transactional mail provider reached over its HTTP API with basic auth.
pub struct HttpMailTransport {
    client: Client,
    api_url: String,
    user: String,
    password: String,
}

impl HttpMailTransport {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.mail_api_url.clone(),
            user: config.mail_user.clone(),
            password: config.mail_password.clone(),
        }
    }

    fn is_configured(&self) -> bool {
        !self.api_url.is_empty() && !self.user.is_empty() && !self.password.is_empty()
    }
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<MailReceipt, MailError> {
        if !self.is_configured() {
            return Err(MailError::NotConfigured);
        }

        debug!("Dispatching '{}' to {}", message.subject, message.to);

        let response = self
            .client
            .post(&self.api_url)
            .basic_auth(&self.user, Some(&self.password))
            .json(message)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Mail provider error ({}): {}", status, body);
            return Err(MailError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        let receipt = serde_json::from_str::<MailReceipt>(&body).unwrap_or_default();
        info!("Mail sent to {} ({:?})", message.to, receipt.message_id);
        Ok(receipt)
    }

    fn sender(&self) -> &str {
        &self.user
    }
}
