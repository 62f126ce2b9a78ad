//! Outbound email delivery.
//!
//! The delivery API is an external collaborator: one POST per message,
//! success or failure, no internal retry. [`EmailSender`] is the seam
//! tests mock; [`HttpEmailSender`] is the production implementation.

use crate::config::EmailConfig;
use crate::error::{Result, TrackerError};
use async_trait::async_trait;
use std::time::Duration;

/// Delivery attempt timeout. The scheduler imposes no additional timeout
/// on top of this.
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// A rendered outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Email delivery contract. Exactly one outbound attempt per call.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver `message`. A failure is final; callers decide whether to
    /// tolerate it.
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// HTTP delivery API client.
pub struct HttpEmailSender {
    endpoint: String,
    from: String,
    access_token: String,
    client: reqwest::Client,
}

impl HttpEmailSender {
    pub fn new(config: &EmailConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            endpoint: config.endpoint.clone(),
            from: format_from(&config.from_name, &config.from_address),
            access_token: config.access_token.clone(),
            client,
        }
    }
}

/// RFC 5322 style display-name sender, e.g.
/// `"Subscription Tracker" <reminders@subtrack.local>`.
fn format_from(name: &str, address: &str) -> String {
    if name.trim().is_empty() {
        address.to_owned()
    } else {
        format!("\"{name}\" <{address}>")
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let body = serde_json::json!({
            "from": self.from,
            "to": message.to,
            "subject": message.subject,
            "text": message.text,
            "html": message.html,
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if !self.access_token.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.access_token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| TrackerError::DeliveryFailed(format!("email API unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::DeliveryFailed(format!(
                "email API returned {status}: {body}"
            )));
        }

        Ok(())
    }
}
