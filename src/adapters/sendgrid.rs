use crate::config::EmailConfig;
use crate::domain::model::{Archive, MashupRequest};
use crate::domain::ports::Delivery;
use crate::utils::error::{MashupError, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const SEND_PATH: &str = "/v3/mail/send";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Emails the archive as an attachment through the SendGrid v3 API.
#[derive(Debug, Clone)]
pub struct SendGridMailer {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    from_email: Option<String>,
    subject: String,
    body: String,
}

impl SendGridMailer {
    pub fn from_config(email: &EmailConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: email.api_base.trim_end_matches('/').to_string(),
            api_key: email.sendgrid_api_key.clone(),
            from_email: email.from_email.clone(),
            subject: email.subject.clone(),
            body: email.body.clone(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.api_base, SEND_PATH)
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        match (self.api_key.as_deref(), self.from_email.as_deref()) {
            (Some(key), Some(from)) => Ok((key, from)),
            _ => Err(MashupError::ConfigError {
                message: "Missing SENDGRID_API_KEY or FROM_EMAIL in environment variables"
                    .to_string(),
            }),
        }
    }

    pub fn build_payload(&self, from: &str, to: &str, file_name: &str, zip_bytes: &[u8]) -> serde_json::Value {
        let encoded = base64::engine::general_purpose::STANDARD.encode(zip_bytes);
        json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": from },
            "subject": self.subject,
            "content": [{ "type": "text/plain", "value": self.body }],
            "attachments": [{
                "content": encoded,
                "filename": file_name,
                "type": "application/zip",
                "disposition": "attachment"
            }]
        })
    }
}

#[async_trait]
impl Delivery for SendGridMailer {
    async fn deliver(&self, request: &MashupRequest, archive: &Archive) -> Result<String> {
        let (api_key, from) = self.credentials()?;

        let zip_bytes = tokio::fs::read(&archive.path).await?;
        let payload = self.build_payload(from, &request.email, &archive.file_name, &zip_bytes);

        tracing::info!(
            "📧 Sending {} ({} bytes) to {}",
            archive.file_name,
            zip_bytes.len(),
            request.email
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("SendGrid response status: {}", status);

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MashupError::DeliveryError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(format!("emailed to {}", request.email))
    }
}
