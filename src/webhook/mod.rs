use std::time::Duration;

use log::info;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_API_BASE: &str = "https://api.helius.xyz";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook API returned status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateWebhookRequest {
    #[serde(rename = "webhookURL")]
    webhook_url: String,
    transaction_types: Vec<String>,
    account_addresses: Vec<String>,
    webhook_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredWebhook {
    #[serde(rename = "webhookID")]
    pub webhook_id: String,
    #[serde(default)]
    pub transaction_types: Vec<String>,
}

/// Registers this service's ingest URL with the notification provider so
/// enhanced transactions for the tracked addresses start flowing in.
pub struct WebhookRegistrar {
    api_base: String,
    api_key: String,
    http_client: Client,
}

impl WebhookRegistrar {
    pub fn new(api_key: String) -> Result<Self, RegistrationError> {
        Self::with_api_base(api_key, DEFAULT_API_BASE.to_string())
    }

    pub fn with_api_base(api_key: String, api_base: String) -> Result<Self, RegistrationError> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            api_base,
            api_key,
            http_client,
        })
    }

    /// Create an enhanced webhook covering the tracked addresses.
    pub async fn register(
        &self,
        webhook_url: &str,
        addresses: Vec<String>,
    ) -> Result<RegisteredWebhook, RegistrationError> {
        let url = format!("{}/v0/webhooks?api-key={}", self.api_base, self.api_key);
        let request = CreateWebhookRequest {
            webhook_url: webhook_url.to_string(),
            transaction_types: vec!["SWAP".to_string(), "TRANSFER".to_string()],
            account_addresses: addresses,
            webhook_type: "enhanced".to_string(),
        };

        let response = self.http_client.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistrationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let webhook = response.json::<RegisteredWebhook>().await?;
        info!(
            "webhook registered: id={} types={:?}",
            webhook.webhook_id, webhook.transaction_types
        );
        Ok(webhook)
    }
}
