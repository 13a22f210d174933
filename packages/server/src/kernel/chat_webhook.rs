//! HTTP transport for Slack and Discord incoming webhooks.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::kernel::traits::BaseChatWebhook;

/// Posts JSON payloads to webhook URLs over reqwest. Renderer code
/// decides per channel which status code counts as delivered.
pub struct ReqwestChatWebhook {
    client: reqwest::Client,
}

impl ReqwestChatWebhook {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl BaseChatWebhook for ReqwestChatWebhook {
    async fn post_json(&self, url: &str, payload: &serde_json::Value) -> Result<u16> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .context("Failed to send webhook request")?;

        Ok(response.status().as_u16())
    }
}
