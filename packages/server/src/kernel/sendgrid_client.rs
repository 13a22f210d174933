//! SendGrid v3 mail client implementing [`BaseEmailSender`].

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::kernel::traits::BaseEmailSender;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Sends transactional email through SendGrid.
pub struct SendGridMailer {
    api_key: String,
    from_email: String,
    from_name: String,
    client: reqwest::Client,
}

impl SendGridMailer {
    pub fn new(api_key: String, from_email: String, from_name: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            from_email,
            from_name,
            client,
        })
    }
}

#[derive(Serialize)]
struct MailPayload<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Sender<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: Vec<Recipient<'a>>,
}

#[derive(Serialize)]
struct Recipient<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct Sender<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

#[async_trait]
impl BaseEmailSender for SendGridMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        let payload = MailPayload {
            personalizations: vec![Personalization {
                to: vec![Recipient { email: to }],
            }],
            from: Sender {
                email: &self.from_email,
                name: &self.from_name,
            },
            subject,
            content: vec![Content {
                content_type: "text/html",
                value: html,
            }],
        };

        let response = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("Failed to send SendGrid request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("SendGrid API error {}: {}", status, body);
        }

        tracing::debug!(to = %to, status = %status, "email accepted by SendGrid");
        Ok(())
    }
}

/// Stand-in used when no SendGrid credential is configured. Every send
/// fails, which dispatch records as a delivery failure rather than a
/// crash.
pub struct NoopEmailSender;

#[async_trait]
impl BaseEmailSender for NoopEmailSender {
    async fn send(&self, to: &str, _subject: &str, _html: &str) -> Result<()> {
        tracing::warn!(to = %to, "email requested but SENDGRID_API_KEY is not configured");
        bail!("email transport not configured")
    }
}
