//! Completion notifiers.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::NotifierConfig;
use crate::cycle::{NotifyError, Notifier};
use crate::status::StatusDocument;

/// Notifier that does nothing and always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    fn name(&self) -> &str {
        "noop"
    }

    async fn notify(&self, document: &StatusDocument) -> Result<(), NotifyError> {
        debug!(fetch_id = %document.fetch_id, "No notifier configured");
        Ok(())
    }
}

/// Notifier that POSTs the final status document to a webhook.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn notify(&self, document: &StatusDocument) -> Result<(), NotifyError> {
        let response = self.client.post(&self.url).json(document).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
            });
        }

        info!(fetch_id = %document.fetch_id, url = %self.url, "Webhook notified");
        Ok(())
    }
}

/// Build the notifier described by the config: a webhook if one is set,
/// otherwise a no-op.
pub fn create_notifier(
    config: &NotifierConfig,
) -> Result<std::sync::Arc<dyn Notifier>, NotifyError> {
    match config.webhook_url {
        Some(ref url) => Ok(std::sync::Arc::new(WebhookNotifier::new(
            url.clone(),
            Duration::from_secs(config.timeout_secs()),
        )?)),
        None => Ok(std::sync::Arc::new(NoopNotifier)),
    }
}
