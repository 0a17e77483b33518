//! HTTP record sink.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::SinkConfig;
use crate::cycle::{StoreError, Storer};

/// Storer that PUTs each record to an HTTP gateway.
pub struct HttpStorer {
    client: Client,
    config: SinkConfig,
}

impl HttpStorer {
    pub fn new(config: SinkConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Whether a response status counts as a stored record.
    pub fn accepts(&self, status: u16) -> bool {
        self.config.accept_statuses.contains(&status)
    }
}

#[async_trait]
impl Storer for HttpStorer {
    fn name(&self) -> &str {
        "http"
    }

    async fn store(
        &self,
        payload: serde_json::Value,
        fetch_id: &str,
    ) -> Result<serde_json::Value, StoreError> {
        let body = attach_fetch_id(payload, fetch_id);

        let mut request = self.client.put(&self.config.url).json(&body);
        if let Some(ref token) = self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();

        if !self.accepts(status) {
            warn!(fetch_id = %fetch_id, status, "Sink rejected record");
            return Err(StoreError::Rejected { status, body: text });
        }

        debug!(fetch_id = %fetch_id, status, "Record stored");
        Ok(json!({ "status": status, "body": text }))
    }
}

/// Attach the run id to a record before sending it.
///
/// Objects get a `fetch_id` field; any other value is wrapped.
pub fn attach_fetch_id(payload: serde_json::Value, fetch_id: &str) -> serde_json::Value {
    match payload {
        serde_json::Value::Object(mut map) => {
            map.insert("fetch_id".to_string(), json!(fetch_id));
            serde_json::Value::Object(map)
        }
        other => json!({ "fetch_id": fetch_id, "payload": other }),
    }
}
