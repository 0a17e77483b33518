//! HTTP record source.

use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::SourceConfig;
use crate::cycle::{FetchBatch, FetchError, FetchStream, Getter};

/// Getter that pulls one tenant's records from an HTTP endpoint.
///
/// The request is only sent once the returned stream is first polled.
pub struct HttpGetter {
    client: Client,
    config: SourceConfig,
    tenant_id: String,
}

impl HttpGetter {
    /// Create a getter for `tenant_id` against the configured source.
    pub fn new(config: SourceConfig, tenant_id: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            tenant_id: tenant_id.into(),
        })
    }

    async fn fetch_records(
        client: Client,
        config: SourceConfig,
        tenant_id: String,
    ) -> Result<Vec<serde_json::Value>, FetchError> {
        debug!(url = %config.url, tenant_id = %tenant_id, "Requesting records");

        let mut request = client
            .get(&config.url)
            .query(&[("tenant_id", tenant_id.as_str())]);
        if let Some(ref token) = config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                url = %config.url,
                status = status.as_u16(),
                "Source returned error status"
            );
            return Err(FetchError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        let records = extract_records(body)?;

        info!(
            tenant_id = %tenant_id,
            records = records.len(),
            "Fetched records from source"
        );
        Ok(records)
    }
}

impl Getter for HttpGetter {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self) -> FetchStream {
        let request = Self::fetch_records(
            self.client.clone(),
            self.config.clone(),
            self.tenant_id.clone(),
        );

        stream::once(request)
            .flat_map(|result| match result {
                Ok(records) => {
                    stream::iter(records.into_iter().map(|r| Ok(FetchBatch::single(r)))).boxed()
                }
                Err(e) => stream::iter(vec![Err(e)]).boxed(),
            })
            .boxed()
    }
}

/// Turn a source response body into records.
///
/// Accepts a bare JSON array or an object with a `records` array.
pub fn extract_records(body: serde_json::Value) -> Result<Vec<serde_json::Value>, FetchError> {
    match body {
        serde_json::Value::Array(records) => Ok(records),
        serde_json::Value::Object(mut map) => match map.remove("records") {
            Some(serde_json::Value::Array(records)) => Ok(records),
            Some(_) => Err(FetchError::Decode(
                "`records` field is not an array".to_string(),
            )),
            None => Err(FetchError::Decode(
                "object body has no `records` field".to_string(),
            )),
        },
        other => Err(FetchError::Decode(format!(
            "expected array or object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
