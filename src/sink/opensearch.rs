//! Search-index sink over the `_bulk` API.
//!
//! Every item in a bulk response carries its own status, so partial
//! rejections are counted one by one.

use crate::core::{BatchResult, BulkOutcome, ItemFailure, PipelineError, Record, Result, Sink};
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct OpenSearchConfig {
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub index: String,
    pub verify_tls: bool,
    pub timeout: Duration,
}

impl OpenSearchConfig {
    pub fn new(host: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: None,
            password: None,
            index: index.into(),
            verify_tls: false,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.host.trim_end_matches('/'), path)
    }
}

pub struct OpenSearchSink {
    config: OpenSearchConfig,
    client: reqwest::Client,
}

impl OpenSearchSink {
    pub fn new(config: OpenSearchConfig) -> Result<Self> {
        if config.host.is_empty() || config.index.is_empty() {
            return Err(PipelineError::Config(
                "search host and index are required".to_string(),
            ));
        }
        let client = super::http_client(config.timeout, !config.verify_tls)?;
        Ok(Self { config, client })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.username {
            Some(username) => request.basic_auth(username, self.config.password.as_ref()),
            None => request,
        }
    }

    /// Sends a request; `Ok(None)` when the index does not exist.
    async fn send(&self, request: RequestBuilder) -> Result<Option<Value>> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        Ok(Some(response.json().await?))
    }

    async fn submit(&self, batch: &[Record]) -> Result<BulkOutcome> {
        let body = bulk_body(&self.config.index, batch)?;
        let request = self
            .client
            .post(self.config.url("_bulk"))
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body);

        match self.send(request).await? {
            Some(response) => decode_bulk(&response),
            None => Err(PipelineError::Sink("bulk endpoint not found".to_string())),
        }
    }
}

#[async_trait]
impl Sink for OpenSearchSink {
    fn name(&self) -> &str {
        "opensearch"
    }

    async fn insert_batch(&mut self, batch: &[Record]) -> BatchResult {
        match self.submit(batch).await {
            Ok(outcome) => {
                if let BulkOutcome::Itemized { failed, .. } = &outcome {
                    for failure in failed {
                        debug!(
                            index = %self.config.index,
                            id = ?failure.id,
                            status = failure.status,
                            reason = %failure.reason,
                            "bulk item rejected"
                        );
                    }
                }
                outcome.into_batch_result(batch.len())
            }
            Err(e) => {
                warn!(
                    index = %self.config.index,
                    size = batch.len(),
                    error = %e,
                    "bulk request failed, counting batch as failed"
                );
                BatchResult::failed(batch.len())
            }
        }
    }

    async fn count(&self) -> Result<u64> {
        let index = &self.config.index;
        let refresh = self.client.post(self.config.url(&format!("{}/_refresh", index)));
        if self.send(refresh).await?.is_none() {
            return decode_count(None);
        }

        let request = self.client.get(self.config.url(&format!("{}/_count", index)));
        let response = self.send(request).await?;
        decode_count(response.as_ref())
    }

    async fn delete_all(&mut self) -> Result<u64> {
        let request = self
            .client
            .post(self.config.url(&format!(
                "{}/_delete_by_query?refresh=true",
                self.config.index
            )))
            .json(&json!({ "query": { "match_all": {} } }));

        let response = self.send(request).await?;
        decode_deleted(response.as_ref())
    }
}

/// Reads a `_count` response; `None` is a missing index, which holds nothing.
pub fn decode_count(response: Option<&Value>) -> Result<u64> {
    match response {
        Some(response) => response
            .get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| PipelineError::Sink("_count response has no count".to_string())),
        None => Ok(0),
    }
}

/// Reads a `_delete_by_query` response; `None` is a missing index.
pub fn decode_deleted(response: Option<&Value>) -> Result<u64> {
    match response {
        Some(response) => response.get("deleted").and_then(Value::as_u64).ok_or_else(|| {
            PipelineError::Sink("_delete_by_query response has no deleted count".to_string())
        }),
        None => Ok(0),
    }
}

/// One `create` action per record, so an existing identity is rejected
/// instead of overwritten.
pub fn bulk_body(index: &str, batch: &[Record]) -> Result<String> {
    let mut body = String::new();
    for record in batch {
        let action = json!({ "create": { "_index": index, "_id": record.id.to_string() } });
        body.push_str(&serde_json::to_string(&action)?);
        body.push('\n');
        body.push_str(&serde_json::to_string(&record.data)?);
        body.push('\n');
    }
    Ok(body)
}

/// Splits a `_bulk` response into accepted and rejected items.
pub fn decode_bulk(response: &Value) -> Result<BulkOutcome> {
    let items = response
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| PipelineError::Sink("bulk response has no items".to_string()))?;

    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    for item in items {
        // each item is keyed by its action name
        let Some(result) = item.as_object().and_then(|obj| obj.values().next()) else {
            failed.push(ItemFailure {
                id: None,
                status: 0,
                reason: "malformed bulk item".to_string(),
            });
            continue;
        };

        let id = result.get("_id").and_then(Value::as_str).map(str::to_string);
        let status = result.get("status").and_then(Value::as_u64).unwrap_or(0) as u16;
        if (200..300).contains(&status) && result.get("error").is_none() {
            succeeded.push(id.unwrap_or_default());
        } else {
            let reason = result
                .get("error")
                .map(|error| {
                    error
                        .get("reason")
                        .or_else(|| error.get("type"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| error.to_string())
                })
                .unwrap_or_else(|| format!("status {}", status));
            failed.push(ItemFailure { id, status, reason });
        }
    }

    Ok(BulkOutcome::Itemized { succeeded, failed })
}
