//! Document-API collection sink.
//!
//! The bulk insert only tells us which identities it stored, so partial
//! rejections are derived from the gap between that list and the request.

use crate::core::{BatchResult, BulkOutcome, PipelineError, Record, Result, Sink};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_KEYSPACE: &str = "default_keyspace";
/// Largest `insertMany` the document API accepts in one request.
pub const MAX_DOCUMENTS_PER_REQUEST: usize = 100;

#[derive(Debug, Clone)]
pub struct AstraConfig {
    pub api_endpoint: String,
    pub token: String,
    pub keyspace: String,
    pub collection: String,
    pub timeout: Duration,
}

impl AstraConfig {
    pub fn new(
        api_endpoint: impl Into<String>,
        token: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            api_endpoint: api_endpoint.into(),
            token: token.into(),
            keyspace: DEFAULT_KEYSPACE.to_string(),
            collection: collection.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = keyspace.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn keyspace_url(&self) -> String {
        format!(
            "{}/api/json/v1/{}",
            self.api_endpoint.trim_end_matches('/'),
            self.keyspace
        )
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.keyspace_url(), self.collection)
    }
}

pub struct AstraSink {
    config: AstraConfig,
    client: reqwest::Client,
    chunk_size: usize,
}

impl AstraSink {
    pub fn new(config: AstraConfig) -> Result<Self> {
        if config.api_endpoint.is_empty() || config.collection.is_empty() {
            return Err(PipelineError::Config(
                "document API endpoint and collection are required".to_string(),
            ));
        }
        let client = super::http_client(config.timeout, false)?;
        Ok(Self {
            config,
            client,
            chunk_size: MAX_DOCUMENTS_PER_REQUEST,
        })
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, MAX_DOCUMENTS_PER_REQUEST);
        self
    }

    /// Creates the collection if it does not exist yet.
    pub async fn ensure_collection(&self) -> Result<()> {
        let body = json!({ "createCollection": { "name": self.config.collection } });
        self.command(&self.config.keyspace_url(), &body).await?;
        info!(collection = %self.config.collection, "collection ready");
        Ok(())
    }

    async fn command(&self, url: &str, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .header("Token", &self.config.token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    async fn submit(&self, chunk: &[Record]) -> Result<BulkOutcome> {
        let documents: Vec<Value> = chunk
            .iter()
            .map(|record| Value::Object(record.document("_id")))
            .collect();
        let body = json!({
            "insertMany": {
                "documents": documents,
                "options": { "ordered": false }
            }
        });

        let response = self.command(&self.config.collection_url(), &body).await?;
        decode_insert_many(&response)
    }

    async fn count_documents(&self) -> Result<u64> {
        let body = json!({ "countDocuments": {} });
        let response = self.command(&self.config.collection_url(), &body).await?;
        let counted = decode_count(&response)?;
        if counted.more_data {
            warn!(
                collection = %self.config.collection,
                "count exceeds the backend's counting limit, reported value is a lower bound"
            );
        }
        Ok(counted.count)
    }
}

#[async_trait]
impl Sink for AstraSink {
    fn name(&self) -> &str {
        "astra"
    }

    async fn insert_batch(&mut self, batch: &[Record]) -> BatchResult {
        let mut result = BatchResult::default();
        for chunk in batch.chunks(self.chunk_size) {
            result += match self.submit(chunk).await {
                Ok(outcome) => outcome.into_batch_result(chunk.len()),
                Err(e) => {
                    warn!(
                        collection = %self.config.collection,
                        size = chunk.len(),
                        error = %e,
                        "insertMany failed, counting chunk as failed"
                    );
                    BatchResult::failed(chunk.len())
                }
            };
        }
        result
    }

    async fn count(&self) -> Result<u64> {
        self.count_documents().await
    }

    async fn delete_all(&mut self) -> Result<u64> {
        let before = self.count_documents().await?;
        let this: &Self = self;
        let url = this.config.collection_url();
        let body = json!({ "deleteMany": {} });
        let (url, body) = (&url, &body);
        delete_pages(before, move || this.command(url, body)).await
    }
}

/// Result of a `countDocuments` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentCount {
    pub count: u64,
    /// The backend stopped counting at its limit.
    pub more_data: bool,
}

/// Result of one `deleteMany` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStep {
    /// The whole collection was truncated without a count.
    Truncated,
    Deleted { count: u64, more_data: bool },
}

pub fn decode_count(response: &Value) -> Result<DocumentCount> {
    let status = status_of(response)?;
    let count = status
        .get("count")
        .and_then(Value::as_u64)
        .ok_or_else(|| PipelineError::Sink("countDocuments response has no count".to_string()))?;
    Ok(DocumentCount {
        count,
        more_data: more_data(status),
    })
}

pub fn decode_delete_many(response: &Value) -> Result<DeleteStep> {
    let status = status_of(response)?;
    match status.get("deletedCount").and_then(Value::as_i64) {
        Some(-1) => Ok(DeleteStep::Truncated),
        Some(n) if n >= 0 => Ok(DeleteStep::Deleted {
            count: n as u64,
            more_data: more_data(status),
        }),
        _ => Err(PipelineError::Sink(
            "deleteMany response has no deletedCount".to_string(),
        )),
    }
}

/// Issues `deleteMany` until the backend has nothing left.
///
/// `before` is the count read ahead of the delete. Nothing is sent when it is
/// zero, and it stands in for the removed count after a truncate.
async fn delete_pages<F, Fut>(before: u64, mut delete_many: F) -> Result<u64>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    if before == 0 {
        return Ok(0);
    }

    let mut deleted = 0u64;
    loop {
        match decode_delete_many(&delete_many().await?)? {
            DeleteStep::Truncated => return Ok(before),
            DeleteStep::Deleted { count, more_data } => {
                deleted += count;
                if !more_data {
                    return Ok(deleted);
                }
                debug!(deleted, "deleteMany has more data, repeating");
            }
        }
    }
}

fn more_data(status: &Value) -> bool {
    status.get("moreData").and_then(Value::as_bool) == Some(true)
}

fn status_of(response: &Value) -> Result<&Value> {
    response.get("status").ok_or_else(|| {
        PipelineError::Sink(format!(
            "response has no status: {}",
            error_messages(response)
        ))
    })
}

fn error_messages(response: &Value) -> String {
    match response.get("errors").and_then(Value::as_array) {
        Some(errors) if !errors.is_empty() => errors
            .iter()
            .map(|e| {
                e.get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => "no error detail".to_string(),
    }
}

/// Reads the stored identities out of an `insertMany` response.
///
/// Item errors next to a status only lower the inserted count. A response
/// without a status means nothing was stored.
pub fn decode_insert_many(response: &Value) -> Result<BulkOutcome> {
    let inserted = status_of(response)?
        .get("insertedIds")
        .and_then(Value::as_array)
        .ok_or_else(|| PipelineError::Sink("insertMany response has no insertedIds".to_string()))?
        .len();

    if response.get("errors").is_some() {
        debug!(inserted, errors = %error_messages(response), "insertMany partially rejected");
    }
    Ok(BulkOutcome::Aggregate { inserted })
}
