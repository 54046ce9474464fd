use crate::core::{BatchResult, BulkOutcome, ItemFailure, Record, RecordId, Result, Sink};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Process-local collection keyed by record identity.
///
/// Reports per item like a search index would: a record whose identity is
/// already stored is rejected and the rest of the batch still lands.
#[derive(Debug, Default)]
pub struct MemorySink {
    documents: HashMap<RecordId, Map<String, Value>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &RecordId) -> Option<&Map<String, Value>> {
        self.documents.get(id)
    }

    fn apply(&mut self, batch: &[Record]) -> BulkOutcome {
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for record in batch {
            if self.documents.contains_key(&record.id) {
                failed.push(ItemFailure {
                    id: Some(record.id.to_string()),
                    status: 409,
                    reason: "document already exists".to_string(),
                });
            } else {
                self.documents.insert(record.id.clone(), record.data.clone());
                succeeded.push(record.id.to_string());
            }
        }
        BulkOutcome::Itemized { succeeded, failed }
    }
}

#[async_trait]
impl Sink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert_batch(&mut self, batch: &[Record]) -> BatchResult {
        self.apply(batch).into_batch_result(batch.len())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.documents.len() as u64)
    }

    async fn delete_all(&mut self) -> Result<u64> {
        let removed = self.documents.len() as u64;
        self.documents.clear();
        Ok(removed)
    }
}
