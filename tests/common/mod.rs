#![allow(dead_code)]

use async_trait::async_trait;
use bulkload::{
    BatchResult, BulkOutcome, ItemFailure, PipelineError, Progress, Record, Result, Sink,
};
use serde_json::{Map, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub fn records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            let mut data = Map::new();
            data.insert("transactionId".to_string(), json!(format!("txn-{}", i)));
            data.insert("transactionType".to_string(), json!("SALE"));
            Record::new(format!("txn-{}", i), data)
        })
        .collect()
}

/// How a scripted backend answers one bulk call.
#[derive(Debug, Clone)]
pub enum Reply {
    Accept,
    /// The backend call itself errors out.
    Raise,
    /// Aggregate response naming fewer inserted identities than submitted.
    Inserted(usize),
    /// Itemized response with this many rejected items.
    Reject(usize),
}

/// Sink whose backend answers follow a script; unscripted calls are accepted.
#[derive(Debug, Default)]
pub struct ScriptedSink {
    replies: VecDeque<Reply>,
    pub calls: Vec<usize>,
    pub stored: u64,
}

impl ScriptedSink {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            calls: Vec::new(),
            stored: 0,
        }
    }

    pub fn always(reply: Reply, times: usize) -> Self {
        Self::new(std::iter::repeat_n(reply, times))
    }

    fn submit(&mut self, batch: &[Record]) -> Result<BulkOutcome> {
        match self.replies.pop_front().unwrap_or(Reply::Accept) {
            Reply::Accept => Ok(BulkOutcome::Aggregate {
                inserted: batch.len(),
            }),
            Reply::Raise => Err(PipelineError::Sink("connection reset by peer".to_string())),
            Reply::Inserted(n) => Ok(BulkOutcome::Aggregate { inserted: n }),
            Reply::Reject(k) => {
                let (ok, rejected) = batch.split_at(batch.len() - k.min(batch.len()));
                Ok(BulkOutcome::Itemized {
                    succeeded: ok.iter().map(|r| r.id.to_string()).collect(),
                    failed: rejected
                        .iter()
                        .map(|r| ItemFailure {
                            id: Some(r.id.to_string()),
                            status: 400,
                            reason: "mapper_parsing_exception".to_string(),
                        })
                        .collect(),
                })
            }
        }
    }
}

#[async_trait]
impl Sink for ScriptedSink {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn insert_batch(&mut self, batch: &[Record]) -> BatchResult {
        self.calls.push(batch.len());
        let result = match self.submit(batch) {
            Ok(outcome) => outcome.into_batch_result(batch.len()),
            Err(_) => BatchResult::failed(batch.len()),
        };
        self.stored += result.success_count;
        result
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.stored)
    }

    async fn delete_all(&mut self) -> Result<u64> {
        let removed = self.stored;
        self.stored = 0;
        Ok(removed)
    }
}

/// Keeps every progress update it receives.
#[derive(Clone, Default)]
pub struct RecordingProgress {
    pub updates: Arc<Mutex<Vec<(u64, u64)>>>,
}

impl RecordingProgress {
    pub fn updates(&self) -> Vec<(u64, u64)> {
        self.updates.lock().unwrap().clone()
    }
}

impl Progress for RecordingProgress {
    fn on_progress(&self, processed: u64, total: u64) {
        self.updates.lock().unwrap().push((processed, total));
    }
}
