use crate::core::{BatchResult, Record, Result};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

pub type RecordStream = Pin<Box<dyn Stream<Item = Result<Record>> + Send>>;

#[async_trait]
pub trait Source: Send + Sync {
    async fn read(&self) -> Result<RecordStream>;

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A storage backend records are loaded into.
///
/// `insert_batch` never fails as a call: anything the backend rejects, whether
/// one item or the whole request, ends up in the returned counts.
#[async_trait]
pub trait Sink: Send + Sync {
    fn name(&self) -> &str;

    async fn insert_batch(&mut self, batch: &[Record]) -> BatchResult;

    /// Number of records currently persisted.
    async fn count(&self) -> Result<u64>;

    /// Removes every persisted record and returns how many were removed.
    async fn delete_all(&mut self) -> Result<u64>;
}

pub trait Progress: Send + Sync {
    fn on_progress(&self, processed: u64, total: u64);
}

pub struct NoProgress;

impl Progress for NoProgress {
    fn on_progress(&self, _processed: u64, _total: u64) {}
}
