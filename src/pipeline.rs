use crate::core::{NoProgress, Progress, Record, RunTotals, Sink};
use std::num::NonZeroUsize;
use tracing::debug;

/// Feeds records to a sink in fixed-size batches, one batch at a time.
///
/// A batch the sink rejects only shows up in the totals; later batches are
/// still attempted and nothing is retried.
pub struct BatchDriver {
    batch_size: NonZeroUsize,
    progress: Box<dyn Progress>,
}

impl BatchDriver {
    pub fn new(batch_size: NonZeroUsize) -> Self {
        Self {
            batch_size,
            progress: Box::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, progress: Box<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    pub async fn run<S>(&self, records: Vec<Record>, sink: &mut S) -> RunTotals
    where
        S: Sink + ?Sized,
    {
        let total = records.len() as u64;
        let mut totals = RunTotals::default();
        let mut buffer = Vec::with_capacity(self.batch_size.get());

        for record in records {
            buffer.push(record);
            if buffer.len() >= self.batch_size.get() {
                self.flush(&mut buffer, sink, &mut totals, total).await;
            }
        }

        // trailing partial batch
        if !buffer.is_empty() {
            self.flush(&mut buffer, sink, &mut totals, total).await;
        }

        totals
    }

    async fn flush<S>(
        &self,
        buffer: &mut Vec<Record>,
        sink: &mut S,
        totals: &mut RunTotals,
        total: u64,
    ) where
        S: Sink + ?Sized,
    {
        let result = sink.insert_batch(buffer.as_slice()).await;
        debug!(
            sink = sink.name(),
            batch = totals.batches + 1,
            size = buffer.len(),
            succeeded = result.success_count,
            failed = result.failure_count,
            "batch finished"
        );
        totals.record(&result);
        buffer.clear();
        self.progress.on_progress(totals.processed(), total);
    }
}

/// Runs one ingestion pass without progress reporting.
pub async fn run<S>(records: Vec<Record>, sink: &mut S, batch_size: NonZeroUsize) -> RunTotals
where
    S: Sink + ?Sized,
{
    BatchDriver::new(batch_size).run(records, sink).await
}
