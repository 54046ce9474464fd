use crate::core::{Progress, Result, RunTotals, Sink, Source};
use crate::pipeline::BatchDriver;
use crate::source::load_all;
use crate::verify::{Reconciliation, verify};
use serde::Serialize;
use std::num::NonZeroUsize;
use tracing::{error, info};

/// What an insert run reports to the operator.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub totals: RunTotals,
    /// `None` when the count query itself failed.
    pub observed: Option<u64>,
}

impl RunReport {
    pub fn reconciliation(&self) -> Option<Reconciliation> {
        self.observed
            .map(|observed| Reconciliation::new(&self.totals, observed))
    }
}

/// Loads the source, ingests it in batches, then asks the sink for its count.
///
/// Only a source failure ends the run early. Rejected batches and a failed
/// verification are reflected in the report.
pub async fn insert(
    source: &dyn Source,
    sink: &mut dyn Sink,
    batch_size: NonZeroUsize,
    progress: Box<dyn Progress>,
) -> Result<RunReport> {
    let records = load_all(source).await?;
    info!(
        sink = sink.name(),
        records = records.len(),
        batch_size = batch_size.get(),
        "starting batch insertion"
    );

    let driver = BatchDriver::new(batch_size).with_progress(progress);
    let totals = driver.run(records, &mut *sink).await;
    info!(
        sink = sink.name(),
        succeeded = totals.success_count,
        failed = totals.failure_count,
        batches = totals.batches,
        "insertion complete"
    );

    let observed = match verify(&*sink).await {
        Ok(count) => {
            let reconciliation = Reconciliation::new(&totals, count);
            reconciliation.log(sink.name());
            Some(count)
        }
        Err(e) => {
            error!(sink = sink.name(), error = %e, "verification failed");
            None
        }
    };

    Ok(RunReport { totals, observed })
}

pub async fn delete(sink: &mut dyn Sink) -> Result<u64> {
    info!(sink = sink.name(), "deleting all records");
    let deleted = sink.delete_all().await?;
    info!(sink = sink.name(), deleted, "delete complete");
    Ok(deleted)
}
