pub mod file;

use crate::core::{PipelineError, Record, Result, Source};
use futures::TryStreamExt;

pub use self::file::{JsonArraySource, JsonLinesSource};

/// Drains a source completely.
///
/// Ingestion starts only after this returns, so a malformed input aborts the
/// run before any batch reaches a sink. Every failure comes back as
/// `PipelineError::Source`.
pub async fn load_all(source: &dyn Source) -> Result<Vec<Record>> {
    let stream = source.read().await.map_err(source_failure)?;
    let records: Vec<Record> = stream.try_collect().await.map_err(source_failure)?;
    source.close().await.map_err(source_failure)?;
    Ok(records)
}

fn source_failure(error: PipelineError) -> PipelineError {
    match error {
        wrapped @ PipelineError::Source(_) => wrapped,
        other => PipelineError::Source(anyhow::Error::new(other)),
    }
}
