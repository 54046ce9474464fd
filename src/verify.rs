use crate::core::{Result, RunTotals, Sink};
use serde::Serialize;
use tracing::{info, warn};

/// Asks the sink how many records it holds.
pub async fn verify<S>(sink: &S) -> Result<u64>
where
    S: Sink + ?Sized,
{
    sink.count().await
}

/// Expected versus observed record count after a run.
///
/// A mismatch is normal when earlier runs left records behind or rejected
/// items; it is reported, never enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub expected: u64,
    pub observed: u64,
}

impl Reconciliation {
    pub fn new(totals: &RunTotals, observed: u64) -> Self {
        Self {
            expected: totals.success_count,
            observed,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.expected == self.observed
    }

    /// Positive when the sink holds more than this run inserted.
    pub fn drift(&self) -> i64 {
        self.observed as i64 - self.expected as i64
    }

    pub fn log(&self, sink: &str) {
        if self.is_consistent() {
            info!(sink, count = self.observed, "verification matches inserted records");
        } else {
            warn!(
                sink,
                expected = self.expected,
                observed = self.observed,
                drift = self.drift(),
                "verification count differs from inserted records"
            );
        }
    }
}
