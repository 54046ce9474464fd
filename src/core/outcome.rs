use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Per-batch tally. `success_count + failure_count` equals the batch size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub success_count: u64,
    pub failure_count: u64,
}

impl BatchResult {
    pub fn new(success_count: u64, failure_count: u64) -> Self {
        Self {
            success_count,
            failure_count,
        }
    }

    /// A batch that could not be delivered at all.
    pub fn failed(len: usize) -> Self {
        Self::new(0, len as u64)
    }

    pub fn total(&self) -> u64 {
        self.success_count + self.failure_count
    }
}

impl AddAssign for BatchResult {
    fn add_assign(&mut self, rhs: Self) {
        self.success_count += rhs.success_count;
        self.failure_count += rhs.failure_count;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    pub success_count: u64,
    pub failure_count: u64,
    pub batches: u64,
}

impl RunTotals {
    pub fn record(&mut self, result: &BatchResult) {
        self.success_count += result.success_count;
        self.failure_count += result.failure_count;
        self.batches += 1;
    }

    pub fn processed(&self) -> u64 {
        self.success_count + self.failure_count
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub id: Option<String>,
    pub status: u16,
    pub reason: String,
}

/// What a backend reported for one bulk write, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    /// The backend only says how many records it took.
    Aggregate { inserted: usize },
    /// The backend reports every item on its own.
    Itemized {
        succeeded: Vec<String>,
        failed: Vec<ItemFailure>,
    },
}

impl BulkOutcome {
    pub fn into_batch_result(self, batch_len: usize) -> BatchResult {
        match self {
            BulkOutcome::Aggregate { inserted } => {
                let inserted = inserted.min(batch_len);
                BatchResult::new(inserted as u64, (batch_len - inserted) as u64)
            }
            BulkOutcome::Itemized { succeeded, failed } => {
                debug_assert!(
                    succeeded.len() + failed.len() <= batch_len,
                    "backend reported {} items for a batch of {}",
                    succeeded.len() + failed.len(),
                    batch_len
                );
                // items the backend did not mention are counted as failed
                let succeeded = succeeded.len().min(batch_len);
                BatchResult::new(succeeded as u64, (batch_len - succeeded) as u64)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_failure(id: &str) -> ItemFailure {
        ItemFailure {
            id: Some(id.to_string()),
            status: 409,
            reason: "version_conflict_engine_exception".to_string(),
        }
    }

    #[test]
    fn aggregate_outcome_attributes_remainder_to_failures() {
        let result = BulkOutcome::Aggregate { inserted: 7 }.into_batch_result(10);
        assert_eq!(result, BatchResult::new(7, 3));

        let clamped = BulkOutcome::Aggregate { inserted: 12 }.into_batch_result(10);
        assert_eq!(clamped, BatchResult::new(10, 0));
    }

    #[test]
    fn itemized_outcome_counts_reported_failures() {
        let outcome = BulkOutcome::Itemized {
            succeeded: (0..7).map(|i| i.to_string()).collect(),
            failed: vec![item_failure("7"), item_failure("8"), item_failure("9")],
        };
        assert_eq!(outcome.into_batch_result(10), BatchResult::new(7, 3));
    }

    #[test]
    fn itemized_outcome_with_missing_items_keeps_invariant() {
        let outcome = BulkOutcome::Itemized {
            succeeded: vec!["a".to_string()],
            failed: vec![],
        };
        let result = outcome.into_batch_result(4);
        assert_eq!(result, BatchResult::new(1, 3));
        assert_eq!(result.total(), 4);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "reported 3 items for a batch of 2")]
    fn itemized_outcome_larger_than_batch_is_caught() {
        let outcome = BulkOutcome::Itemized {
            succeeded: vec!["a".to_string(), "b".to_string()],
            failed: vec![item_failure("c")],
        };
        outcome.into_batch_result(2);
    }

    #[test]
    fn run_totals_accumulate_batches() {
        let mut totals = RunTotals::default();
        totals.record(&BatchResult::new(100, 0));
        totals.record(&BatchResult::new(98, 2));
        totals.record(&BatchResult::failed(50));

        assert_eq!(totals.success_count, 198);
        assert_eq!(totals.failure_count, 52);
        assert_eq!(totals.batches, 3);
        assert_eq!(totals.processed(), 250);
    }

    #[test]
    fn batch_results_add() {
        let mut sum = BatchResult::default();
        sum += BatchResult::new(3, 1);
        sum += BatchResult::new(2, 0);
        assert_eq!(sum, BatchResult::new(5, 1));
    }
}
