use crate::core::Progress;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber, filtered by `BULKLOAD_LOG`, then `RUST_LOG`,
/// then `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();
}

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("BULKLOAD_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Reports progress as tracing events.
pub struct LogProgress {
    label: String,
}

impl LogProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Progress for LogProgress {
    fn on_progress(&self, processed: u64, total: u64) {
        let percent = if total == 0 {
            100.0
        } else {
            processed as f64 * 100.0 / total as f64
        };
        info!(
            label = %self.label,
            processed,
            total,
            "{:.1}% records processed",
            percent
        );
    }
}
