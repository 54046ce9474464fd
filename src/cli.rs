use crate::core::{DEFAULT_ENVELOPE, DEFAULT_ID_FIELD};
use crate::sink::astra::DEFAULT_KEYSPACE;
use crate::sink::{AstraConfig, OpenSearchConfig};
use clap::{Parser, Subcommand, ValueEnum};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "bulkload", about = "Load records into a storage backend in batches")]
pub struct Cli {
    /// Action to perform
    #[arg(long, value_enum, global = true, default_value_t = Action::Insert)]
    pub action: Action,

    /// Records to insert (required for insert)
    #[arg(long, global = true, env = "SAMPLE_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    #[arg(long, value_enum, global = true, env = "BULKLOAD_FORMAT", default_value_t = InputFormat::Json)]
    pub format: InputFormat,

    /// Field holding each record's unique identity
    #[arg(long, global = true, env = "BULKLOAD_ID_FIELD", default_value = DEFAULT_ID_FIELD)]
    pub id_field: String,

    /// Key wrapping each record's payload; empty for unwrapped records
    #[arg(long, global = true, env = "BULKLOAD_ENVELOPE", default_value = DEFAULT_ENVELOPE)]
    pub envelope: String,

    /// Per-request timeout against the backend
    #[arg(long, global = true, env = "BULKLOAD_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub backend: Backend,
}

impl Cli {
    pub fn envelope(&self) -> Option<String> {
        if self.envelope.is_empty() {
            None
        } else {
            Some(self.envelope.clone())
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    Insert,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// One JSON array holding every record
    Json,
    /// One JSON record per line
    Jsonl,
}

#[derive(Debug, Subcommand)]
pub enum Backend {
    /// JSON document API collection
    Astra(AstraArgs),
    /// OpenSearch index
    Opensearch(OpenSearchArgs),
}

impl Backend {
    /// Only `insert` needs one; `None` when the backend has no default.
    pub fn batch_size(&self) -> Option<NonZeroUsize> {
        match self {
            Backend::Astra(args) => args.batch_size,
            Backend::Opensearch(args) => Some(args.batch_size),
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct AstraArgs {
    #[arg(long, env = "ASTRA_API_ENDPOINT")]
    pub api_endpoint: String,

    #[arg(long, env = "ASTRA_TOKEN", hide_env_values = true)]
    pub token: String,

    #[arg(long, env = "ASTRA_COLLECTION")]
    pub collection: String,

    #[arg(long, env = "ASTRA_KEYSPACE", default_value = DEFAULT_KEYSPACE)]
    pub keyspace: String,

    #[arg(long, env = "ASTRA_BATCH_SIZE")]
    pub batch_size: Option<NonZeroUsize>,
}

impl AstraArgs {
    pub fn config(&self, timeout: Duration) -> AstraConfig {
        AstraConfig::new(&self.api_endpoint, &self.token, &self.collection)
            .with_keyspace(&self.keyspace)
            .with_timeout(timeout)
    }
}

#[derive(Debug, clap::Args)]
pub struct OpenSearchArgs {
    #[arg(long, env = "OPENSEARCH_HOST")]
    pub host: String,

    #[arg(long, env = "OPENSEARCH_USERNAME")]
    pub username: Option<String>,

    #[arg(long, env = "OPENSEARCH_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(long, env = "OPENSEARCH_INDEX")]
    pub index: String,

    #[arg(long, env = "OPENSEARCH_BATCH_SIZE", default_value = "100")]
    pub batch_size: NonZeroUsize,

    /// Verify the cluster's TLS certificate
    #[arg(long, env = "OPENSEARCH_VERIFY_SSL")]
    pub verify_ssl: bool,
}

impl OpenSearchArgs {
    pub fn config(&self, timeout: Duration) -> OpenSearchConfig {
        let config = OpenSearchConfig::new(&self.host, &self.index)
            .with_verify_tls(self.verify_ssl)
            .with_timeout(timeout);
        match &self.username {
            Some(username) => {
                config.with_credentials(username, self.password.clone().unwrap_or_default())
            }
            None => config,
        }
    }
}
