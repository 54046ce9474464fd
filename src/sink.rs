pub mod astra;
pub mod memory;
pub mod opensearch;

pub use self::astra::{AstraConfig, AstraSink};
pub use self::memory::MemorySink;
pub use self::opensearch::{OpenSearchConfig, OpenSearchSink};

use std::time::Duration;

pub(crate) fn http_client(
    timeout: Duration,
    accept_invalid_certs: bool,
) -> crate::core::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()?;
    Ok(client)
}
