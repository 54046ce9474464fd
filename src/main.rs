use anyhow::Context;
use bulkload::app;
use bulkload::cli::{Action, Backend, Cli, InputFormat};
use bulkload::logging::{LogProgress, init_tracing};
use bulkload::sink::{AstraSink, OpenSearchSink};
use bulkload::source::{JsonArraySource, JsonLinesSource};
use bulkload::{Sink, Source};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut sink: Box<dyn Sink> = match &cli.backend {
        Backend::Astra(args) => {
            let sink = AstraSink::new(args.config(cli.timeout()))?;
            sink.ensure_collection()
                .await
                .context("initializing document API collection")?;
            Box::new(sink)
        }
        Backend::Opensearch(args) => Box::new(OpenSearchSink::new(args.config(cli.timeout()))?),
    };

    match cli.action {
        Action::Delete => {
            let deleted = app::delete(sink.as_mut()).await?;
            println!("Deleted {} records from {}", deleted, sink.name());
        }
        Action::Insert => {
            let path = cli
                .data_file
                .clone()
                .context("--data-file or SAMPLE_DATA_FILE is required for insert")?;
            let batch_size = cli
                .backend
                .batch_size()
                .context("--batch-size or ASTRA_BATCH_SIZE is required for insert")?;
            let source: Box<dyn Source> = match cli.format {
                InputFormat::Json => Box::new(
                    JsonArraySource::new(&path)
                        .with_id_field(&cli.id_field)
                        .with_envelope(cli.envelope()),
                ),
                InputFormat::Jsonl => Box::new(
                    JsonLinesSource::new(&path)
                        .with_id_field(&cli.id_field)
                        .with_envelope(cli.envelope()),
                ),
            };

            let report = app::insert(
                source.as_ref(),
                sink.as_mut(),
                batch_size,
                Box::new(LogProgress::new("Inserting records")),
            )
            .await
            .with_context(|| format!("reading {}", path.display()))?;

            println!("Insertion complete:");
            println!("Successfully inserted: {}", report.totals.success_count);
            println!("Failed insertions: {}", report.totals.failure_count);
            match report.observed {
                Some(count) => println!("Verification: found {} records in {}", count, sink.name()),
                None => println!("Verification: count unavailable"),
            }
        }
    }

    Ok(())
}
