//! `write` command implementation.

use std::future::Future;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::MetricRecord;
use dispatcher::{MetricOutput, PoolFactory};
use observability::WriteMetricsAggregator;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use crate::cli::WriteArgs;
use crate::error::CliError;

/// Counters for one `write` run
#[derive(Debug, Default)]
struct RelaySummary {
    batches: WriteMetricsAggregator,
    /// Lines that were not valid records
    skipped_lines: u64,
}

/// Execute the `write` command
pub async fn run_write(args: &WriteArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");
    let blueprint = super::load_config(&args.config)?;
    for warning in config_loader::collect_warnings(&blueprint) {
        warn!(%warning, "Configuration warning");
    }

    info!(
        database = %blueprint.output.database,
        endpoints = blueprint.output.endpoint_urls().len(),
        "Configuration loaded"
    );

    let output = MetricOutput::from_config(blueprint.output).context("Failed to resolve endpoints")?;
    output.connect().await.context("Failed to connect output")?;
    info!(pool_size = output.pool_size().await, "Output connected");

    let reader = open_input(&args.input).await?;
    let batch_size = usize::try_from(args.batch_size).unwrap_or(usize::MAX);
    let mut summary = RelaySummary::default();

    let relayed = relay(
        &output,
        reader,
        &args.input,
        batch_size,
        &mut summary,
        shutdown_signal(),
    )
    .await;

    // close even when the input failed
    if let Err(e) = output.close().await {
        warn!(error = %e, "Failed to close output cleanly");
    }
    relayed?;

    print_summary(&summary);

    let stats = summary.batches.summary();
    if stats.failed_batches > 0 {
        return Err(CliError::WriteFailed {
            failed: stats.failed_batches,
            total: stats.total_batches,
        }
        .into());
    }

    info!("Metric Relay finished");
    Ok(())
}

async fn open_input(input: &str) -> Result<Box<dyn AsyncBufRead + Unpin + Send>, CliError> {
    if input == "-" {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let file = tokio::fs::File::open(input)
        .await
        .map_err(|e| CliError::input(input, e))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Read JSON-lines records and write them in batches of `batch_size`
///
/// Malformed lines are skipped; a failed batch is counted and the run
/// continues with the next one. When `shutdown` resolves, reading stops and
/// the records already buffered are written before returning.
async fn relay<F, R, S>(
    output: &MetricOutput<F>,
    reader: R,
    input: &str,
    batch_size: usize,
    summary: &mut RelaySummary,
    shutdown: S,
) -> Result<(), CliError>
where
    F: PoolFactory,
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = reader.lines();
    let mut batch = Vec::with_capacity(batch_size.min(4096));
    let mut line_no = 0u64;
    tokio::pin!(shutdown);

    loop {
        let next = tokio::select! {
            next = lines.next_line() => next.map_err(|e| CliError::input(input, e))?,
            () = &mut shutdown => {
                warn!(buffered = batch.len(), "Received shutdown signal, flushing buffered records");
                break;
            }
        };
        let Some(line) = next else {
            break;
        };
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<MetricRecord>(line) {
            Ok(record) => batch.push(record),
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping malformed record");
                summary.skipped_lines += 1;
                continue;
            }
        }

        if batch.len() >= batch_size {
            write_batch(output, &batch, summary).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        write_batch(output, &batch, summary).await;
    }
    Ok(())
}

async fn write_batch<F: PoolFactory>(
    output: &MetricOutput<F>,
    records: &[MetricRecord],
    summary: &mut RelaySummary,
) {
    let start = Instant::now();
    let result = output.write(records).await;
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(report) => {
            let endpoint = report.endpoint.as_deref().unwrap_or("-");
            info!(
                endpoint,
                points = report.points,
                attempts = report.attempts,
                "Batch written"
            );
            summary
                .batches
                .record_success(endpoint, report.points, report.attempts, latency_ms);
        }
        Err(e) => {
            error!(records = records.len(), error = %e, "Batch failed");
            summary.batches.record_failure(latency_ms);
        }
    }
}

fn print_summary(summary: &RelaySummary) {
    println!();
    print!("{}", summary.batches.summary());
    if summary.skipped_lines > 0 {
        println!("Skipped lines: {}", summary.skipped_lines);
    }
    println!();
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
