//! `monitor` command implementation.
//!
//! Reads measurements as JSON lines from a file or stdin on a dedicated
//! thread, pushes them through the delivery pipeline and evaluates activity on
//! the process monotonic clock.
//!
//! A recorded file is replayed in full: the reader waits whenever the
//! pipeline is full. Stdin is treated as a live transport and drops the
//! newest measurement instead.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use contracts::{Clock, MonotonicClock};
use liveness::{
    build_registry, spawn_status_reporter, transforms_from_blueprint, DeliveryPipeline,
    DeliveryStats, MeasurementSender,
};
use tokio::sync::oneshot;
use tracing::{info, warn};

use super::{load_blueprint, parse_measurement_line, print_snapshot};
use crate::cli::MonitorArgs;

/// What the reader does when the delivery channel is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backpressure {
    /// Wait for room (recorded files)
    Block,
    /// Drop the newest measurement (live stdin)
    DropNewest,
}

/// Lines read and lines skipped by the input thread
#[derive(Debug, Default, Clone, Copy)]
struct FeedStats {
    lines: u64,
    malformed: u64,
    dropped: u64,
}

/// Execute the `monitor` command
pub async fn run_monitor(args: &MonitorArgs) -> Result<()> {
    let blueprint = load_blueprint(&args.config)?;

    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let registry = Arc::new(
        build_registry(&blueprint, clock, transforms_from_blueprint(&blueprint))
            .context("Failed to build sensors")?,
    );

    let pipeline = DeliveryPipeline::new(args.buffer_size);
    let sender = pipeline.sender();
    let delivery_metrics = pipeline.metrics();
    let delivery = pipeline.spawn(registry.clone());

    let (stop_tx, stop_rx) = oneshot::channel();
    let reporter = spawn_status_reporter(
        registry.clone(),
        Duration::from_millis(args.status_period_ms.max(1)),
        stop_rx,
    );

    info!(
        sensors = registry.len(),
        input = %input_label(args.input.as_deref()),
        "Monitoring started"
    );

    // The reader blocks on I/O; a detached thread never holds up shutdown.
    let (done_tx, done_rx) = oneshot::channel();
    let input = args.input.clone();
    thread::Builder::new()
        .name("measurement-reader".to_string())
        .spawn(move || {
            let _ = done_tx.send(feed(input, sender));
        })
        .context("Failed to spawn reader thread")?;

    let stats: DeliveryStats = tokio::select! {
        fed = done_rx => {
            let fed = fed.context("Reader thread exited unexpectedly")??;
            info!(
                lines = fed.lines,
                malformed = fed.malformed,
                dropped = fed.dropped,
                "Input exhausted"
            );
            delivery.await.context("Delivery task failed")?
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, shutting down");
            delivery.abort();
            delivery_metrics.snapshot()
        }
    };

    let _ = stop_tx.send(());
    reporter.await.context("Status reporter failed")?;

    println!("\n📋 Final snapshot");
    print_snapshot(&registry.snapshot());
    println!(
        "\n📦 Delivery: delivered={} dropped={} unique={} repeated={} invalid={} rejected={}",
        stats.delivered, stats.dropped, stats.unique, stats.repeated, stats.invalid, stats.rejected
    );

    Ok(())
}

fn input_label(input: Option<&Path>) -> String {
    match input {
        Some(p) if p != Path::new("-") => p.display().to_string(),
        _ => "stdin".to_string(),
    }
}

fn open_input(input: Option<PathBuf>) -> Result<(Box<dyn BufRead>, Backpressure)> {
    match input {
        Some(path) if path != Path::new("-") => {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Ok((Box::new(BufReader::new(file)), Backpressure::Block))
        }
        _ => Ok((Box::new(BufReader::new(io::stdin())), Backpressure::DropNewest)),
    }
}

/// Push every line into the pipeline; malformed lines are logged and skipped.
///
/// Dropping `sender` on return lets the delivery task drain and finish.
fn feed(input: Option<PathBuf>, sender: MeasurementSender) -> Result<FeedStats> {
    let (reader, backpressure) = open_input(input)?;
    feed_from(reader, &sender, backpressure)
}

fn feed_from(
    reader: impl BufRead,
    sender: &MeasurementSender,
    backpressure: Backpressure,
) -> Result<FeedStats> {
    let mut stats = FeedStats::default();
    for line in reader.lines() {
        let line = line.context("Failed to read input")?;
        stats.lines += 1;
        match parse_measurement_line(&line) {
            Ok(Some(m)) => {
                let queued = match backpressure {
                    Backpressure::Block => sender.deliver_blocking(m),
                    Backpressure::DropNewest => sender.deliver(m),
                };
                if !queued {
                    stats.dropped += 1;
                }
            }
            Ok(None) => {}
            Err(e) => {
                stats.malformed += 1;
                warn!(line = stats.lines, error = %e, "Skipping malformed line");
            }
        }
    }
    Ok(stats)
}
