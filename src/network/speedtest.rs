//! Sequential speed-test batches over a set of registries.
//!
//! One background task probes each registry in turn and pushes a sample
//! onto the progress channel as soon as it completes, so the UI can fill
//! in results incrementally. Sequential on purpose: with at most a few
//! dozen mirrors, total batch time is bounded by the sum of per-probe
//! timeouts and nothing competes for bandwidth during timing.

use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::network::probe;

/// Result of probing a single registry.
#[derive(Debug, Clone)]
pub struct SpeedSample {
    pub name: String,
    pub url: String,
    pub success: bool,
    /// Milliseconds, rounded to two decimals; 0.0 on failure.
    pub latency_ms: f64,
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default)]
pub struct SpeedTestSummary {
    pub results: Vec<SpeedSample>,
    pub total_duration_ms: u64,
    pub cancelled: bool,
}

/// Probe every `(name, url)` entry in order, emitting one sample per
/// completed probe. Cancellation is checked between probes; samples sent
/// before the cancel stand.
pub async fn run_speed_test(
    registries: Vec<(String, String)>,
    client: Client,
    timeout: Duration,
    progress_tx: mpsc::Sender<SpeedSample>,
    cancel: CancellationToken,
) -> SpeedTestSummary {
    let start = Instant::now();
    let mut summary = SpeedTestSummary::default();

    for (name, url) in registries {
        if cancel.is_cancelled() {
            summary.cancelled = true;
            break;
        }

        let (success, latency_ms) = probe::probe_latency(&client, &url, timeout).await;
        let sample = SpeedSample {
            name,
            url,
            success,
            latency_ms,
        };
        let _ = progress_tx.send(sample.clone()).await;
        summary.results.push(sample);
    }

    summary.total_duration_ms = start.elapsed().as_millis() as u64;
    summary
}
