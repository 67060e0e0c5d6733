use serde::{Deserialize, Serialize};

/// Latency summary over the measured (non-warmup) iterations of one
/// provider/sample pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub mean_ms: f64,
    pub median_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p95_ms: f64,
    pub std_dev_ms: f64,
    #[serde(default)]
    pub ttfb_mean_ms: Option<f64>,
}

impl LatencyStats {
    /// Returns `None` when there are no latencies to summarize.
    pub fn from_samples(latencies: &[f64], ttfbs: &[f64]) -> Option<Self> {
        if latencies.is_empty() {
            return None;
        }

        let mut sorted = latencies.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let mean_ms = mean(&sorted);

        Some(Self {
            mean_ms,
            median_ms: median(&sorted),
            min_ms: sorted[0],
            max_ms: sorted[n - 1],
            p95_ms: p95(&sorted),
            std_dev_ms: sample_std_dev(&sorted, mean_ms),
            ttfb_mean_ms: (!ttfbs.is_empty()).then(|| mean(ttfbs)),
        })
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    let mid = n / 2;
    if n % 2 == 1 {
        return sorted[mid];
    }
    (sorted[mid - 1] + sorted[mid]) / 2.0
}

// Index floor(0.95 * n) of the ascending list; the lone value when n == 1.
fn p95(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let idx = ((n as f64) * 0.95).floor() as usize;
    sorted[idx.min(n - 1)]
}

fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}
