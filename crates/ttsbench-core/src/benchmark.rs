use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::metrics::mean;
use crate::LatencyStats;

/// Measurements for one (provider, sample) pairing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub provider: String,
    pub sample_id: String,
    pub text: String,
    pub language: String,
    pub category: String,

    pub latency_stats: LatencyStats,
    /// Successful measured runs
    pub iterations: u32,

    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub characters: usize,

    pub realtime_factor: f64,
    pub chars_per_second: f64,

    pub cost_usd: f64,

    #[serde(default)]
    pub audio_file: Option<String>,
}

/// All results for one provider within a run. Aggregates are derived from
/// `results` on every call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderBenchmark {
    pub provider: String,
    pub results: Vec<BenchmarkResult>,
}

impl ProviderBenchmark {
    pub fn new(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, result: BenchmarkResult) {
        self.results.push(result);
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Mean of per-sample mean latencies
    pub fn total_latency_mean_ms(&self) -> f64 {
        let means: Vec<f64> = self.results.iter().map(|r| r.latency_stats.mean_ms).collect();
        mean(&means)
    }

    pub fn total_cost_usd(&self) -> f64 {
        self.results.iter().map(|r| r.cost_usd).sum()
    }

    pub fn avg_realtime_factor(&self) -> f64 {
        let factors: Vec<f64> = self.results.iter().map(|r| r.realtime_factor).collect();
        mean(&factors)
    }

    /// Distinct languages covered, sorted
    pub fn languages_tested(&self) -> Vec<String> {
        self.results
            .iter()
            .map(|r| r.language.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
