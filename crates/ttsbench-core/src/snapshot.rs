use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{BenchmarkResult, ProviderBenchmark, Result};

/// Serialized form of a [`ProviderBenchmark`] inside the results file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub total_latency_mean_ms: f64,
    pub total_cost_usd: f64,
    pub avg_realtime_factor: f64,
    pub languages_tested: Vec<String>,
    pub results: Vec<BenchmarkResult>,
}

impl From<&ProviderBenchmark> for ProviderEntry {
    fn from(benchmark: &ProviderBenchmark) -> Self {
        Self {
            total_latency_mean_ms: benchmark.total_latency_mean_ms(),
            total_cost_usd: benchmark.total_cost_usd(),
            avg_realtime_factor: benchmark.avg_realtime_factor(),
            languages_tested: benchmark.languages_tested(),
            results: benchmark.results.clone(),
        }
    }
}

/// On-disk state of every provider's results as of the last save.
///
/// Provider entries are kept as raw JSON so entries this run never touches are
/// written back exactly as they were read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub iterations: u32,
    #[serde(default)]
    pub providers: BTreeMap<String, Value>,
}

impl PersistedSnapshot {
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn contains(&self, provider_key: &str) -> bool {
        self.providers.contains_key(provider_key)
    }

    /// Sample ids recorded for a provider. Empty when the provider is absent
    /// or its entry has no readable `results` list.
    pub fn sample_ids(&self, provider_key: &str) -> HashSet<String> {
        self.providers
            .get(provider_key)
            .and_then(|entry| entry.get("results"))
            .and_then(Value::as_array)
            .map(|results| {
                results
                    .iter()
                    .filter_map(|r| r.get("sample_id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn insert(&mut self, provider_key: &str, benchmark: &ProviderBenchmark) -> Result<()> {
        let entry = serde_json::to_value(ProviderEntry::from(benchmark))?;
        self.providers.insert(provider_key.to_string(), entry);
        Ok(())
    }

    /// Typed view of a provider entry
    pub fn entry(&self, provider_key: &str) -> Result<Option<ProviderEntry>> {
        let Some(value) = self.providers.get(provider_key) else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(value.clone())?))
    }
}
