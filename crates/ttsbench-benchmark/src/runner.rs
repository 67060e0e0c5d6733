use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};
use ttsbench_core::{
    PathsConfig, PersistedSnapshot, ProviderBenchmark, Result, TextSample, TtsBenchError,
    TtsProvider, DEFAULT_LANGUAGES,
};

use crate::audio_store::AudioStore;
use crate::sampler::LatencySampler;
use crate::store::ResultsStore;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub iterations: u32,
    pub warmup_runs: u32,
    pub skip_existing: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            iterations: 10,
            warmup_runs: 1,
            skip_existing: true,
        }
    }
}

/// Per-provider results of one run plus which providers were run or skipped
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub results: BTreeMap<String, ProviderBenchmark>,
    pub ran: Vec<String>,
    pub skipped: Vec<String>,
}

/// Runs every registered provider over the sample set, one call at a time
pub struct BenchmarkRunner {
    providers: Vec<(String, Box<dyn TtsProvider>)>,
    sampler: LatencySampler,
    store: ResultsStore,
    options: RunOptions,
}

impl BenchmarkRunner {
    /// Reads any existing results under `output_dir` for skip decisions and
    /// for merging on save.
    pub fn new(
        providers: Vec<(String, Box<dyn TtsProvider>)>,
        output_dir: &Path,
        options: RunOptions,
    ) -> Self {
        let paths = PathsConfig {
            output_dir: output_dir.to_path_buf(),
            ..Default::default()
        };
        let audio = AudioStore::new(paths.audio_dir());
        let store = ResultsStore::open(paths.results_path());
        Self {
            providers,
            sampler: LatencySampler::new(options.iterations, options.warmup_runs, audio),
            store,
            options,
        }
    }

    pub fn provider_keys(&self) -> Vec<&str> {
        self.providers.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Results loaded at startup, before this run adds anything
    pub fn existing(&self) -> &PersistedSnapshot {
        self.store.snapshot()
    }

    pub fn results_path(&self) -> &Path {
        self.store.path()
    }

    pub fn audio_dir(&self) -> &Path {
        self.sampler.audio_store().root()
    }

    #[instrument(skip_all, fields(providers = self.providers.len(), samples = samples.len()))]
    pub async fn run(&self, samples: &[TextSample], languages: &[String]) -> Result<RunOutcome> {
        if self.providers.is_empty() {
            return Err(TtsBenchError::NoProviders);
        }

        let languages = requested_languages(languages);
        let filtered: Vec<&TextSample> = samples
            .iter()
            .filter(|s| languages.contains(&s.language))
            .collect();

        info!(
            "Benchmarking {} samples across {} providers ({} iterations, {} warmup)",
            filtered.len(),
            self.providers.len(),
            self.options.iterations,
            self.options.warmup_runs
        );

        let mut outcome = RunOutcome::default();

        for (key, provider) in &self.providers {
            if self.options.skip_existing && self.has_complete_results(key, provider.as_ref(), &filtered) {
                info!("[SKIP] {} - already has complete results and audio", provider.name());
                outcome.skipped.push(key.clone());
                continue;
            }

            outcome.ran.push(key.clone());
            let benchmark = self.run_provider(provider.as_ref(), &filtered).await;
            outcome.results.insert(key.clone(), benchmark);
        }

        if !outcome.skipped.is_empty() {
            info!(
                "Skipped {} providers with existing results: {}",
                outcome.skipped.len(),
                outcome.skipped.join(", ")
            );
        }
        if !outcome.ran.is_empty() {
            info!(
                "Ran benchmarks for {} providers: {}",
                outcome.ran.len(),
                outcome.ran.join(", ")
            );
        }

        Ok(outcome)
    }

    /// Merge this run into the loaded snapshot and write it out
    pub fn save(&self, outcome: &RunOutcome) -> Result<PathBuf> {
        self.store.save(&outcome.results, self.options.iterations)
    }

    async fn run_provider(&self, provider: &dyn TtsProvider, samples: &[&TextSample]) -> ProviderBenchmark {
        let characters: usize = samples
            .iter()
            .filter(|s| provider.supports_language(&s.language))
            .map(|s| s.characters())
            .sum();
        info!(
            "Benchmarking: {} ({} chars per iteration, ~${:.6} per iteration)",
            provider.name(),
            characters,
            provider.estimate_cost(characters)
        );
        let mut benchmark = ProviderBenchmark::new(provider.name());

        for sample in samples {
            if !provider.supports_language(&sample.language) {
                info!(
                    "Skipping {} - {} doesn't support {}",
                    sample.id,
                    provider.name(),
                    sample.language
                );
                continue;
            }

            info!("Processing: {} ({})", sample.id, sample.language);
            match self.sampler.sample(provider, sample).await {
                Ok(result) => {
                    info!(
                        "  Latency: {:.1}ms (mean), realtime factor: {:.1}x",
                        result.latency_stats.mean_ms,
                        result.realtime_factor
                    );
                    benchmark.push(result);
                }
                Err(e) => warn!("  {} failed on {}: {}", provider.name(), sample.id, e),
            }
        }

        benchmark
    }

    /// True when the snapshot already has every supported sample for this
    /// provider and each one's audio file exists. Iteration count is not
    /// compared.
    fn has_complete_results(
        &self,
        key: &str,
        provider: &dyn TtsProvider,
        samples: &[&TextSample],
    ) -> bool {
        let existing = self.store.snapshot();
        if !existing.contains(key) {
            return false;
        }

        let recorded = existing.sample_ids(key);
        let audio = self.sampler.audio_store();

        samples
            .iter()
            .filter(|s| provider.supports_language(&s.language))
            .all(|s| recorded.contains(&s.id) && audio.exists(provider.name(), &s.id))
    }
}

fn requested_languages(languages: &[String]) -> Vec<String> {
    if languages.is_empty() {
        return DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect();
    }
    languages.to_vec()
}
