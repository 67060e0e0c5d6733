use tracing::{debug, instrument, warn};
use ttsbench_core::{
    is_chinese_variant, AudioResult, BenchmarkResult, CostEstimator, LatencyStats, Result,
    TextSample, TtsBenchError, TtsProvider,
};

use crate::audio_store::AudioStore;

/// Times repeated calls of one provider on one sample
pub struct LatencySampler {
    iterations: u32,
    warmup_runs: u32,
    audio: AudioStore,
}

impl LatencySampler {
    pub fn new(iterations: u32, warmup_runs: u32, audio: AudioStore) -> Self {
        Self {
            iterations,
            warmup_runs,
            audio,
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn warmup_runs(&self) -> u32 {
        self.warmup_runs
    }

    pub fn audio_store(&self) -> &AudioStore {
        &self.audio
    }

    /// Run warmups then measured iterations. Fails only when no measured
    /// iteration succeeds or the language is rejected up front.
    #[instrument(skip_all, fields(provider = %provider.name(), sample = %sample.id))]
    pub async fn sample(
        &self,
        provider: &dyn TtsProvider,
        sample: &TextSample,
    ) -> Result<BenchmarkResult> {
        check_language(provider, &sample.language)?;

        for i in 0..self.warmup_runs {
            debug!("Warmup run {}/{}", i + 1, self.warmup_runs);
            if let Err(e) = provider.generate(&sample.text, None, &sample.language).await {
                debug!("Warmup run {} failed: {}", i + 1, e);
            }
        }

        let mut outcomes: Vec<Result<AudioResult>> = Vec::with_capacity(self.iterations as usize);
        for i in 0..self.iterations {
            debug!("Iteration {}/{}", i + 1, self.iterations);
            let outcome = provider.generate(&sample.text, None, &sample.language).await;
            if let Err(e) = &outcome {
                warn!("Error on iteration {}: {}", self.warmup_runs + i, e);
            }
            outcomes.push(outcome);
        }

        let successes: Vec<AudioResult> = outcomes.into_iter().filter_map(|o| o.ok()).collect();
        let Some(last) = successes.last() else {
            return Err(TtsBenchError::AllIterationsFailed {
                provider: provider.name().to_string(),
                sample_id: sample.id.clone(),
            });
        };

        let latencies: Vec<f64> = successes.iter().map(|r| r.latency_ms).collect();
        let ttfbs: Vec<f64> = successes.iter().filter_map(|r| r.ttfb_ms).collect();
        let latency_stats = LatencyStats::from_samples(&latencies, &ttfbs).ok_or_else(|| {
            TtsBenchError::AllIterationsFailed {
                provider: provider.name().to_string(),
                sample_id: sample.id.clone(),
            }
        })?;

        let audio_file = match self.audio.save(provider.name(), &sample.id, last) {
            Ok(path) => Some(path.to_string_lossy().into_owned()),
            Err(e) => {
                warn!("Failed to save audio for {}: {}", sample.id, e);
                None
            }
        };

        let characters = sample.characters();

        Ok(BenchmarkResult {
            provider: provider.name().to_string(),
            sample_id: sample.id.clone(),
            text: sample.text.clone(),
            language: sample.language.clone(),
            category: sample.category.clone(),
            latency_stats,
            iterations: successes.len() as u32,
            duration_seconds: last.duration_seconds,
            sample_rate: last.sample_rate,
            characters,
            realtime_factor: last.realtime_factor(),
            chars_per_second: last.chars_per_second(),
            cost_usd: CostEstimator::cost(provider.name(), characters),
            audio_file,
        })
    }
}

// Chinese variants are rejected before spending any calls when the provider
// has no Chinese support at all.
fn check_language(provider: &dyn TtsProvider, language: &str) -> Result<()> {
    if provider.supports_language(language) {
        return Ok(());
    }
    if is_chinese_variant(language) && !provider.supports_language("zh") {
        return Err(TtsBenchError::UnsupportedLanguage {
            provider: provider.name().to_string(),
            language: language.to_string(),
        });
    }
    Ok(())
}
