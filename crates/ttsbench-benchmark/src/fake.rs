use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ttsbench_core::{
    AudioFormat, AudioResult, ProviderConfig, Result, TtsBenchError, TtsProvider,
};

/// Scripted provider: constant timing, optional failures by call index
pub struct FakeProvider {
    config: ProviderConfig,
    latency_ms: f64,
    ttfb_ms: Option<f64>,
    fail_on: HashSet<usize>,
    calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new(name: &str, languages: &[&str]) -> Self {
        Self {
            config: ProviderConfig::new(name, 0.0, languages),
            latency_ms: 100.0,
            ttfb_ms: None,
            fail_on: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, latency_ms: f64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_ttfb(mut self, ttfb_ms: f64) -> Self {
        self.ttfb_ms = Some(ttfb_ms);
        self
    }

    pub fn failing_on(mut self, calls: &[usize]) -> Self {
        self.fail_on = calls.iter().copied().collect();
        self
    }

    pub fn failing_always(self) -> Self {
        let all: Vec<usize> = (0..1000).collect();
        self.failing_on(&all)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TtsProvider for FakeProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn generate(&self, text: &str, _voice: Option<&str>, _language: &str) -> Result<AudioResult> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.contains(&call) {
            return Err(TtsBenchError::Provider(format!("scripted failure on call {}", call)));
        }

        // Latency encodes the call index so tests can tell which calls were kept
        let latency_ms = self.latency_ms + if self.fail_on.is_empty() { 0.0 } else { call as f64 };

        Ok(AudioResult {
            audio_bytes: vec![0; 48000],
            format: AudioFormat::Pcm16,
            sample_rate: 24000,
            duration_seconds: 1.0,
            latency_ms,
            ttfb_ms: self.ttfb_ms,
            characters: text.chars().count(),
        })
    }
}
