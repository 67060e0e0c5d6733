use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;
use ttsbench_core::{
    pcm16_duration_seconds, AudioResult, ProviderConfig, Result, TtsBenchError, TtsProvider,
};

use super::{error_body, http_client, required_env, sniff_format};
use crate::audio_store::wav_duration_seconds;

const NAME: &str = "Qwen3-TTS (Self-Hosted)";
const SAMPLE_RATE: u32 = 24000;
const DURATION_HEADER: &str = "X-Duration-Seconds";

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    voice: &'a str,
    language: &'a str,
}

/// Qwen3-TTS served from our own GPU box
pub struct SelfHostedProvider {
    config: ProviderConfig,
    api_url: String,
    client: reqwest::Client,
}

impl SelfHostedProvider {
    pub fn provider_config() -> ProviderConfig {
        ProviderConfig::new(
            NAME,
            0.0,
            &["en", "zh", "ja", "ko", "de", "fr", "ru", "pt", "es", "it", "multilingual"],
        )
        .with_voices("default", "default")
    }

    pub async fn from_env() -> Result<Self> {
        let api_url = required_env(NAME, "QWEN_TTS_API_URL")?;
        Self::connect(&api_url).await
    }

    /// Fails unless the server answers its health check
    pub async fn connect(api_url: &str) -> Result<Self> {
        let api_url = api_url.trim_end_matches('/').to_string();
        let client = http_client(NAME)?;

        let health = client
            .get(format!("{}/health", api_url))
            .send()
            .await
            .map_err(|e| init_error(format!("Cannot reach {}: {}", api_url, e)))?;
        if !health.status().is_success() {
            return Err(init_error(format!("Health check failed: {}", health.status())));
        }

        info!("Connected to self-hosted TTS at {}", api_url);
        Ok(Self {
            config: Self::provider_config(),
            api_url,
            client,
        })
    }
}

fn init_error(reason: String) -> TtsBenchError {
    TtsBenchError::ProviderInit {
        provider: NAME.to_string(),
        reason,
    }
}

#[async_trait]
impl TtsProvider for SelfHostedProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn generate(&self, text: &str, voice: Option<&str>, language: &str) -> Result<AudioResult> {
        let voice = voice.unwrap_or_else(|| self.default_voice(language));

        let start = Instant::now();
        let resp = self
            .client
            .post(format!("{}/synthesize", self.api_url))
            .json(&SynthesizeRequest {
                text,
                voice,
                language,
            })
            .send()
            .await
            .map_err(|e| TtsBenchError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(error_body(NAME, resp).await);
        }

        let reported_duration = resp
            .headers()
            .get(DURATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<f64>().ok());

        let audio = resp
            .bytes()
            .await
            .map_err(|e| TtsBenchError::Http(e.to_string()))?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        let format = sniff_format(&audio);
        let duration_seconds = reported_duration.unwrap_or_else(|| {
            wav_duration_seconds(&audio)
                .unwrap_or_else(|_| pcm16_duration_seconds(audio.len(), SAMPLE_RATE))
        });

        Ok(AudioResult {
            audio_bytes: audio.to_vec(),
            format,
            sample_rate: SAMPLE_RATE,
            duration_seconds,
            latency_ms,
            ttfb_ms: None,
            characters: text.chars().count(),
        })
    }
}
