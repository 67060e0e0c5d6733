//! HTTP adapters for the benchmarked TTS services.
//!
//! Each adapter reads its credentials from the environment and measures
//! wall-clock latency around the request.

mod azure;
mod elevenlabs;
mod minimax;
mod self_hosted;

use std::time::{Duration, Instant};

use futures::StreamExt;
use ttsbench_core::{AudioFormat, ProviderConfig, Result, TtsBenchError, TtsProvider};

pub use azure::{AzureMode, AzureTtsProvider};
pub use elevenlabs::{ElevenLabsModel, ElevenLabsProvider};
pub use minimax::{MiniMaxMode, MiniMaxProvider};
pub use self_hosted::SelfHostedProvider;

pub const PROVIDER_KEYS: &[&str] = &[
    "azure",
    "azure_streaming",
    "elevenlabs",
    "elevenlabs_turbo",
    "minimax",
    "minimax_streaming",
    "minimax_pcm",
    "qwen3_selfhosted",
];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Build and initialize the adapter registered under `key`
pub async fn create_provider(key: &str) -> Result<Box<dyn TtsProvider>> {
    match key {
        "azure" => Ok(Box::new(AzureTtsProvider::from_env(AzureMode::Standard)?)),
        "azure_streaming" => Ok(Box::new(AzureTtsProvider::from_env(AzureMode::Streaming)?)),
        "elevenlabs" => Ok(Box::new(ElevenLabsProvider::from_env(ElevenLabsModel::Standard)?)),
        "elevenlabs_turbo" => Ok(Box::new(ElevenLabsProvider::from_env(ElevenLabsModel::Turbo)?)),
        "minimax" => Ok(Box::new(MiniMaxProvider::from_env(MiniMaxMode::Standard)?)),
        "minimax_streaming" => Ok(Box::new(MiniMaxProvider::from_env(MiniMaxMode::Streaming)?)),
        "minimax_pcm" => Ok(Box::new(MiniMaxProvider::from_env(MiniMaxMode::Pcm)?)),
        "qwen3_selfhosted" => Ok(Box::new(SelfHostedProvider::from_env().await?)),
        other => Err(TtsBenchError::Config(format!("Unknown provider '{}'", other))),
    }
}

/// Static config for every registered key, without touching credentials
pub fn catalog() -> Vec<(&'static str, ProviderConfig)> {
    vec![
        ("azure", AzureMode::Standard.provider_config()),
        ("azure_streaming", AzureMode::Streaming.provider_config()),
        ("elevenlabs", ElevenLabsModel::Standard.provider_config()),
        ("elevenlabs_turbo", ElevenLabsModel::Turbo.provider_config()),
        ("minimax", MiniMaxMode::Standard.provider_config()),
        ("minimax_streaming", MiniMaxMode::Streaming.provider_config()),
        ("minimax_pcm", MiniMaxMode::Pcm.provider_config()),
        ("qwen3_selfhosted", SelfHostedProvider::provider_config()),
    ]
}

fn http_client(provider: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| TtsBenchError::ProviderInit {
            provider: provider.to_string(),
            reason: e.to_string(),
        })
}

fn required_env(provider: &str, var: &str) -> Result<String> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| TtsBenchError::ProviderInit {
            provider: provider.to_string(),
            reason: format!("{} environment variable not set", var),
        })
}

/// RIFF header means WAV, anything else is treated as raw 16-bit PCM
fn sniff_format(bytes: &[u8]) -> AudioFormat {
    if bytes.starts_with(b"RIFF") {
        return AudioFormat::Wav;
    }
    AudioFormat::Pcm16
}

/// Drain a streamed body. The second value is the time from `start` to the
/// first non-empty chunk.
async fn read_timed(resp: reqwest::Response, start: Instant) -> Result<(Vec<u8>, Option<f64>)> {
    let mut stream = resp.bytes_stream();
    let mut body = Vec::new();
    let mut ttfb_ms = None;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| TtsBenchError::Http(e.to_string()))?;
        if chunk.is_empty() {
            continue;
        }
        if ttfb_ms.is_none() {
            ttfb_ms = Some(elapsed_ms(start));
        }
        body.extend_from_slice(&chunk);
    }

    Ok((body, ttfb_ms))
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

async fn error_body(provider: &str, resp: reqwest::Response) -> TtsBenchError {
    let status = resp.status();
    let body: String = resp
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(500)
        .collect();
    TtsBenchError::Provider(format!("{} failed: {} - {}", provider, status, body))
}
