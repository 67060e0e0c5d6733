use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use serde::Serialize;
use tracing::debug;
use ttsbench_core::{
    pcm16_duration_seconds, AudioFormat, AudioResult, ProviderConfig, Result, TtsBenchError,
    TtsProvider,
};

use super::{elapsed_ms, error_body, http_client, read_timed, required_env};

const DEFAULT_BASE_URL: &str = "https://api-global-preview.elevenlabs.io";
const OUTPUT_FORMAT: &str = "pcm_24000";
const SAMPLE_RATE: u32 = 24000;

/// Premade voices addressable by name
const DEFAULT_VOICES: &[(&str, &str)] = &[
    ("rachel", "21m00Tcm4TlvDq8ikWAM"),
    ("sarah", "EXAVITQu4vr4xnSDxMaL"),
    ("adam", "pNInz6obpgDQGcFmaJgB"),
    ("antoni", "ErXwobaYiN019PkySvjV"),
    ("josh", "TxGEqnHWrfWFTfGW9XjX"),
];

/// Which ElevenLabs model a provider instance drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevenLabsModel {
    /// Highest quality multilingual model; latency is the full request
    Standard,
    /// Low-latency model; latency is time to first audio chunk
    Turbo,
}

impl ElevenLabsModel {
    pub fn model_id(&self) -> &'static str {
        match self {
            ElevenLabsModel::Standard => "eleven_multilingual_v2",
            ElevenLabsModel::Turbo => "eleven_turbo_v2_5",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ElevenLabsModel::Standard => "ElevenLabs Standard",
            ElevenLabsModel::Turbo => "ElevenLabs Turbo",
        }
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::new(
            self.display_name(),
            165.00,
            &["en", "zh", "es", "fr", "de", "ja", "ko", "pt", "it", "multilingual"],
        )
        .with_voices("sarah", "sarah")
        .streaming()
    }

    fn reported_latency(&self, total_ms: f64, ttfb_ms: Option<f64>) -> f64 {
        match self {
            ElevenLabsModel::Standard => total_ms,
            ElevenLabsModel::Turbo => ttfb_ms.unwrap_or(total_ms),
        }
    }
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

pub struct ElevenLabsProvider {
    config: ProviderConfig,
    model: ElevenLabsModel,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl ElevenLabsProvider {
    /// `ELEVENLABS_API_KEY` is required, `ELEVENLABS_BASE_URL` overrides the endpoint
    pub fn from_env(model: ElevenLabsModel) -> Result<Self> {
        let api_key = required_env(model.display_name(), "ELEVENLABS_API_KEY")?;
        let base_url =
            std::env::var("ELEVENLABS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(model, &api_key, &base_url)
    }

    pub fn new(model: ElevenLabsModel, api_key: &str, base_url: &str) -> Result<Self> {
        Ok(Self {
            config: model.provider_config(),
            model,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(model.display_name())?,
        })
    }

    pub fn model(&self) -> ElevenLabsModel {
        self.model
    }

    async fn open_stream(&self, text: &str, voice: Option<&str>, language: &str) -> Result<reqwest::Response> {
        let voice = voice.unwrap_or_else(|| self.default_voice(language));
        let url = format!(
            "{}/v1/text-to-speech/{}/stream?output_format={}",
            self.base_url,
            voice_id(voice),
            OUTPUT_FORMAT
        );

        let resp = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&SpeechRequest {
                text,
                model_id: self.model.model_id(),
            })
            .send()
            .await
            .map_err(|e| TtsBenchError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(error_body(self.name(), resp).await);
        }
        Ok(resp)
    }
}

/// Known voice names map to their ids, anything else is passed through
fn voice_id(voice: &str) -> &str {
    let lower = voice.to_lowercase();
    DEFAULT_VOICES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, id)| *id)
        .unwrap_or(voice)
}

#[async_trait]
impl TtsProvider for ElevenLabsProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn generate(&self, text: &str, voice: Option<&str>, language: &str) -> Result<AudioResult> {
        let start = Instant::now();
        let resp = self.open_stream(text, voice, language).await?;
        let (audio, ttfb_ms) = read_timed(resp, start).await?;

        let total_ms = elapsed_ms(start);
        debug!(
            model = self.model.model_id(),
            bytes = audio.len(),
            total_ms,
            "ElevenLabs stream complete"
        );

        Ok(AudioResult {
            duration_seconds: pcm16_duration_seconds(audio.len(), SAMPLE_RATE),
            audio_bytes: audio,
            format: AudioFormat::Pcm16,
            sample_rate: SAMPLE_RATE,
            latency_ms: self.model.reported_latency(total_ms, ttfb_ms),
            ttfb_ms,
            characters: text.chars().count(),
        })
    }

    async fn generate_stream(&self, text: &str, voice: Option<&str>, language: &str) -> Result<Vec<Bytes>> {
        let resp = self.open_stream(text, voice, language).await?;
        let mut stream = resp.bytes_stream();
        let mut chunks = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| TtsBenchError::Http(e.to_string()))?;
            if !chunk.is_empty() {
                chunks.push(chunk);
            }
        }
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_voice_id_lookup() {
        assert_eq!(voice_id("Sarah"), "EXAVITQu4vr4xnSDxMaL");
        assert_eq!(voice_id("custom-voice-id"), "custom-voice-id");
    }

    #[test]
    fn test_reported_latency_by_model() {
        assert_eq!(ElevenLabsModel::Standard.reported_latency(500.0, Some(80.0)), 500.0);
        assert_eq!(ElevenLabsModel::Turbo.reported_latency(500.0, Some(80.0)), 80.0);
        assert_eq!(ElevenLabsModel::Turbo.reported_latency(500.0, None), 500.0);
    }

    #[test]
    fn test_configs_differ_only_by_name() {
        let standard = ElevenLabsModel::Standard.provider_config();
        let turbo = ElevenLabsModel::Turbo.provider_config();
        assert_ne!(standard.name, turbo.name);
        assert_eq!(standard.pricing_per_1m_chars, turbo.pricing_per_1m_chars);
        assert!(standard.supports_streaming && turbo.supports_streaming);
    }

    #[tokio::test]
    async fn test_generate_streams_pcm() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Regex(r"^/v1/text-to-speech/EXAVITQu4vr4xnSDxMaL/stream".to_string()))
            .match_query(Matcher::UrlEncoded("output_format".into(), OUTPUT_FORMAT.into()))
            .match_header("xi-api-key", "key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model_id": "eleven_turbo_v2_5"
            })))
            .with_status(200)
            .with_body(vec![0u8; 48000])
            .create_async()
            .await;

        let p = ElevenLabsProvider::new(ElevenLabsModel::Turbo, "key", &server.url()).unwrap();
        let r = p.generate("Hello there", None, "en").await.unwrap();

        mock.assert_async().await;
        assert_eq!(r.format, AudioFormat::Pcm16);
        assert_eq!(r.audio_bytes.len(), 48000);
        assert!((r.duration_seconds - 1.0).abs() < 1e-9);
        let ttfb = r.ttfb_ms.expect("first chunk timed");
        assert_eq!(r.latency_ms, ttfb);
    }

    #[tokio::test]
    async fn test_generate_rejects_bad_key() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Any)
            .with_status(401)
            .with_body(r#"{"detail":"invalid_api_key"}"#)
            .create_async()
            .await;

        let p = ElevenLabsProvider::new(ElevenLabsModel::Standard, "bad", &server.url()).unwrap();
        let err = p.generate("Hello", None, "en").await.unwrap_err();
        assert!(matches!(err, TtsBenchError::Provider(ref m) if m.contains("invalid_api_key")));
    }

    #[tokio::test]
    async fn test_generate_stream_yields_chunks() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_body(vec![1u8; 1024])
            .create_async()
            .await;

        let p = ElevenLabsProvider::new(ElevenLabsModel::Standard, "key", &server.url()).unwrap();
        let chunks = p.generate_stream("Hello", Some("adam"), "en").await.unwrap();
        let total: usize = chunks.iter().map(|c| c.len()).sum();
        assert_eq!(total, 1024);
    }
}
