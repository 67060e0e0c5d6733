use std::time::Instant;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use ttsbench_core::{
    pcm16_duration_seconds, AudioFormat, AudioResult, ProviderConfig, Result, TtsBenchError,
    TtsProvider,
};

use super::{elapsed_ms, error_body, http_client, required_env};
use crate::audio_store::wav_duration_seconds;

const DEFAULT_BASE_URL: &str = "https://api.minimax.io";
const MODEL: &str = "speech-2.6-turbo";
const MULTILINGUAL_VOICE: &str = "female-shaonv";
const MP3_BITRATE: u32 = 128000;
// Streamed events with this status repeat the whole clip
const STATUS_COMPLETE: u8 = 2;

/// Which T2A v2 output a provider instance requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiniMaxMode {
    /// One JSON response carrying a hex WAV; latency is the full request
    Standard,
    /// Event stream of hex MP3 chunks; latency is time to first audio
    Streaming,
    /// Event stream of hex 16-bit PCM chunks; latency is time to first audio
    Pcm,
}

impl MiniMaxMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            MiniMaxMode::Standard => "MiniMax",
            MiniMaxMode::Streaming => "MiniMax Streaming",
            MiniMaxMode::Pcm => "MiniMax PCM",
        }
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::new(
            self.display_name(),
            60.00,
            &["en", "zh", "ja", "ko", "es", "fr", "de", "pt", "it", "ru", "ar", "multilingual"],
        )
        .with_voices("Calm_Woman", "female-shaonv")
        .streaming()
    }

    pub fn sample_rate(&self) -> u32 {
        match self {
            MiniMaxMode::Standard | MiniMaxMode::Streaming => 32000,
            MiniMaxMode::Pcm => 24000,
        }
    }

    fn is_streamed(&self) -> bool {
        !matches!(self, MiniMaxMode::Standard)
    }

    fn audio_setting(&self) -> AudioSetting {
        match self {
            MiniMaxMode::Standard => AudioSetting {
                sample_rate: self.sample_rate(),
                bitrate: Some(MP3_BITRATE),
                format: "wav",
                channel: None,
            },
            MiniMaxMode::Streaming => AudioSetting {
                sample_rate: self.sample_rate(),
                bitrate: Some(MP3_BITRATE),
                format: "mp3",
                channel: None,
            },
            MiniMaxMode::Pcm => AudioSetting {
                sample_rate: self.sample_rate(),
                bitrate: None,
                format: "pcm",
                channel: Some(1),
            },
        }
    }

    fn audio_format(&self) -> AudioFormat {
        match self {
            MiniMaxMode::Standard => AudioFormat::Wav,
            MiniMaxMode::Streaming => AudioFormat::Mp3,
            MiniMaxMode::Pcm => AudioFormat::Pcm16,
        }
    }

    fn duration_seconds(&self, audio: &[u8]) -> f64 {
        match self {
            MiniMaxMode::Standard => wav_duration_seconds(audio)
                .unwrap_or_else(|_| pcm16_duration_seconds(audio.len().saturating_sub(44), self.sample_rate())),
            // Constant bitrate, so size gives the duration
            MiniMaxMode::Streaming => audio.len() as f64 * 8.0 / MP3_BITRATE as f64,
            MiniMaxMode::Pcm => pcm16_duration_seconds(audio.len(), self.sample_rate()),
        }
    }
}

#[derive(Serialize)]
struct T2aRequest<'a> {
    model: &'a str,
    text: &'a str,
    stream: bool,
    voice_setting: VoiceSetting<'a>,
    audio_setting: AudioSetting,
}

#[derive(Serialize)]
struct VoiceSetting<'a> {
    voice_id: &'a str,
    speed: f32,
    vol: f32,
    pitch: i32,
}

#[derive(Serialize)]
struct AudioSetting {
    sample_rate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    bitrate: Option<u32>,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct T2aResponse {
    #[serde(default)]
    data: Option<T2aData>,
    #[serde(default)]
    base_resp: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct T2aData {
    #[serde(default)]
    audio: String,
    #[serde(default)]
    status: Option<u8>,
}

/// MiniMax T2A v2. Audio comes back hex encoded in every mode.
pub struct MiniMaxProvider {
    config: ProviderConfig,
    mode: MiniMaxMode,
    api_key: String,
    group_id: String,
    base_url: String,
    client: reqwest::Client,
}

impl MiniMaxProvider {
    /// `MINIMAX_API_KEY` and `MINIMAX_GROUP_ID` are required,
    /// `MINIMAX_BASE_URL` overrides the endpoint
    pub fn from_env(mode: MiniMaxMode) -> Result<Self> {
        let api_key = required_env(mode.display_name(), "MINIMAX_API_KEY")?;
        let group_id = required_env(mode.display_name(), "MINIMAX_GROUP_ID")?;
        let base_url =
            std::env::var("MINIMAX_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(mode, &api_key, &group_id, &base_url)
    }

    pub fn new(mode: MiniMaxMode, api_key: &str, group_id: &str, base_url: &str) -> Result<Self> {
        Ok(Self {
            config: mode.provider_config(),
            mode,
            api_key: api_key.to_string(),
            group_id: group_id.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(mode.display_name())?,
        })
    }

    fn pick_voice<'a>(&'a self, voice: Option<&'a str>, language: &str) -> &'a str {
        if language == "multilingual" {
            return voice.unwrap_or(MULTILINGUAL_VOICE);
        }
        voice.unwrap_or_else(|| self.default_voice(language))
    }

    async fn read_single(&self, resp: reqwest::Response) -> Result<Vec<u8>> {
        let body: T2aResponse = resp
            .json()
            .await
            .map_err(|e| TtsBenchError::Http(e.to_string()))?;

        let audio = body
            .data
            .map(|d| d.audio)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| {
                TtsBenchError::Provider(format!(
                    "{} returned no audio: {}",
                    self.name(),
                    body.base_resp.unwrap_or(Value::Null)
                ))
            })?;

        hex::decode(audio).map_err(|e| TtsBenchError::Provider(format!("Bad hex audio: {}", e)))
    }

    async fn read_events(&self, resp: reqwest::Response, start: Instant) -> Result<(Vec<u8>, Option<f64>)> {
        let mut stream = resp.bytes_stream();
        let mut pending: Vec<u8> = Vec::new();
        let mut audio = Vec::new();
        let mut ttfb_ms = None;

        let mut take = |line: &[u8], audio: &mut Vec<u8>| {
            if let Some(chunk) = event_audio(&String::from_utf8_lossy(line)) {
                if ttfb_ms.is_none() {
                    ttfb_ms = Some(elapsed_ms(start));
                }
                audio.extend_from_slice(&chunk);
            }
        };

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| TtsBenchError::Http(e.to_string()))?;
            pending.extend_from_slice(&chunk);
            while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = pending.drain(..=pos).collect();
                take(&line[..], &mut audio);
            }
        }
        if !pending.is_empty() {
            take(&pending[..], &mut audio);
        }

        Ok((audio, ttfb_ms))
    }
}

/// Audio bytes carried by one `data:` line of the event stream. Lines that
/// are not data, fail to parse, carry no audio or repeat the full clip are
/// skipped.
fn event_audio(line: &str) -> Option<Vec<u8>> {
    let payload = line.trim().strip_prefix("data:")?.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }

    let event: T2aResponse = serde_json::from_str(payload).ok()?;
    let data = event.data?;
    if data.status == Some(STATUS_COMPLETE) || data.audio.is_empty() {
        return None;
    }
    hex::decode(data.audio).ok()
}

#[async_trait]
impl TtsProvider for MiniMaxProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn generate(&self, text: &str, voice: Option<&str>, language: &str) -> Result<AudioResult> {
        let voice = self.pick_voice(voice, language);
        let url = format!("{}/v1/t2a_v2?GroupId={}", self.base_url, self.group_id);
        let request = T2aRequest {
            model: MODEL,
            text,
            stream: self.mode.is_streamed(),
            voice_setting: VoiceSetting {
                voice_id: voice,
                speed: 1.0,
                vol: 1.0,
                pitch: 0,
            },
            audio_setting: self.mode.audio_setting(),
        };

        let start = Instant::now();
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Accept-Encoding", "gzip, deflate")
            .json(&request)
            .send()
            .await
            .map_err(|e| TtsBenchError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(error_body(self.name(), resp).await);
        }

        let (audio, ttfb_ms) = if self.mode.is_streamed() {
            self.read_events(resp, start).await?
        } else {
            (self.read_single(resp).await?, None)
        };
        let total_ms = elapsed_ms(start);

        if audio.is_empty() {
            return Err(TtsBenchError::Provider(format!("{} streamed no audio", self.name())));
        }
        debug!(mode = self.mode.display_name(), bytes = audio.len(), total_ms, "MiniMax response read");

        Ok(AudioResult {
            duration_seconds: self.mode.duration_seconds(&audio),
            audio_bytes: audio,
            format: self.mode.audio_format(),
            sample_rate: self.mode.sample_rate(),
            latency_ms: ttfb_ms.unwrap_or(total_ms),
            ttfb_ms,
            characters: text.chars().count(),
        })
    }
}
