use std::time::Instant;

use async_trait::async_trait;
use ttsbench_core::{
    is_chinese_variant, pcm16_duration_seconds, AudioFormat, AudioResult, ProviderConfig, Result,
    TtsBenchError, TtsProvider,
};

use super::{elapsed_ms, error_body, http_client, read_timed, required_env};
use crate::audio_store::wav_duration_seconds;

const OUTPUT_FORMAT: &str = "riff-24khz-16bit-mono-pcm";
const SAMPLE_RATE: u32 = 24000;
const MULTILINGUAL_VOICE: &str = "en-US-JennyMultilingualNeural";

/// How the synthesis response is consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AzureMode {
    /// Wait for the whole body; latency is the full request
    Standard,
    /// Read the body as it arrives; latency is time to first audio chunk
    Streaming,
}

impl AzureMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            AzureMode::Standard => "Azure TTS",
            AzureMode::Streaming => "Azure Streaming",
        }
    }

    pub fn provider_config(&self) -> ProviderConfig {
        let config = ProviderConfig::new(
            self.display_name(),
            16.00,
            &["en", "zh", "es", "fr", "de", "ja", "ko", "multilingual"],
        )
        .with_voices("en-US-JennyNeural", "zh-CN-XiaoxiaoNeural");
        match self {
            AzureMode::Standard => config,
            AzureMode::Streaming => config.streaming(),
        }
    }
}

/// Azure Cognitive Services speech synthesis over REST
pub struct AzureTtsProvider {
    config: ProviderConfig,
    mode: AzureMode,
    endpoint: String,
    key: String,
    client: reqwest::Client,
}

impl AzureTtsProvider {
    /// `AZURE_SPEECH_KEY` is required, `AZURE_SPEECH_REGION` defaults to eastus
    pub fn from_env(mode: AzureMode) -> Result<Self> {
        let key = required_env(mode.display_name(), "AZURE_SPEECH_KEY")?;
        let region = std::env::var("AZURE_SPEECH_REGION").unwrap_or_else(|_| "eastus".to_string());
        Self::new(mode, &key, &format!("https://{}.tts.speech.microsoft.com", region))
    }

    pub fn new(mode: AzureMode, key: &str, endpoint: &str) -> Result<Self> {
        Ok(Self {
            config: mode.provider_config(),
            mode,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key: key.to_string(),
            client: http_client(mode.display_name())?,
        })
    }

    fn pick_voice(&self, voice: Option<&str>, language: &str) -> String {
        if language == "multilingual" {
            return MULTILINGUAL_VOICE.to_string();
        }
        voice.unwrap_or_else(|| self.default_voice(language)).to_string()
    }
}

#[async_trait]
impl TtsProvider for AzureTtsProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn generate(&self, text: &str, voice: Option<&str>, language: &str) -> Result<AudioResult> {
        let voice = self.pick_voice(voice, language);
        let url = format!("{}/cognitiveservices/v1", self.endpoint);
        let body = ssml(text, &voice, language);

        let start = Instant::now();
        let resp = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .header("User-Agent", "ttsbench")
            .body(body)
            .send()
            .await
            .map_err(|e| TtsBenchError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(error_body(self.name(), resp).await);
        }

        let (audio, ttfb_ms, latency_ms) = match self.mode {
            AzureMode::Standard => {
                let audio = resp
                    .bytes()
                    .await
                    .map_err(|e| TtsBenchError::Http(e.to_string()))?;
                (audio.to_vec(), None, elapsed_ms(start))
            }
            AzureMode::Streaming => {
                let (audio, ttfb_ms) = read_timed(resp, start).await?;
                let total_ms = elapsed_ms(start);
                (audio, ttfb_ms, ttfb_ms.unwrap_or(total_ms))
            }
        };

        let duration_seconds = wav_duration_seconds(&audio)
            .unwrap_or_else(|_| pcm16_duration_seconds(audio.len(), SAMPLE_RATE));

        Ok(AudioResult {
            audio_bytes: audio,
            format: AudioFormat::Wav,
            sample_rate: SAMPLE_RATE,
            duration_seconds,
            latency_ms,
            ttfb_ms,
            characters: text.chars().count(),
        })
    }
}

fn ssml(text: &str, voice: &str, language: &str) -> String {
    let lang = if is_chinese_variant(language) { "zh-CN" } else { "en-US" };
    format!(
        "<speak version='1.0' xml:lang='{}'><voice name='{}'>{}</voice></speak>",
        lang,
        voice,
        xml_escape(text)
    )
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
