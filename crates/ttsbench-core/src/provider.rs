use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::sample::is_chinese_variant;
use crate::{AudioResult, Result};

/// Static description of a provider mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Display name; also the price-table key
    pub name: String,
    pub pricing_per_1m_chars: f64,
    pub supported_languages: Vec<String>,
    #[serde(default)]
    pub default_voice_en: String,
    #[serde(default)]
    pub default_voice_zh: String,
    #[serde(default)]
    pub supports_streaming: bool,
}

impl ProviderConfig {
    pub fn new(name: &str, pricing_per_1m_chars: f64, languages: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            pricing_per_1m_chars,
            supported_languages: languages.iter().map(|s| s.to_string()).collect(),
            default_voice_en: String::new(),
            default_voice_zh: String::new(),
            supports_streaming: false,
        }
    }

    pub fn with_voices(mut self, en: &str, zh: &str) -> Self {
        self.default_voice_en = en.to_string();
        self.default_voice_zh = zh.to_string();
        self
    }

    pub fn streaming(mut self) -> Self {
        self.supports_streaming = true;
        self
    }
}

/// Capability contract every TTS backend satisfies
#[async_trait]
pub trait TtsProvider: Send + Sync {
    fn config(&self) -> &ProviderConfig;

    fn name(&self) -> &str {
        &self.config().name
    }

    fn supports_language(&self, language: &str) -> bool {
        self.config()
            .supported_languages
            .iter()
            .any(|l| l == language)
    }

    fn default_voice(&self, language: &str) -> &str {
        let config = self.config();
        if is_chinese_variant(language) {
            return &config.default_voice_zh;
        }
        &config.default_voice_en
    }

    fn estimate_cost(&self, characters: usize) -> f64 {
        (characters as f64 / 1_000_000.0) * self.config().pricing_per_1m_chars
    }

    /// Synthesize `text`, timing the call
    async fn generate(&self, text: &str, voice: Option<&str>, language: &str)
        -> Result<AudioResult>;

    /// Audio as it arrives. Providers without a streaming endpoint yield the
    /// full payload as a single chunk.
    async fn generate_stream(
        &self,
        text: &str,
        voice: Option<&str>,
        language: &str,
    ) -> Result<Vec<Bytes>> {
        let result = self.generate(text, voice, language).await?;
        Ok(vec![Bytes::from(result.audio_bytes)])
    }
}
