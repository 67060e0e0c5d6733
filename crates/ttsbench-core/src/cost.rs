//! Per-character pricing for every benchmarked provider mode.
//!
//! Prices are USD per one million characters. Streaming and non-streaming
//! modes of the same vendor are listed separately even when the price matches.

use serde::{Deserialize, Serialize};

/// (provider name, USD per 1M characters, notes)
pub const PRICE_TABLE: &[(&str, f64, &str)] = &[
    ("Azure TTS", 16.00, "en-US-AvaMultilingualNeural, non-streaming"),
    ("Azure Streaming", 16.00, "en-US-AvaMultilingualNeural, streaming"),
    ("ElevenLabs Standard", 165.00, "eleven_multilingual_v2, high quality"),
    ("ElevenLabs Turbo", 165.00, "eleven_turbo_v2_5, low latency"),
    ("MiniMax", 60.00, "speech-2.6-turbo, non-streaming"),
    ("MiniMax Streaming", 60.00, "speech-2.6-turbo, streaming MP3"),
    ("MiniMax PCM", 60.00, "speech-2.6-turbo, streaming PCM"),
    ("Qwen3-TTS", 10.00, "qwen3-tts-flash, non-streaming"),
    ("Qwen3-TTS Streaming", 10.00, "qwen3-tts-flash-realtime, streaming"),
    ("Qwen3-TTS (Self-Hosted)", 0.00, "Self-hosted GPU - compute cost only"),
    ("LuxTTS", 0.00, "Local CPU - no API cost"),
];

const CHARS_PER_MILLION: f64 = 1_000_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostProjection {
    pub provider: String,
    pub per_1k_chars: f64,
    pub monthly_100k: f64,
    pub monthly_500k: f64,
    pub monthly_1m: f64,
    pub notes: String,
}

pub struct CostEstimator;

impl CostEstimator {
    /// Unknown providers are treated as free.
    pub fn price_per_million(provider: &str) -> f64 {
        Self::entry(provider).map(|(_, price, _)| *price).unwrap_or(0.0)
    }

    pub fn notes(provider: &str) -> &'static str {
        Self::entry(provider).map(|(_, _, notes)| *notes).unwrap_or("")
    }

    pub fn cost(provider: &str, characters: usize) -> f64 {
        (characters as f64 / CHARS_PER_MILLION) * Self::price_per_million(provider)
    }

    pub fn projection(provider: &str) -> CostProjection {
        let price = Self::price_per_million(provider);
        let at = |chars: f64| (chars / CHARS_PER_MILLION) * price;

        CostProjection {
            provider: provider.to_string(),
            per_1k_chars: price / 1000.0,
            monthly_100k: at(100_000.0),
            monthly_500k: at(500_000.0),
            monthly_1m: at(1_000_000.0),
            notes: Self::notes(provider).to_string(),
        }
    }

    /// Projections for every priced provider, in table order
    pub fn all_projections() -> Vec<CostProjection> {
        PRICE_TABLE
            .iter()
            .map(|(name, _, _)| Self::projection(name))
            .collect()
    }

    /// Markdown comparison table of all projections
    pub fn comparison_table() -> String {
        let mut lines = vec![
            "| Provider | Per 1K chars | 100K/mo | 500K/mo | 1M/mo | Notes |".to_string(),
            "|----------|--------------|---------|---------|-------|-------|".to_string(),
        ];

        lines.extend(Self::all_projections().into_iter().map(|p| {
            format!(
                "| {} | ${:.4} | ${:.2} | ${:.2} | ${:.2} | {} |",
                p.provider, p.per_1k_chars, p.monthly_100k, p.monthly_500k, p.monthly_1m, p.notes
            )
        }));

        lines.join("\n")
    }

    fn entry(provider: &str) -> Option<&'static (&'static str, f64, &'static str)> {
        PRICE_TABLE.iter().find(|(name, _, _)| *name == provider)
    }
}
