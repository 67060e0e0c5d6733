use serde::{Deserialize, Serialize};

/// Encoding of the bytes a provider hands back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// RIFF/WAV container
    #[default]
    Wav,
    /// Raw little-endian 16-bit mono PCM
    Pcm16,
    Mp3,
}

impl AudioFormat {
    pub fn label(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "WAV",
            AudioFormat::Pcm16 => "PCM 16-bit",
            AudioFormat::Mp3 => "MP3",
        }
    }
}

/// Output of a single provider call
#[derive(Debug, Clone, Default)]
pub struct AudioResult {
    pub audio_bytes: Vec<u8>,
    pub format: AudioFormat,
    pub sample_rate: u32,
    pub duration_seconds: f64,
    /// Wall-clock time for the call
    pub latency_ms: f64,
    /// Only set by streaming-capable calls
    pub ttfb_ms: Option<f64>,
    pub characters: usize,
}

impl AudioResult {
    /// Audio seconds produced per second of generation. >1 is faster than realtime.
    pub fn realtime_factor(&self) -> f64 {
        if self.latency_ms <= 0.0 {
            return 0.0;
        }
        self.duration_seconds / (self.latency_ms / 1000.0)
    }

    pub fn chars_per_second(&self) -> f64 {
        if self.latency_ms <= 0.0 {
            return 0.0;
        }
        self.characters as f64 / (self.latency_ms / 1000.0)
    }
}

/// Duration of raw 16-bit mono PCM
pub fn pcm16_duration_seconds(byte_len: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    byte_len as f64 / (sample_rate as f64 * 2.0)
}
