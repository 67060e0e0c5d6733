//! Audio artifacts on disk: one WAV per (provider, sample).
//!
//! Layout: `<root>/<normalized provider name>/<sample_id>.wav`

use std::io::Cursor;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use ttsbench_core::{AudioFormat, AudioResult, Result, TtsBenchError};

#[derive(Debug, Clone)]
pub struct AudioStore {
    root: PathBuf,
}

/// Lowercase, spaces to underscores, hyphens dropped
pub fn normalize_provider_dir(name: &str) -> String {
    name.to_lowercase().replace(' ', "_").replace('-', "")
}

impl AudioStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, provider_name: &str, sample_id: &str) -> PathBuf {
        self.root
            .join(normalize_provider_dir(provider_name))
            .join(format!("{}.wav", sample_id))
    }

    pub fn exists(&self, provider_name: &str, sample_id: &str) -> bool {
        self.path_for(provider_name, sample_id).exists()
    }

    pub fn save(&self, provider_name: &str, sample_id: &str, result: &AudioResult) -> Result<PathBuf> {
        let path = self.path_for(provider_name, sample_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        match result.format {
            AudioFormat::Wav => write_then_rename(&path, |tmp| {
                std::fs::write(tmp, &result.audio_bytes).map_err(TtsBenchError::from)
            })?,
            AudioFormat::Pcm16 => write_then_rename(&path, |tmp| {
                write_pcm16(tmp, &result.audio_bytes, result.sample_rate)
            })?,
            AudioFormat::Mp3 => {
                let decoded = decode_with_symphonia(&result.audio_bytes, "mp3")?;
                write_then_rename(&path, |tmp| write_f32(tmp, &decoded))?;
            }
        }

        debug!("Saved {} audio to {:?}", result.format.label(), path);
        Ok(path)
    }
}

/// Duration of an in-memory WAV payload
pub fn wav_duration_seconds(bytes: &[u8]) -> Result<f64> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| TtsBenchError::Audio(e.to_string()))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Ok(0.0);
    }
    Ok(reader.duration() as f64 / spec.sample_rate as f64)
}

/// Write through a `.part` sibling so `path` only ever holds a complete file
fn write_then_rename(path: &Path, write: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
    let tmp = path.with_extension("wav.part");
    if let Err(e) = write(&tmp) {
        if let Err(rm) = std::fs::remove_file(&tmp) {
            debug!("No partial file to remove at {:?}: {}", tmp, rm);
        }
        return Err(e);
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn i16_spec(sample_rate: u32, channels: u16) -> hound::WavSpec {
    hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

fn write_pcm16(path: &Path, bytes: &[u8], sample_rate: u32) -> Result<()> {
    let mut writer = hound::WavWriter::create(path, i16_spec(sample_rate, 1))
        .map_err(|e| TtsBenchError::Audio(e.to_string()))?;

    for pair in bytes.chunks_exact(2) {
        writer
            .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
            .map_err(|e| TtsBenchError::Audio(e.to_string()))?;
    }

    writer
        .finalize()
        .map_err(|e| TtsBenchError::Audio(e.to_string()))
}

struct DecodedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

fn write_f32(path: &Path, audio: &DecodedAudio) -> Result<()> {
    let spec = i16_spec(audio.sample_rate, audio.channels);
    let mut writer =
        hound::WavWriter::create(path, spec).map_err(|e| TtsBenchError::Audio(e.to_string()))?;

    for s in &audio.samples {
        let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(v)
            .map_err(|e| TtsBenchError::Audio(e.to_string()))?;
    }

    writer
        .finalize()
        .map_err(|e| TtsBenchError::Audio(e.to_string()))
}

fn decode_with_symphonia(bytes: &[u8], ext: &str) -> Result<DecodedAudio> {
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::DecoderOptions;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let mut hint = Hint::new();
    hint.with_extension(ext);

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| TtsBenchError::Audio(e.to_string()))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| TtsBenchError::Audio("No audio track found".into()))?;

    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(1) as u16;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| TtsBenchError::Audio(e.to_string()))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(e) => {
                warn!("Error reading packet: {}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                warn!("Error decoding packet: {}", e);
                continue;
            }
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channels = spec.channels.count() as u16;

        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        samples.extend(buf.samples());
    }

    if samples.is_empty() || sample_rate == 0 {
        return Err(TtsBenchError::Audio("Decoded no audio frames".into()));
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pcm_result(samples: &[i16], sample_rate: u32) -> AudioResult {
        AudioResult {
            audio_bytes: samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
            format: AudioFormat::Pcm16,
            sample_rate,
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_provider_dir() {
        assert_eq!(normalize_provider_dir("Azure TTS"), "azure_tts");
        assert_eq!(normalize_provider_dir("Qwen3-TTS Streaming"), "qwen3tts_streaming");
        assert_eq!(normalize_provider_dir("ElevenLabs Turbo"), "elevenlabs_turbo");
    }

    #[test]
    fn test_path_layout() {
        let store = AudioStore::new("/out/audio");
        assert_eq!(
            store.path_for("MiniMax PCM", "basic"),
            PathBuf::from("/out/audio/minimax_pcm/basic.wav")
        );
    }

    #[test]
    fn test_pcm_is_wrapped_as_wav() {
        let dir = TempDir::new().unwrap();
        let store = AudioStore::new(dir.path());
        let samples: Vec<i16> = (0..2400).map(|i| (i % 100) as i16).collect();

        let path = store.save("Azure TTS", "s1", &pcm_result(&samples, 24000)).unwrap();
        assert!(store.exists("Azure TTS", "s1"));

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 24000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.duration(), 2400);
        let read: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);
    }

    #[test]
    fn test_wav_written_verbatim_and_duration() {
        let dir = TempDir::new().unwrap();
        let store = AudioStore::new(dir.path());

        // Build a WAV in memory via the PCM path, then feed it back as WAV
        let wav_path = store.save("Tmp", "src", &pcm_result(&[0; 12000], 24000)).unwrap();
        let wav_bytes = std::fs::read(&wav_path).unwrap();
        assert!((wav_duration_seconds(&wav_bytes).unwrap() - 0.5).abs() < 1e-9);

        let result = AudioResult {
            audio_bytes: wav_bytes.clone(),
            format: AudioFormat::Wav,
            sample_rate: 24000,
            ..Default::default()
        };
        let path = store.save("Other", "s1", &result).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), wav_bytes);
    }

    #[test]
    fn test_garbage_mp3_is_an_audio_error() {
        let dir = TempDir::new().unwrap();
        let store = AudioStore::new(dir.path());
        let result = AudioResult {
            audio_bytes: vec![1, 2, 3, 4],
            format: AudioFormat::Mp3,
            ..Default::default()
        };
        assert!(matches!(
            store.save("MiniMax", "s1", &result),
            Err(TtsBenchError::Audio(_))
        ));
    }

    /// MPEG-1 Layer III, 128 kbps, 44.1 kHz, mono, with silent side info
    fn silent_mp3(frames: usize) -> Vec<u8> {
        let mut frame = vec![0u8; 417];
        frame[..4].copy_from_slice(&[0xff, 0xfb, 0x90, 0xc4]);
        frame.repeat(frames)
    }

    #[test]
    fn test_mp3_is_decoded_to_wav() {
        let dir = TempDir::new().unwrap();
        let store = AudioStore::new(dir.path());
        let result = AudioResult {
            audio_bytes: silent_mp3(20),
            format: AudioFormat::Mp3,
            sample_rate: 32000,
            ..Default::default()
        };

        let path = store.save("MiniMax Streaming", "s1", &result).unwrap();
        assert!(path.ends_with("minimax_streaming/s1.wav"));

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 44100);
        assert_eq!(reader.spec().channels, 1);
        assert!(reader.duration() > 0);
        assert!(!path.with_extension("wav.part").exists());
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s1.wav");

        let err = write_then_rename(&path, |tmp| {
            std::fs::write(tmp, b"RIFF").unwrap();
            Err(TtsBenchError::Audio("disk full".into()))
        })
        .unwrap_err();

        assert!(matches!(err, TtsBenchError::Audio(_)));
        assert!(!path.exists());
        assert!(!path.with_extension("wav.part").exists());
    }

    #[test]
    fn test_failed_save_is_not_counted_as_done() {
        let dir = TempDir::new().unwrap();
        let store = AudioStore::new(dir.path());
        let result = AudioResult {
            audio_bytes: vec![1, 2, 3, 4],
            format: AudioFormat::Mp3,
            ..Default::default()
        };
        assert!(store.save("MiniMax Streaming", "s1", &result).is_err());
        assert!(!store.exists("MiniMax Streaming", "s1"));
    }

    #[test]
    fn test_missing_file_does_not_exist() {
        let dir = TempDir::new().unwrap();
        assert!(!AudioStore::new(dir.path()).exists("Azure TTS", "nope"));
    }
}
