// Domain modules
pub mod audio;
pub mod benchmark;
pub mod config;
pub mod cost;
pub mod error;
pub mod metrics;
pub mod provider;
pub mod sample;
pub mod snapshot;

pub use audio::{pcm16_duration_seconds, AudioFormat, AudioResult};
pub use benchmark::{BenchmarkResult, ProviderBenchmark};
pub use config::{BenchConfig, DefaultsConfig, PathsConfig, DEFAULT_LANGUAGES};
pub use cost::{CostEstimator, CostProjection, PRICE_TABLE};
pub use error::{Result, TtsBenchError};
pub use metrics::LatencyStats;
pub use provider::{ProviderConfig, TtsProvider};
pub use sample::{is_chinese_variant, SampleSet, TextSample};
pub use snapshot::{PersistedSnapshot, ProviderEntry};
