pub mod audio_store;
pub mod providers;
pub mod runner;
pub mod sample_loader;
pub mod sampler;
pub mod store;

#[cfg(test)]
mod fake;

pub use audio_store::{normalize_provider_dir, wav_duration_seconds, AudioStore};
pub use providers::{catalog, create_provider, PROVIDER_KEYS};
pub use runner::{BenchmarkRunner, RunOptions, RunOutcome};
pub use sample_loader::{load_samples, parse_samples};
pub use sampler::LatencySampler;
pub use store::ResultsStore;
