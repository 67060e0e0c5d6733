use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

pub const DEFAULT_LANGUAGES: &[&str] = &["en", "zh", "multilingual"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

impl BenchConfig {
    /// Load from a YAML file. Missing sections fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&raw)?;
        Ok(config)
    }

    pub fn results_path(&self) -> PathBuf {
        self.paths.results_path()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub iterations: u32,
    pub warmup_runs: u32,
    pub languages: Vec<String>,
    pub skip_existing: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            warmup_runs: 1,
            languages: DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect(),
            skip_existing: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub output_dir: PathBuf,
    pub samples_file: PathBuf,
}

impl PathsConfig {
    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join("metrics").join("benchmark_results.json")
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.output_dir.join("audio")
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            samples_file: PathBuf::from("config/test_texts.yaml"),
        }
    }
}
