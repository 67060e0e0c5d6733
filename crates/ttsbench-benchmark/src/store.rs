use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ttsbench_core::{PersistedSnapshot, ProviderBenchmark, Result};

/// Flat JSON results file, read once at startup and rewritten on save.
///
/// Saving merges into the snapshot that was loaded: providers from the
/// current run replace their entries, every other provider is carried through.
pub struct ResultsStore {
    path: PathBuf,
    loaded: PersistedSnapshot,
}

impl ResultsStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let loaded = Self::load(&path);
        Self { path, loaded }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> &PersistedSnapshot {
        &self.loaded
    }

    /// Never fails: a missing or unreadable file is an empty snapshot.
    pub fn load(path: &Path) -> PersistedSnapshot {
        if !path.exists() {
            return PersistedSnapshot::default();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Could not read existing results {:?}: {}", path, e);
                return PersistedSnapshot::default();
            }
        };

        match serde_json::from_str::<PersistedSnapshot>(&content) {
            Ok(snapshot) => {
                tracing::info!(
                    "Loaded existing results from {:?} ({} providers)",
                    path,
                    snapshot.providers.len()
                );
                snapshot
            }
            Err(e) => {
                tracing::warn!("Could not parse existing results {:?}: {}", path, e);
                PersistedSnapshot::default()
            }
        }
    }

    /// Previous providers overlaid with the current run's providers
    pub fn merge(
        previous: &PersistedSnapshot,
        current: &BTreeMap<String, ProviderBenchmark>,
        iterations: u32,
        timestamp: String,
    ) -> Result<PersistedSnapshot> {
        let mut merged = PersistedSnapshot {
            timestamp,
            iterations,
            providers: previous.providers.clone(),
        };

        for (key, benchmark) in current {
            merged.insert(key, benchmark)?;
        }

        Ok(merged)
    }

    pub fn save(
        &self,
        current: &BTreeMap<String, ProviderBenchmark>,
        iterations: u32,
    ) -> Result<PathBuf> {
        let timestamp = chrono::Local::now().to_rfc3339();
        let merged = Self::merge(&self.loaded, current, iterations, timestamp)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&merged)?;
        std::fs::write(&self.path, json)?;

        tracing::info!(
            "Results saved to {:?} ({} providers, {} updated)",
            self.path,
            merged.providers.len(),
            current.len()
        );
        Ok(self.path.clone())
    }
}
