use std::path::Path;

use ttsbench_core::{Result, SampleSet, TextSample, TtsBenchError};

/// Load `samples` and `long_samples` from a test-text YAML file, short
/// samples first.
pub fn load_samples(path: &Path) -> Result<Vec<TextSample>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| TtsBenchError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
    parse_samples(&content)
}

pub fn parse_samples(content: &str) -> Result<Vec<TextSample>> {
    let set: SampleSet = serde_yaml::from_str(content)?;
    Ok(set.into_samples())
}
