use serde::{Deserialize, Serialize};

fn default_category() -> String {
    "general".to_string()
}

/// One input text to synthesize
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSample {
    pub id: String,
    pub text: String,
    pub language: String,
    #[serde(default = "default_category")]
    pub category: String,
}

impl TextSample {
    pub fn new(id: &str, text: &str, language: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            language: language.to_string(),
            category: default_category(),
        }
    }

    /// Character count used for cost and throughput
    pub fn characters(&self) -> usize {
        self.text.chars().count()
    }
}

/// Test-text document: short samples plus long-form samples
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleSet {
    #[serde(default)]
    pub samples: Vec<TextSample>,
    #[serde(default)]
    pub long_samples: Vec<TextSample>,
}

impl SampleSet {
    pub fn into_samples(self) -> Vec<TextSample> {
        let mut all = self.samples;
        all.extend(self.long_samples);
        all
    }
}

/// `zh`, `zh-CN`, `zh-TW`, ...
pub fn is_chinese_variant(language: &str) -> bool {
    language.starts_with("zh")
}
