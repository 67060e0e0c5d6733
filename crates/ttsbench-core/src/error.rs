use thiserror::Error;

#[derive(Error, Debug)]
pub enum TtsBenchError {
    #[error("Failed to initialize {provider}: {reason}")]
    ProviderInit { provider: String, reason: String },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("{provider} does not support {language}")]
    UnsupportedLanguage { provider: String, language: String },

    #[error("All iterations failed for {provider} on {sample_id}")]
    AllIterationsFailed { provider: String, sample_id: String },

    #[error("No providers initialized")]
    NoProviders,

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, TtsBenchError>;
