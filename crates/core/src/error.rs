#[derive(Debug, thiserror::Error)]
pub enum VeritasError {
    #[error("failed to create state directory: {0}")]
    StateDirCreation(std::io::Error),
    #[error("failed to write store file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read store file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to read config file: {0}")]
    ConfigRead(std::io::Error),
    #[error("failed to parse YAML config: {0}")]
    YamlDeserialization(serde_yaml::Error),

    #[error("store lock poisoned")]
    StorePoisoned,
    #[error("analysis payload is not valid JSON: {0}")]
    InvalidAnalysisJson(serde_json::Error),
    #[error("no analysis entry for address {0:?}")]
    MissingAnalysisEntry(String),
    #[error("analysis entry for {address:?} is malformed: {source}")]
    MalformedAnalysisEntry {
        address: String,
        source: serde_json::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type VeritasResult<T> = std::result::Result<T, VeritasError>;
