use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Prediction error: {0}")]
    Prediction(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type TriageResult<T> = Result<T, TriageError>;
