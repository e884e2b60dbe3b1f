use thiserror::Error;

#[derive(Error, Debug)]
pub enum QualityCostError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("Chart error: {0}")]
    Chart(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, QualityCostError>;
