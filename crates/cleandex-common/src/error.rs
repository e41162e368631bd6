use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleandexError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("Report not found: {0}")]
    ReportNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CleandexError>;
