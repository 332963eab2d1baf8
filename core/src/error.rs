use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Data unavailable at '{path}': {reason}")]
    DataUnavailable { path: String, reason: String },

    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("Unknown month '{label}'")]
    UnknownMonth { label: String },

    #[error("View '{name}' not found")]
    UnknownView { name: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DashResult<T> = Result<T, DashError>;
