use thiserror::Error;

/// Failures that abort one pipeline call. Everything else (unmatched roles,
/// unparseable cells, bad dates) is absorbed with a default.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported file format: {0} (expected .csv or .json)")]
    UnsupportedFormat(String),

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("file is {size} bytes, above the {limit} byte upload limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(String),

    #[error("serialization failed: {0}")]
    Serialize(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
