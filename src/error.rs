use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid date in field '{field}': {value:?}")]
    InvalidDate { field: String, value: Option<String> },

    #[error("unknown granularity: {0}")]
    UnknownGranularity(String),

    #[error("unknown mapping mode: {0}")]
    UnknownMappingMode(String),

    #[error("invalid window: {0}")]
    InvalidWindow(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
