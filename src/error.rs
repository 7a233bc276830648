use thiserror::Error;

#[derive(Error, Debug)]
pub enum FarmReportError {
    #[error("Dashboard data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Invalid {entity} record {id}: {details}")]
    InvalidRecord {
        entity: &'static str,
        id: String,
        details: String,
    },

    #[error("Unknown report type: {0}")]
    UnknownReportType(String),

    #[error("Date parsing error: {0}")]
    DateError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl FarmReportError {
    /// Whether retrying the load may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::DataUnavailable(_) | Self::Io(_) => true,
            #[cfg(feature = "http")]
            Self::Http(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FarmReportError>;
