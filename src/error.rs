use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to decode GitLab response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GitLab API returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Timed out waiting for pipeline {pipeline_id} to finish")]
    Timeout { pipeline_id: u64 },

    #[error("Stopped waiting for pipeline {pipeline_id}")]
    Cancelled { pipeline_id: u64 },
}

impl TriggerError {
    /// HTTP status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TriggerError>;
