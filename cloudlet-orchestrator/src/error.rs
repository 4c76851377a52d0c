use thiserror::Error;

pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Faults raised by a compute backend implementation.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    #[error("Backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Backend transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend error: {0}")]
    Other(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Server not found: {0}")]
    NotFound(String),

    #[error("Backend failure: {0}")]
    Backend(#[from] BackendError),

    #[error("Request cancelled")]
    Cancelled,
}

impl OrchestratorError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        OrchestratorError::InvalidArgument(msg.into())
    }
}
