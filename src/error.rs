use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifierError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Transaction for {0} did not settle after {1} attempts")]
    Conflict(String, u32),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, VerifierError>;
