use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid storage location: {0}")]
    InvalidLocation(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
