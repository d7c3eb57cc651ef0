use thiserror::Error;

#[derive(Debug, Error)]
pub enum BedrockError {
    #[error("model invocation failed: {0}")]
    Invocation(String),

    #[error("model invocation throttled: {0}")]
    Throttled(String),

    #[error("transient model failure: {0}")]
    Transient(String),

    #[error("response parsing failed: {0}")]
    ResponseParse(String),
}

impl BedrockError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BedrockError::Throttled(_) | BedrockError::Transient(_))
    }
}
