use thiserror::Error;

use chatmetric_storage::error::StorageError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("reading records failed: {0}")]
    Read(#[source] StorageError),

    #[error("writing results failed: {0}")]
    Write(#[source] StorageError),
}
