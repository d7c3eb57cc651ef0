use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("columnar encoding error: {0}")]
    Encode(String),

    #[error("S3 GetObject error: {0}")]
    GetObject(String),

    #[error("S3 PutObject error: {0}")]
    PutObject(String),

    #[error("S3 DeleteObject error: {0}")]
    DeleteObject(String),

    #[error("S3 ListObjects error: {0}")]
    ListObjects(String),
}

impl From<arrow_schema::ArrowError> for StorageError {
    fn from(e: arrow_schema::ArrowError) -> Self {
        StorageError::Encode(e.to_string())
    }
}

impl From<parquet::errors::ParquetError> for StorageError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        StorageError::Encode(e.to_string())
    }
}
