//! Result Sink.
//!
//! A batch is written as a single object with one `PutObject`, so readers
//! see either the previous results or the complete new ones. Objects left
//! over from earlier runs are removed only after the new object landed.

use aws_sdk_s3::Client;
use tracing::{info, warn};

use chatmetric_core::BoxFuture;
use chatmetric_core::locations::S3Location;
use chatmetric_core::models::session::ScoredSession;

use crate::columnar;
use crate::error::StorageError;
use crate::objects;

/// Persists one batch of scored sessions, replacing prior content.
pub trait ResultSink: Send + Sync {
    fn write_results<'a>(
        &'a self,
        location: &'a S3Location,
        sessions: &'a [ScoredSession],
    ) -> BoxFuture<'a, Result<WriteReceipt, StorageError>>;
}

/// What a successful write produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub key: String,
    pub etag: String,
    pub rows: usize,
    pub bytes: usize,
    /// Stale objects that could not be removed after the write.
    pub stale_left: usize,
}

/// Writes Parquet results to S3.
pub struct S3ParquetSink {
    client: Client,
}

impl S3ParquetSink {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn write(
        &self,
        location: &S3Location,
        sessions: &[ScoredSession],
    ) -> Result<WriteReceipt, StorageError> {
        let body = columnar::encode_sessions(sessions)?;
        let bytes = body.len();
        let key = location.results_key();

        let etag = objects::put_object(
            &self.client,
            &location.bucket,
            &key,
            body,
            columnar::CONTENT_TYPE,
        )
        .await?;

        let stale_left = self.remove_stale(location, &key).await;

        info!(
            bucket = %location.bucket,
            key = %key,
            rows = sessions.len(),
            bytes,
            "results written"
        );

        Ok(WriteReceipt {
            key,
            etag,
            rows: sessions.len(),
            bytes,
            stale_left,
        })
    }

    /// Delete everything under the location except `keep`. Returns the
    /// number of objects that could not be removed.
    async fn remove_stale(&self, location: &S3Location, keep: &str) -> usize {
        let listed =
            match objects::list_objects(&self.client, &location.bucket, &location.prefix).await {
                Ok(listed) => listed,
                Err(e) => {
                    warn!(location = %location, error = %e, "could not list stale results");
                    return 0;
                }
            };

        let mut left = 0;
        for object in listed.iter().filter(|o| o.key != keep) {
            if let Err(e) = objects::delete_object(&self.client, &location.bucket, &object.key).await {
                warn!(key = %object.key, error = %e, "could not delete stale result object");
                left += 1;
            }
        }
        left
    }
}

impl ResultSink for S3ParquetSink {
    fn write_results<'a>(
        &'a self,
        location: &'a S3Location,
        sessions: &'a [ScoredSession],
    ) -> BoxFuture<'a, Result<WriteReceipt, StorageError>> {
        Box::pin(self.write(location, sessions))
    }
}
