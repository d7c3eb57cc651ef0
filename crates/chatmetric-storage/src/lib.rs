//! chatmetric-storage
//!
//! S3 operations: the newline-delimited JSON record reader and the
//! Parquet result sink. Thin wrapper around the AWS S3 SDK.

pub mod client;
pub mod columnar;
pub mod error;
pub mod objects;
pub mod records;
pub mod sink;
