//! chatmetric-core
//!
//! Pure domain types and transforms: session aggregation, transcript
//! rendering, verdict parsing, and S3 location conventions.
//! No AWS SDK dependency. This is the shared vocabulary of the workspace.

pub mod aggregate;
pub mod error;
pub mod locations;
pub mod models;
pub mod rubric;
pub mod transcript;
pub mod verdict;

use std::future::Future;
use std::pin::Pin;

/// Boxed `Send` future returned by the workspace's I/O traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
