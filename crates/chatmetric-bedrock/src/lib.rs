//! chatmetric-bedrock
//!
//! The scoring oracle (Bedrock Converse) and the Scoring Client that
//! drives it: bounded wait, retry with backoff, verdict extraction.

pub mod error;
pub mod oracle;
pub mod scoring;
