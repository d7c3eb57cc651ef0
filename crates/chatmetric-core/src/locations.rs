//! S3 location conventions.
//!
//! Pure string functions with no AWS SDK dependency. These define how client
//! partitions, session ids, and result objects map onto S3 keys.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Suffix stripped from record object keys to form session ids.
pub const RECORD_SUFFIX: &str = ".json";

/// Name of the single Parquet object written per results location.
pub const RESULTS_OBJECT: &str = "part-00000.parquet";

/// A bucket plus key prefix, written `s3://bucket/prefix/`.
///
/// The prefix is empty or ends with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct S3Location {
    pub bucket: String,
    pub prefix: String,
}

impl S3Location {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: normalize_prefix(&prefix.into()),
        }
    }

    /// The per-client partition below this location: `{prefix}{client}/`.
    pub fn join_client(&self, client: &str) -> Self {
        Self::new(
            self.bucket.clone(),
            format!("{}{}", self.prefix, client.trim_matches('/')),
        )
    }

    /// Key of the results object inside this location.
    pub fn results_key(&self) -> String {
        format!("{}{RESULTS_OBJECT}", self.prefix)
    }

    /// Derive a session id from a record object key.
    ///
    /// The location prefix and the `.json` suffix are removed; whatever
    /// remains (possibly containing `/`) is the session id. Keys outside
    /// the prefix, keys without the suffix, and empty remainders yield `None`.
    pub fn session_id_for_key(&self, key: &str) -> Option<String> {
        let rest = key.strip_prefix(&self.prefix)?;
        let id = rest.strip_suffix(RECORD_SUFFIX)?;
        (!id.is_empty()).then(|| id.to_string())
    }
}

impl FromStr for S3Location {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .trim()
            .strip_prefix("s3://")
            .ok_or_else(|| CoreError::InvalidLocation(format!("{s}: expected s3:// scheme")))?;
        let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(CoreError::InvalidLocation(format!("{s}: missing bucket")));
        }
        Ok(Self::new(bucket, prefix))
    }
}

impl fmt::Display for S3Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.prefix)
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}
