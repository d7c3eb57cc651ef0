//! Record Store Reader.
//!
//! Every object under a client prefix holds one session's events as
//! newline-delimited JSON. The session id comes from the object key, and
//! the stored `participant_id` / `question_id` fields are renamed to
//! `user_id` / `task` on the way in.

use aws_sdk_s3::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use chatmetric_core::BoxFuture;
use chatmetric_core::locations::S3Location;
use chatmetric_core::models::message::{RawMessage, Role, parse_event_timestamp};

use crate::error::StorageError;
use crate::objects;

/// Supplies raw event records for a storage location.
pub trait RecordSource: Send + Sync {
    fn read_records<'a>(
        &'a self,
        location: &'a S3Location,
    ) -> BoxFuture<'a, Result<Vec<RawMessage>, StorageError>>;
}

/// One stored event line, before attribution and validation.
#[derive(Debug, Deserialize)]
struct StoredEvent {
    #[serde(default)]
    role: Option<String>,
    #[serde(default, rename = "question_id", alias = "task")]
    task: Option<serde_json::Value>,
    #[serde(default, rename = "participant_id", alias = "user_id")]
    user_id: Option<serde_json::Value>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    timestamp: serde_json::Value,
}

/// Counters for one parse pass, logged by the reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub lines: usize,
    pub records: usize,
    pub malformed: usize,
    pub missing_role: usize,
    pub missing_task: usize,
    pub bad_timestamp: usize,
}

impl ParseStats {
    fn absorb(&mut self, other: ParseStats) {
        self.lines += other.lines;
        self.records += other.records;
        self.malformed += other.malformed;
        self.missing_role += other.missing_role;
        self.missing_task += other.missing_task;
        self.bad_timestamp += other.bad_timestamp;
    }
}

/// Parse one object body into records for `session_id`.
///
/// Blank lines are ignored and unparsable lines skipped. Records whose
/// role is missing, empty, or not `assistant`/`user` are dropped, as are
/// records without a task. A timestamp that cannot be read becomes `None`.
pub fn parse_records(session_id: &str, body: &[u8]) -> (Vec<RawMessage>, ParseStats) {
    let mut stats = ParseStats::default();
    let mut records = Vec::new();

    for line in String::from_utf8_lossy(body).lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        stats.lines += 1;

        let event: StoredEvent = match serde_json::from_str(line) {
            Ok(e) => e,
            Err(e) => {
                stats.malformed += 1;
                warn!(session_id, error = %e, "skipping unparsable record line");
                continue;
            }
        };

        let Some(role) = event.role.as_deref().and_then(Role::parse) else {
            stats.missing_role += 1;
            continue;
        };

        let Some(task) = event.task.as_ref().and_then(id_value) else {
            stats.missing_task += 1;
            continue;
        };

        let timestamp = match parse_event_timestamp(&event.timestamp) {
            Ok(ts) => ts,
            Err(e) => {
                stats.bad_timestamp += 1;
                debug!(session_id, error = %e, "unreadable timestamp, ordering record last");
                None
            }
        };

        records.push(RawMessage {
            session_id: session_id.to_string(),
            user_id: event.user_id.as_ref().and_then(id_value),
            role,
            task,
            content: event.content.unwrap_or_default(),
            timestamp,
        });
        stats.records += 1;
    }

    (records, stats)
}

/// Identifiers arrive as strings or numbers depending on the export.
fn id_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads `*.json` session objects from S3.
pub struct S3RecordSource {
    client: Client,
}

impl S3RecordSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn read(&self, location: &S3Location) -> Result<Vec<RawMessage>, StorageError> {
        let listed = objects::list_objects(&self.client, &location.bucket, &location.prefix).await?;

        let mut records = Vec::new();
        let mut stats = ParseStats::default();
        let mut sessions = 0usize;

        for object in &listed {
            let Some(session_id) = location.session_id_for_key(&object.key) else {
                debug!(key = %object.key, "ignoring non-record object");
                continue;
            };

            let body = objects::get_object(&self.client, &location.bucket, &object.key).await?;
            let (parsed, object_stats) = parse_records(&session_id, &body);
            debug!(
                key = %object.key,
                size = object.size,
                records = parsed.len(),
                "read session object"
            );

            records.extend(parsed);
            stats.absorb(object_stats);
            sessions += 1;
        }

        info!(
            location = %location,
            sessions,
            records = stats.records,
            malformed = stats.malformed,
            missing_role = stats.missing_role,
            missing_task = stats.missing_task,
            "records loaded"
        );

        Ok(records)
    }
}

impl RecordSource for S3RecordSource {
    fn read_records<'a>(
        &'a self,
        location: &'a S3Location,
    ) -> BoxFuture<'a, Result<Vec<RawMessage>, StorageError>> {
        Box::pin(self.read(location))
    }
}
