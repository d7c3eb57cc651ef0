#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chatmetric_bedrock::error::BedrockError;
use chatmetric_bedrock::oracle::ScoringOracle;
use chatmetric_bedrock::scoring::ScoringClient;
use chatmetric_catalog::{CatalogError, CatalogTrigger, RefreshStatus};
use chatmetric_core::BoxFuture;
use chatmetric_core::locations::S3Location;
use chatmetric_core::models::message::{RawMessage, Role};
use chatmetric_core::models::session::ScoredSession;
use chatmetric_storage::error::StorageError;
use chatmetric_storage::records::RecordSource;
use chatmetric_storage::sink::{ResultSink, WriteReceipt};

type Reply = dyn Fn(&str) -> Result<String, BedrockError> + Send + Sync;

/// Oracle whose reply is computed from the user prompt.
pub struct FnOracle {
    reply: Box<Reply>,
    calls: AtomicUsize,
}

impl FnOracle {
    pub fn new(reply: impl Fn(&str) -> Result<String, BedrockError> + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ScoringOracle for FnOracle {
    fn complete<'a>(
        &'a self,
        _system: &'a str,
        user: &'a str,
    ) -> BoxFuture<'a, Result<String, BedrockError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = (self.reply)(user);
        Box::pin(async move { reply })
    }

    fn model_id(&self) -> &str {
        "fn-oracle"
    }
}

pub fn client_for(oracle: Arc<dyn ScoringOracle>) -> ScoringClient {
    ScoringClient::new(oracle)
}

pub fn record(session: &str, role: Role, task: &str, content: &str, second: i64) -> RawMessage {
    RawMessage {
        session_id: session.to_string(),
        user_id: None,
        role,
        task: task.to_string(),
        content: content.to_string(),
        timestamp: Some(jiff::Timestamp::from_second(second).unwrap()),
    }
}

/// Records keyed by location, with optionally failing locations.
#[derive(Default)]
pub struct MemorySource {
    records: HashMap<S3Location, Vec<RawMessage>>,
    failing: Vec<S3Location>,
    pub reads: AtomicUsize,
}

impl MemorySource {
    pub fn with(mut self, location: S3Location, records: Vec<RawMessage>) -> Self {
        self.records.insert(location, records);
        self
    }

    pub fn failing_at(mut self, location: S3Location) -> Self {
        self.failing.push(location);
        self
    }
}

impl RecordSource for MemorySource {
    fn read_records<'a>(
        &'a self,
        location: &'a S3Location,
    ) -> BoxFuture<'a, Result<Vec<RawMessage>, StorageError>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let result = if self.failing.contains(location) {
            Err(StorageError::ListObjects(format!("access denied: {location}")))
        } else {
            Ok(self.records.get(location).cloned().unwrap_or_default())
        };
        Box::pin(async move { result })
    }
}

/// Result store that replaces a location's content on every write.
#[derive(Default)]
pub struct MemorySink {
    pub stored: Mutex<HashMap<S3Location, Vec<ScoredSession>>>,
    failing: Vec<S3Location>,
    pub writes: AtomicUsize,
}

impl MemorySink {
    pub fn failing_at(mut self, location: S3Location) -> Self {
        self.failing.push(location);
        self
    }

    pub fn get(&self, location: &S3Location) -> Option<Vec<ScoredSession>> {
        self.stored.lock().unwrap().get(location).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.stored.lock().unwrap().is_empty()
    }
}

impl ResultSink for MemorySink {
    fn write_results<'a>(
        &'a self,
        location: &'a S3Location,
        sessions: &'a [ScoredSession],
    ) -> BoxFuture<'a, Result<WriteReceipt, StorageError>> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let result = if self.failing.contains(location) {
            Err(StorageError::PutObject("service unavailable".to_string()))
        } else {
            self.stored
                .lock()
                .unwrap()
                .insert(location.clone(), sessions.to_vec());
            Ok(WriteReceipt {
                key: location.results_key(),
                etag: String::new(),
                rows: sessions.len(),
                bytes: 0,
                stale_left: 0,
            })
        };
        Box::pin(async move { result })
    }
}

pub struct FakeTrigger {
    fail: bool,
    pub calls: AtomicUsize,
}

impl FakeTrigger {
    pub fn ok() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CatalogTrigger for FakeTrigger {
    fn refresh(&self) -> BoxFuture<'_, Result<RefreshStatus, CatalogError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = if self.fail {
            Err(CatalogError::Glue("crawler quota exceeded".to_string()))
        } else {
            Ok(RefreshStatus::Started)
        };
        Box::pin(async move { result })
    }
}
