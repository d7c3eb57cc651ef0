//! chatmetric-engine
//!
//! Batch orchestration: fan a client's conversations out to the scoring
//! client, collect the graded sessions in input order, and hand the whole
//! batch to the result sink in one write.

pub mod batch;
pub mod error;
pub mod pipeline;

pub use batch::{BatchReport, SkipReason, SkippedSession, score_batch};
pub use error::PipelineError;
pub use pipeline::{
    ClientJob, ClientSummary, FailedClient, PipelineContext, RunSummary, load_conversations, run_all,
    run_client,
};
