//! Batch Orchestrator.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use chatmetric_bedrock::scoring::ScoringClient;
use chatmetric_core::models::message::Conversation;
use chatmetric_core::models::score::{NoVerdictReason, ScoreHistogram, ScoreOutcome};
use chatmetric_core::models::session::ScoredSession;
use chatmetric_core::transcript::render;

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Why a conversation is absent from the batch output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoVerdict(NoVerdictReason),
    CallFailed(String),
    /// The scoring task panicked or was cancelled.
    Aborted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSession {
    pub session_id: String,
    pub reason: SkipReason,
}

/// Result of scoring one batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Graded sessions, in input order.
    pub sessions: Vec<ScoredSession>,
    pub histogram: ScoreHistogram,
    pub skipped: Vec<SkippedSession>,
}

/// Score every conversation, at most `concurrency` oracle calls at a time.
///
/// A conversation that yields no verdict, whose call fails, or whose task
/// panics is skipped and logged; the rest of the batch carries on.
/// Dropping the returned future cancels every outstanding oracle call.
pub async fn score_batch(
    client: &ScoringClient,
    system_prompt: &str,
    conversations: Vec<Conversation>,
    concurrency: usize,
) -> BatchReport {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let system_prompt: Arc<str> = Arc::from(system_prompt);
    let total = conversations.len();

    // Dropping the set aborts every task still queued or in flight.
    let mut tasks = JoinSet::new();
    let mut task_index = HashMap::with_capacity(total);
    let mut session_ids = Vec::with_capacity(total);

    for (index, conversation) in conversations.into_iter().enumerate() {
        let permits = Arc::clone(&permits);
        let client = client.clone();
        let system_prompt = Arc::clone(&system_prompt);
        session_ids.push(conversation.session_id.clone());

        let handle = tasks.spawn(async move {
            // Never closed.
            let _permit = permits.acquire_owned().await.ok();
            let transcript = render(&conversation);
            let outcome = client.score(&system_prompt, &transcript).await;
            (index, conversation, outcome)
        });
        task_index.insert(handle.id(), index);
    }

    let mut slots: Vec<Option<Result<(Conversation, ScoreOutcome), String>>> =
        (0..total).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, conversation, outcome)) => slots[index] = Some(Ok((conversation, outcome))),
            Err(e) => {
                if let Some(&index) = task_index.get(&e.id()) {
                    slots[index] = Some(Err(e.to_string()));
                }
            }
        }
    }

    let mut sessions = Vec::with_capacity(total);
    let mut skipped = Vec::new();

    for (session_id, slot) in session_ids.into_iter().zip(slots) {
        let reason = match slot {
            Some(Ok((conversation, ScoreOutcome::Scored(verdict)))) => {
                sessions.push(ScoredSession::from_conversation(&conversation, verdict));
                continue;
            }
            Some(Ok((_, ScoreOutcome::NoVerdict(reason)))) => {
                info!(session_id = %session_id, reason = %reason, "no verdict, session skipped");
                SkipReason::NoVerdict(reason)
            }
            Some(Ok((_, ScoreOutcome::CallError(message)))) => {
                warn!(session_id = %session_id, error = %message, "scoring call failed, session skipped");
                SkipReason::CallFailed(message)
            }
            Some(Err(message)) => {
                warn!(session_id = %session_id, error = %message, "scoring task aborted, session skipped");
                SkipReason::Aborted(message)
            }
            None => {
                warn!(session_id = %session_id, "scoring task vanished, session skipped");
                SkipReason::Aborted("task result missing".to_string())
            }
        };
        skipped.push(SkippedSession { session_id, reason });
    }

    let histogram = ScoreHistogram::from_sessions(&sessions, client.scale());

    BatchReport {
        sessions,
        histogram,
        skipped,
    }
}
