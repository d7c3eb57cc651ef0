//! Session aggregation: flat event records → per-session conversations.
//!
//! Records are sorted by `(session_id, task, timestamp)` and then grouped.
//! Each task contributes at most one assistant message (the earliest) and
//! at most one user message (every user reply joined with a space, in
//! timestamp order, then trimmed). Tasks are ordered by the earliest
//! timestamp seen for them in the session.

use crate::models::message::{
    Conversation, RawMessage, Role, SessionMessage, cmp_timestamps,
};

/// Group raw records into one conversation per session, ordered by session id.
pub fn aggregate_sessions(mut records: Vec<RawMessage>) -> Vec<Conversation> {
    // `sort_by` is stable, so equal timestamps keep feed order.
    records.sort_by(|a, b| {
        a.session_id
            .cmp(&b.session_id)
            .then_with(|| a.task.cmp(&b.task))
            .then_with(|| cmp_timestamps(a.timestamp, b.timestamp))
    });

    records
        .chunk_by(|a, b| a.session_id == b.session_id)
        .map(build_conversation)
        .filter(|c| !c.is_empty())
        .collect()
}

/// Build the conversation for one session. `records` must be sorted.
fn build_conversation(records: &[RawMessage]) -> Conversation {
    let session_id = records
        .first()
        .map(|r| r.session_id.clone())
        .unwrap_or_default();

    let mut tasks: Vec<&[RawMessage]> = records.chunk_by(|a, b| a.task == b.task).collect();
    // Each chunk is timestamp-sorted, so its first record holds the task's
    // earliest timestamp. Ties fall back to task id via the stable sort.
    tasks.sort_by(|a, b| cmp_timestamps(a[0].timestamp, b[0].timestamp));

    let mut messages = Vec::with_capacity(tasks.len() * 2);
    for task_records in tasks {
        let task = &task_records[0].task;

        if let Some(first) = task_records.iter().find(|r| r.role == Role::Assistant) {
            messages.push(SessionMessage {
                session_id: session_id.clone(),
                role: Role::Assistant,
                content: first.content.clone(),
                task: task.clone(),
            });
        }

        let replies: Vec<&str> = task_records
            .iter()
            .filter(|r| r.role == Role::User)
            .map(|r| r.content.as_str())
            .collect();
        if !replies.is_empty() {
            messages.push(SessionMessage {
                session_id: session_id.clone(),
                role: Role::User,
                content: replies.join(" ").trim().to_string(),
                task: task.clone(),
            });
        }
    }

    Conversation {
        session_id,
        messages,
    }
}
