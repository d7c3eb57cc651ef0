use serde::{Deserialize, Serialize};

use super::message::{Conversation, Role};
use super::score::Verdict;

/// A task-agnostic `{role, content}` pair kept for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// A conversation that received a grade. This is the row written to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredSession {
    pub session_id: String,
    pub chat: Vec<ChatTurn>,
    pub score: u8,
}

impl ScoredSession {
    /// Flatten a graded conversation, dropping per-message task ids.
    pub fn from_conversation(conversation: &Conversation, verdict: Verdict) -> Self {
        let chat = conversation
            .messages
            .iter()
            .map(|m| ChatTurn {
                role: m.role,
                content: m.content.clone(),
            })
            .collect();

        Self {
            session_id: conversation.first_session_id().to_string(),
            chat,
            score: verdict.score(),
        }
    }
}
