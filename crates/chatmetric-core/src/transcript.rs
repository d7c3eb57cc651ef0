use std::fmt;
use std::fmt::Write as _;

use crate::models::message::Conversation;

/// The text submitted to the scoring oracle for one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transcript(String);

impl Transcript {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render a conversation as `msg{i} - {role}: {content}` lines.
///
/// `i` is the zero-based position in the conversation. Content is not
/// escaped; embedded newlines pass through as-is.
pub fn render(conversation: &Conversation) -> Transcript {
    let mut out = String::new();
    for (i, message) in conversation.messages.iter().enumerate() {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "msg{i} - {}: {}", message.role, message.content);
    }
    Transcript(out)
}
