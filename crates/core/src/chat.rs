//! Chat message domain types.
//!
//! A message is a speaker prefix plus text content. The prefix is how the
//! assistant's own messages are told apart from everyone else's: history
//! rendering labels every message with it, and chat-style prompt assembly
//! maps a message whose prefix equals the assistant's name onto the
//! assistant role. Insertion order is chronological and meaningful.

use serde::{Deserialize, Serialize};

/// A single message in a conversation, tagged with its speaker prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker prefix (e.g. "Zach", "Samantha"). May be empty.
    pub prefix: String,

    /// The text content.
    pub content: String,
}

impl ChatMessage {
    /// Create a new message.
    pub fn new(prefix: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            content: content.into(),
        }
    }
}

/// Render messages as a plain-text transcript.
///
/// Each message renders as `"prefix: content"`, blocks separated by blank
/// lines. When the first message carries an empty prefix, prefixes are
/// omitted for the whole transcript.
pub fn render_transcript(messages: &[ChatMessage]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    if messages[0].prefix.is_empty() {
        messages
            .iter()
            .map(|m| m.content.clone())
            .collect::<Vec<_>>()
            .join("\n\n")
    } else {
        messages
            .iter()
            .map(|m| format!("{}: {}", m.prefix, m.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
