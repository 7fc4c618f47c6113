//! Chat history with a character budget and long-term-memory spill.
//!
//! History is an ordered message sequence. After each turn the user input
//! and assistant reply are appended; while the rendered transcript exceeds
//! the budget, the oldest message is removed and stored in long-term
//! memory as `"prefix: content"` so nothing is ever silently lost.
//!
//! Persistence is a JSON file so sessions can pick up where they left off.

use lorekeep_core::chat::{ChatMessage, render_transcript};
use lorekeep_core::error::Error;
use lorekeep_core::memory::MemoryStore;
use std::path::Path;
use tracing::{debug, warn};

/// The conversation's rolling window.
#[derive(Debug, Clone)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
    max_chars: usize,
}

impl ChatHistory {
    /// Create an empty history with the given character budget.
    pub fn new(max_chars: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_chars,
        }
    }

    /// Create a history from existing messages.
    pub fn with_messages(messages: Vec<ChatMessage>, max_chars: usize) -> Self {
        Self {
            messages,
            max_chars,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Render the full transcript.
    pub fn render(&self) -> String {
        render_transcript(&self.messages)
    }

    /// Append a completed turn, then trim to budget.
    ///
    /// Oldest messages over the budget are removed and spilled into the
    /// memory store. Spill failures are logged, not fatal.
    pub async fn push_turn(
        &mut self,
        input: &[ChatMessage],
        response: ChatMessage,
        memory: &dyn MemoryStore,
    ) {
        self.messages.extend_from_slice(input);
        self.messages.push(response);

        while self.render().chars().count() > self.max_chars && !self.messages.is_empty() {
            let oldest = self.messages.remove(0);
            let formatted = format!("{}: {}", oldest.prefix, oldest.content);
            debug!(message = %formatted, "Spilling oldest history message to memory");
            if let Err(e) = memory.store(&formatted).await {
                warn!(error = %e, "Failed to spill history message to memory");
            }
        }
    }

    /// Move every message into long-term memory and clear the history.
    /// Used on exit when history persistence is off.
    pub async fn archive_into(&mut self, memory: &dyn MemoryStore) {
        for message in self.messages.drain(..) {
            let formatted = format!("{}: {}", message.prefix, message.content);
            if let Err(e) = memory.store(&formatted).await {
                warn!(error = %e, "Failed to archive history message to memory");
            }
        }
    }

    /// Load history from a JSON file. A missing file yields an empty
    /// history.
    pub fn load(path: &Path, max_chars: usize) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Ok(Self::new(max_chars)),
        };
        let messages: Vec<ChatMessage> = serde_json::from_str(&content)?;
        Ok(Self::with_messages(messages, max_chars))
    }

    /// Save history to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Internal(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(&self.messages)?;
        std::fs::write(path, json).map_err(|e| Error::Internal(e.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use lorekeep_memory::InMemoryStore;

    fn turn(n: usize) -> (Vec<ChatMessage>, ChatMessage) {
        (
            vec![ChatMessage::new("Zach", format!("question number {n}"))],
            ChatMessage::new("Samantha", format!("answer number {n}")),
        )
    }

    #[tokio::test]
    async fn push_turn_appends_in_order() {
        let memory = InMemoryStore::new();
        let mut history = ChatHistory::new(6000);

        let (input, response) = turn(1);
        history.push_turn(&input, response, &memory).await;

        assert_eq!(history.len(), 2);
        assert_eq!(history.messages()[0].prefix, "Zach");
        assert_eq!(history.messages()[1].prefix, "Samantha");
    }

    #[tokio::test]
    async fn trimming_spills_oldest_to_memory() {
        let memory = InMemoryStore::new();
        // Tiny budget: every turn evicts earlier messages.
        let mut history = ChatHistory::new(80);

        for n in 1..=3 {
            let (input, response) = turn(n);
            history.push_turn(&input, response, &memory).await;
        }

        // History stays within budget and the evicted messages landed in
        // memory with their prefixes.
        assert!(history.render().chars().count() <= 80);
        assert!(memory.count().await.unwrap() > 0);
        let spilled = memory.search("question number 1", 10).await.unwrap();
        assert!(spilled.iter().any(|r| r.content.starts_with("Zach:")));
    }

    #[tokio::test]
    async fn archive_moves_everything_to_memory() {
        let memory = InMemoryStore::new();
        let mut history = ChatHistory::new(6000);

        let (input, response) = turn(1);
        history.push_turn(&input, response, &memory).await;
        history.archive_into(&memory).await;

        assert!(history.is_empty());
        assert_eq!(memory.count().await.unwrap(), 2);
    }

    #[test]
    fn load_missing_file_yields_empty_history() {
        let history =
            ChatHistory::load(Path::new("/nonexistent/history.json"), 6000).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn save_and_reload_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("history.json");

        let history = ChatHistory::with_messages(
            vec![
                ChatMessage::new("Zach", "hello"),
                ChatMessage::new("Samantha", "hi there"),
            ],
            6000,
        );
        history.save(&path).unwrap();

        let reloaded = ChatHistory::load(&path, 6000).unwrap();
        assert_eq!(reloaded.messages(), history.messages());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("history.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(ChatHistory::load(&path, 6000).is_err());
    }
}
