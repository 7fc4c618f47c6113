//! Self-contained query rewriting.
//!
//! Retrieval queries work best when the input stands on its own ("what
//! about the second one?" retrieves nothing useful). Before retrieval,
//! the user input is rewritten to fold in whatever recent-history context
//! is needed to understand it. The rewrite is best-effort: any failure
//! falls back to the raw input, because a turn must never die here.

use lorekeep_core::chat::{ChatMessage, render_transcript};
use lorekeep_core::provider::{CompletionRequest, PromptPayload, Provider, RoleMessage};
use std::sync::Arc;
use tracing::{debug, warn};

/// Inputs longer than this are used as-is: rewriting them is expensive
/// and they almost certainly carry their own context already.
const MAX_INPUT_CHARS: usize = 600;

/// Only the tail of the history is shown to the rewrite model.
const MAX_HISTORY_CHARS: usize = 1000;

const MAX_REWRITE_TOKENS: u32 = 300;

/// Rewrites user inputs into self-contained retrieval queries.
pub struct QueryRewriter {
    provider: Arc<dyn Provider>,
    model: String,
}

impl QueryRewriter {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    fn rewrite_prompt(chat_history: &str, input: &str) -> String {
        format!(
            "Given the following conversation:\n\n\
             CONVERSATION\n\
             {chat_history}\n\n\
             Re-write the following user input such that it contains any additional context \
             from the conversation that would be needed to understand it. If the user input \
             already contains sufficient context, then just return the user input as is.\n\n\
             USER INPUT\n\
             {input}\n\n\
             USER INPUT WITH CONTEXT"
        )
    }

    /// Produce a self-contained version of `input`.
    ///
    /// Skips the model call entirely when there is no history to draw
    /// from or the input is already long. Returns the raw input on any
    /// rewrite failure.
    pub async fn make_self_contained(
        &self,
        history: &[ChatMessage],
        input: &[ChatMessage],
    ) -> String {
        let input_str = render_transcript(input);

        if history.is_empty() {
            return input_str;
        }
        if input_str.chars().count() > MAX_INPUT_CHARS {
            return input_str;
        }

        let mut history_str = render_transcript(history);
        let history_chars = history_str.chars().count();
        if history_chars > MAX_HISTORY_CHARS {
            history_str = history_str
                .chars()
                .skip(history_chars - MAX_HISTORY_CHARS)
                .collect();
        }

        let request = CompletionRequest {
            model: self.model.clone(),
            payload: PromptPayload::Chat {
                system: String::new(),
                messages: vec![RoleMessage::user(Self::rewrite_prompt(
                    &history_str,
                    &input_str,
                ))],
            },
            temperature: 0.0,
            max_tokens: MAX_REWRITE_TOKENS,
        };

        match self.provider.complete(request).await {
            Ok(rewritten) if !rewritten.is_empty() => {
                debug!(rewritten = %rewritten, "Query rewritten");
                rewritten
            }
            Ok(_) => input_str,
            Err(e) => {
                warn!(error = %e, "Query rewrite failed, using raw input");
                input_str
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingProvider, SequentialMockProvider};
    use lorekeep_core::error::ProviderError;

    fn zach(content: &str) -> ChatMessage {
        ChatMessage::new("Zach", content)
    }

    #[tokio::test]
    async fn empty_history_skips_the_model() {
        // Zero scripted responses: a model call would panic.
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let rewriter = QueryRewriter::new(provider, "mock-model");

        let out = rewriter
            .make_self_contained(&[], &[zach("What about refunds?")])
            .await;
        assert_eq!(out, "Zach: What about refunds?");
    }

    #[tokio::test]
    async fn long_input_skips_the_model() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let rewriter = QueryRewriter::new(provider, "mock-model");

        let long_input = "x".repeat(700);
        let out = rewriter
            .make_self_contained(&[zach("earlier")], &[zach(&long_input)])
            .await;
        assert!(out.contains(&long_input));
    }

    #[tokio::test]
    async fn rewrites_with_history_context() {
        let provider = Arc::new(SequentialMockProvider::single_text(
            "What is the refund policy for laptops?",
        ));
        let rewriter = QueryRewriter::new(provider.clone(), "mock-model");

        let out = rewriter
            .make_self_contained(&[zach("I bought a laptop")], &[zach("Can I return it?")])
            .await;
        assert_eq!(out, "What is the refund policy for laptops?");

        let request = provider.request(0);
        assert!((request.temperature - 0.0).abs() < f32::EPSILON);
        assert_eq!(request.max_tokens, MAX_REWRITE_TOKENS);
    }

    #[tokio::test]
    async fn history_is_clipped_to_the_tail() {
        let provider = Arc::new(SequentialMockProvider::single_text("rewritten"));
        let rewriter = QueryRewriter::new(provider.clone(), "mock-model");

        let old = zach(&"old ".repeat(400));
        let recent = zach("recent marker message");
        rewriter
            .make_self_contained(&[old, recent], &[zach("and this?")])
            .await;

        match provider.request(0).payload {
            PromptPayload::Chat { ref messages, .. } => {
                let prompt = &messages[0].content;
                assert!(prompt.contains("recent marker message"));
                // The clipped history fits the budget.
                let conversation = prompt
                    .split("CONVERSATION\n")
                    .nth(1)
                    .unwrap()
                    .split("\n\nRe-write")
                    .next()
                    .unwrap();
                assert!(conversation.chars().count() <= MAX_HISTORY_CHARS);
            }
            _ => panic!("expected chat payload"),
        }
    }

    #[tokio::test]
    async fn empty_model_output_falls_back_to_input() {
        let provider = Arc::new(SequentialMockProvider::single_text(""));
        let rewriter = QueryRewriter::new(provider, "mock-model");

        let out = rewriter
            .make_self_contained(&[zach("earlier")], &[zach("And this?")])
            .await;
        assert_eq!(out, "Zach: And this?");
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_input() {
        let provider = Arc::new(FailingProvider::new(ProviderError::Network(
            "connection reset".into(),
        )));
        let rewriter = QueryRewriter::new(provider, "mock-model");

        let out = rewriter
            .make_self_contained(&[zach("earlier")], &[zach("And this?")])
            .await;
        assert_eq!(out, "Zach: And this?");
    }
}
