//! Prompt compilation — conditional assembly of named sections.
//!
//! A prompt is built from sections in a fixed order: relevant knowledge,
//! long-term memory, chat history, available-actions instructions, the
//! user's input, the action-log transcript, and a final response cue. Each
//! section is an ordered (predicate, block) pair: when the predicate is
//! false the section contributes nothing, so absent content never leaves a
//! dangling header behind. A final pass collapses runs of blank lines.
//!
//! Chat-style models get the same layout split differently: the system
//! message travels separately, history renders as role-tagged messages
//! (matched by speaker prefix), and the user content omits the inline
//! history block and the response cue.
//!
//! Pure functions of their inputs; no side effects.

use lorekeep_core::chat::{ChatMessage, render_transcript};
use lorekeep_core::provider::{PromptPayload, PromptStyle, RoleMessage};

use crate::turn::ActionLogEntry;

/// Everything the compiler needs for one model call.
pub struct PromptInput<'a> {
    /// The assistant's display name.
    pub ai_name: &'a str,

    /// The user's input for this turn, already rendered to text.
    pub user_input: &'a str,

    /// Retrieved knowledge text ("" = no knowledge section).
    pub relevant_knowledge: &'a str,

    /// Recalled long-term memory text ("" = no memory section).
    pub long_term_memory: &'a str,

    /// Chat history messages ([] = no history section).
    pub history: &'a [ChatMessage],

    /// Whether the model may request actions this call.
    pub tool_use_allowed: bool,

    /// Tool names, comma-joined (only read when tool use is allowed).
    pub tool_names: &'a str,

    /// Tool name-and-description blocks (only read when tool use is allowed).
    pub tool_descriptions: &'a str,

    /// Actions taken so far this turn.
    pub action_log: &'a [ActionLogEntry],
}

/// Compile a prompt payload for the given style.
pub fn compile(
    style: PromptStyle,
    system_message: &str,
    input: &PromptInput<'_>,
) -> PromptPayload {
    match style {
        PromptStyle::Completion => PromptPayload::Text(compile_text(input)),
        PromptStyle::Chat => {
            let mut messages = history_to_role_messages(input.history, input.ai_name);
            messages.push(RoleMessage::user(compile_user_content(input)));
            PromptPayload::Chat {
                system: system_message.to_string(),
                messages,
            }
        }
    }
}

/// The full flat prompt for completion-style models.
fn compile_text(input: &PromptInput<'_>) -> String {
    let history = render_transcript(input.history);
    assemble(vec![
        (
            !input.relevant_knowledge.is_empty(),
            knowledge_block(input.relevant_knowledge),
        ),
        (
            !input.long_term_memory.is_empty(),
            memory_block(input.ai_name, input.long_term_memory),
        ),
        (!history.is_empty(), history_block(input.ai_name, &history)),
        (
            input.tool_use_allowed,
            actions_block(input.tool_names, input.tool_descriptions),
        ),
        (true, user_block(input.user_input)),
        (
            !input.action_log.is_empty(),
            action_log_block(input.action_log, input.tool_use_allowed),
        ),
        (true, "RESPONSE".to_string()),
    ])
}

/// The most recent user message for chat-style models: the flat layout
/// minus the inline history block and the response cue (history travels
/// as separate role messages, and chat models need no cue).
fn compile_user_content(input: &PromptInput<'_>) -> String {
    assemble(vec![
        (
            !input.relevant_knowledge.is_empty(),
            knowledge_block(input.relevant_knowledge),
        ),
        (
            !input.long_term_memory.is_empty(),
            memory_block(input.ai_name, input.long_term_memory),
        ),
        (
            input.tool_use_allowed,
            actions_block(input.tool_names, input.tool_descriptions),
        ),
        (true, user_block(input.user_input)),
        (
            !input.action_log.is_empty(),
            action_log_block(input.action_log, input.tool_use_allowed),
        ),
    ])
}

/// Join sections in order, dropping absent ones, then normalize blank lines.
fn assemble(sections: Vec<(bool, String)>) -> String {
    let joined = sections
        .into_iter()
        .map(|(present, block)| if present { block } else { String::new() })
        .collect::<Vec<_>>()
        .join("\n\n");
    squeeze_blank_lines(joined.trim())
}

/// Collapse every run of two or more consecutive blank lines down to one.
/// Idempotent: re-applying never changes the output further.
pub fn squeeze_blank_lines(text: &str) -> String {
    let mut out = text.to_string();
    while out.contains("\n\n\n") {
        out = out.replace("\n\n\n", "\n\n");
    }
    out
}

/// Map history onto chat roles: the assistant's own prefix becomes the
/// assistant role, everything else the user role.
pub fn history_to_role_messages(history: &[ChatMessage], ai_name: &str) -> Vec<RoleMessage> {
    history
        .iter()
        .map(|m| {
            if m.prefix == ai_name {
                RoleMessage::assistant(&m.content)
            } else {
                RoleMessage::user(&m.content)
            }
        })
        .collect()
}

// ── Section renderers ─────────────────────────────────────────────────────

fn knowledge_block(content: &str) -> String {
    format!("RELEVANT KNOWLEDGE\n{content}")
}

fn memory_block(ai_name: &str, content: &str) -> String {
    format!(
        "LONG TERM MEMORY\nHere are some messages from past conversations with the same user \
         that you may or may not find relevant to the present conversation. The '{ai_name}' \
         prefix marks a message you sent. The prefix was added after the fact, so you don't \
         actually include it in your messages.\n\n{content}"
    )
}

fn history_block(ai_name: &str, history: &str) -> String {
    format!("CONVERSATION HISTORY - remember, you are {ai_name}\n{history}")
}

fn actions_block(tool_names: &str, tool_descriptions: &str) -> String {
    format!(
        "OPTIONAL ACTIONS\n\
         In addition to responding to questions and prompts directly, you can also choose to \
         perform any of the following actions:\n\n\
         {tool_descriptions}\n\n\
         If you want to take an action, you MUST use the following (Action, Input) format. You \
         MUST include both parts of the format, and you MUST use the exact words and formatting \
         shown below. Do not include any additional text in your response:\n\n\
         Action: [your action, which must be one of these: {tool_names}]\n\
         Input: [your input to the action, which must be formatted correctly]\n\n\
         For example, if you wanted to use the Search tool to look up 2022 Super Bowl results, \
         you would respond with:\n\
         ```\n\
         Action: Search\n\
         Input: 2022 Super Bowl game score\n\
         ```\n\n\
         That's it! You just need to give the Action and Input. DO NOT try to answer the \
         question after writing your Action and Input. The answer will be automatically added \
         to the response later.\n\n\
         If you don't want to take an action, you can just respond to the prompt directly, \
         without using the (Action, Input) format. Only take an action if you feel it is \
         necessary."
    )
}

fn user_block(input: &str) -> String {
    format!("PROMPT\n{input}")
}

/// Render the action log. Framing depends on the phase: while tool use is
/// still allowed the model is told it may act again (but not repeat an
/// action/input pair); once tool use is disallowed it is told to judge
/// whether what it already tried is useful and to ignore errors.
fn action_log_block(log: &[ActionLogEntry], tool_use_allowed: bool) -> String {
    if log.is_empty() {
        return String::new();
    }

    let (first_part, last_part) = if tool_use_allowed {
        (
            "Here are the actions you've taken so far, along with their outputs:\n",
            "You can take another action if you need to, but before doing so you should look \
             very closely to see if the answer to the user's prompt is in the output of any of \
             these actions you've already taken. If so, you should respond to the user with the \
             answer. You should not repeat the same Action and Input more than once.",
        )
    } else {
        (
            "You were previously given access to a variety of tools and actions:\n",
            "Now it's time to respond to the user. First, consider the output from the \
             action(s) you took, and decide if that output is useful or not. If the output is \
             useful, then use it to inform your response to the user. If the output is an error \
             message, if it's empty, or if it is otherwise not useful, then ignore it when \
             constructing your response.",
        )
    };

    let mut rendered = String::new();
    for (i, entry) in log.iter().enumerate() {
        let intro = if i == 0 { "First" } else { "Then" };
        rendered.push_str(&format!(
            "{intro}, you chose to use: {}. Your input to {} was {}, which resulted in an \
             output of {}.\n\n",
            entry.action, entry.action, entry.input, entry.output
        ));
    }

    format!("ACTION OUTPUT\n{first_part}{rendered}{last_part}")
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use lorekeep_core::provider::Role;

    fn entry(action: &str, input: &str, output: &str) -> ActionLogEntry {
        ActionLogEntry {
            action: action.into(),
            input: input.into(),
            output: output.into(),
        }
    }

    fn bare_input<'a>(user_input: &'a str) -> PromptInput<'a> {
        PromptInput {
            ai_name: "Samantha",
            user_input,
            relevant_knowledge: "",
            long_term_memory: "",
            history: &[],
            tool_use_allowed: false,
            tool_names: "",
            tool_descriptions: "",
            action_log: &[],
        }
    }

    #[test]
    fn all_flags_false_yields_only_input_and_cue() {
        let text = compile_text(&bare_input("What's the capital of France?"));
        assert_eq!(text, "PROMPT\nWhat's the capital of France?\n\nRESPONSE");
    }

    #[test]
    fn no_dangling_headers_for_absent_sections() {
        let text = compile_text(&bare_input("Hello"));
        assert!(!text.contains("RELEVANT KNOWLEDGE"));
        assert!(!text.contains("LONG TERM MEMORY"));
        assert!(!text.contains("CONVERSATION HISTORY"));
        assert!(!text.contains("OPTIONAL ACTIONS"));
        assert!(!text.contains("ACTION OUTPUT"));
    }

    #[test]
    fn no_triple_newlines_anywhere() {
        let history = vec![
            ChatMessage::new("Zach", "hi"),
            ChatMessage::new("Samantha", "hello"),
        ];
        let input = PromptInput {
            relevant_knowledge: "Some facts.",
            long_term_memory: "Zach: I like tea",
            history: &history,
            tool_use_allowed: true,
            tool_names: "Knowledge Bases",
            tool_descriptions: "Knowledge Bases: A knowledge base.",
            ..bare_input("What do I like?")
        };
        let text = compile_text(&input);
        assert!(!text.contains("\n\n\n"));
        assert!(!text.starts_with('\n'));
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let history = vec![ChatMessage::new("Zach", "hi")];
        let log = vec![entry("Knowledge Bases", "tea", "Tea facts.")];
        let input = PromptInput {
            relevant_knowledge: "Knowledge text.",
            long_term_memory: "Memory text.",
            history: &history,
            tool_use_allowed: true,
            tool_names: "Knowledge Bases",
            tool_descriptions: "Knowledge Bases: A knowledge base.",
            action_log: &log,
            ..bare_input("Question?")
        };
        let text = compile_text(&input);
        let positions: Vec<usize> = [
            "RELEVANT KNOWLEDGE",
            "LONG TERM MEMORY",
            "CONVERSATION HISTORY",
            "OPTIONAL ACTIONS",
            "PROMPT",
            "ACTION OUTPUT",
            "RESPONSE",
        ]
        .iter()
        .map(|h| text.find(h).unwrap_or_else(|| panic!("missing {h}")))
        .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn squeeze_is_idempotent() {
        let squeezed = squeeze_blank_lines("a\n\n\n\n\nb");
        assert_eq!(squeezed, "a\n\nb");
        assert_eq!(squeeze_blank_lines(&squeezed), squeezed);
    }

    #[test]
    fn action_log_framing_while_tools_allowed() {
        let log = vec![
            entry("Knowledge Bases", "refunds", "30 days."),
            entry("Knowledge Bases", "exchanges", "Receipt required."),
        ];
        let block = action_log_block(&log, true);
        assert!(block.starts_with("ACTION OUTPUT"));
        assert!(block.contains("First, you chose to use: Knowledge Bases."));
        assert!(block.contains("Then, you chose to use: Knowledge Bases."));
        assert!(block.contains("should not repeat the same Action and Input"));
    }

    #[test]
    fn action_log_framing_when_finalizing() {
        let log = vec![entry("Knowledge Bases", "refunds", "Error using tool: timeout")];
        let block = action_log_block(&log, false);
        assert!(block.contains("previously given access"));
        assert!(block.contains("ignore it when constructing your response"));
        assert!(!block.contains("take another action"));
    }

    #[test]
    fn empty_action_log_renders_nothing() {
        assert_eq!(action_log_block(&[], true), "");
        assert_eq!(action_log_block(&[], false), "");
    }

    #[test]
    fn chat_style_maps_history_to_roles() {
        let history = vec![
            ChatMessage::new("Zach", "hi"),
            ChatMessage::new("Samantha", "hello"),
            ChatMessage::new("Zach", "how are you?"),
        ];
        let messages = history_to_role_messages(&history, "Samantha");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[2].role, Role::User);
    }

    #[test]
    fn chat_payload_carries_system_and_omits_inline_history() {
        let history = vec![ChatMessage::new("Zach", "earlier question")];
        let input = PromptInput {
            history: &history,
            ..bare_input("follow-up")
        };
        let payload = compile(PromptStyle::Chat, "You are Samantha.", &input);
        match payload {
            PromptPayload::Chat { system, messages } => {
                assert_eq!(system, "You are Samantha.");
                // history message + current user content
                assert_eq!(messages.len(), 2);
                let content = &messages[1].content;
                assert!(!content.contains("CONVERSATION HISTORY"));
                assert!(!content.contains("RESPONSE"));
                assert!(content.contains("PROMPT\nfollow-up"));
            }
            PromptPayload::Text(_) => panic!("expected chat payload"),
        }
    }

    #[test]
    fn completion_payload_is_flat_text() {
        let payload = compile(PromptStyle::Completion, "ignored", &bare_input("Hello"));
        match payload {
            PromptPayload::Text(text) => assert!(text.contains("PROMPT\nHello")),
            PromptPayload::Chat { .. } => panic!("expected text payload"),
        }
    }

    #[test]
    fn actions_block_lists_tools() {
        let input = PromptInput {
            tool_use_allowed: true,
            tool_names: "Knowledge Bases",
            tool_descriptions: "Knowledge Bases: A knowledge base.",
            ..bare_input("Question?")
        };
        let text = compile_text(&input);
        assert!(text.contains("one of these: Knowledge Bases"));
        assert!(text.contains("Knowledge Bases: A knowledge base."));
    }
}
