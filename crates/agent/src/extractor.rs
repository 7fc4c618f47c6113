//! Action extraction from raw model output.
//!
//! The model requests a tool with a two-line text protocol:
//!
//! ```text
//! Action: Knowledge Bases
//! Input: refund policy
//! ```
//!
//! Extraction is deliberately strict: the text must contain exactly one
//! `"Action:"` marker and, in the substring after it, exactly one
//! `"Input:"` marker. Any deviation is a parse failure, never a guess —
//! prose that merely mentions the word "Action" must not be mistaken for
//! a structured request. A parse failure is the loop's exit signal: the
//! whole text is then the assistant's final answer.

const ACTION_MARKER: &str = "Action:";
const INPUT_MARKER: &str = "Input:";

/// A structured tool request extracted from model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    /// The tool name, trimmed.
    pub name: String,

    /// The input to pass to the tool, trimmed.
    pub input: String,
}

/// Try to extract an action request from raw model output.
///
/// Returns `None` on any deviation from the protocol; the caller treats
/// the whole output as the final answer.
pub fn extract_action(llm_output: &str) -> Option<ActionRequest> {
    // Exactly one "Action:" in the whole text.
    let mut action_parts = llm_output.splitn(3, ACTION_MARKER);
    action_parts.next()?;
    let after_action = action_parts.next()?;
    if action_parts.next().is_some() {
        return None;
    }

    // Exactly one "Input:" after it.
    let mut input_parts = after_action.splitn(3, INPUT_MARKER);
    let name = input_parts.next()?;
    let input = input_parts.next()?;
    if input_parts.next().is_some() {
        return None;
    }

    Some(ActionRequest {
        name: name.trim().to_string(),
        input: input.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_action_extracts() {
        let request = extract_action("Action: Knowledge Bases\nInput: refund policy").unwrap();
        assert_eq!(request.name, "Knowledge Bases");
        assert_eq!(request.input, "refund policy");
    }

    #[test]
    fn name_and_input_are_trimmed() {
        let request = extract_action("Action:   Search  \nInput:   2022 Super Bowl score  ").unwrap();
        assert_eq!(request.name, "Search");
        assert_eq!(request.input, "2022 Super Bowl score");
    }

    #[test]
    fn plain_prose_is_a_parse_failure() {
        assert!(extract_action("The capital of France is Paris.").is_none());
    }

    #[test]
    fn prose_mentioning_action_is_a_parse_failure() {
        assert!(extract_action("The best course of action is to wait.").is_none());
    }

    #[test]
    fn missing_input_is_a_parse_failure() {
        assert!(extract_action("Action: Search").is_none());
    }

    #[test]
    fn repeated_action_marker_is_a_parse_failure() {
        assert!(extract_action("Action: A\nInput: x\nAction: B").is_none());
    }

    #[test]
    fn repeated_input_marker_is_a_parse_failure() {
        assert!(extract_action("Action: A\nInput: x\nInput: y").is_none());
    }

    #[test]
    fn input_before_action_only_is_a_parse_failure() {
        assert!(extract_action("Input: x\nAction: A").is_none());
    }

    #[test]
    fn input_before_action_is_ignored_when_one_follows() {
        // Only the region after "Action:" is checked for "Input:".
        let request = extract_action("Input: stray\nAction: A\nInput: x").unwrap();
        assert_eq!(request.name, "A");
        assert_eq!(request.input, "x");
    }

    #[test]
    fn multiline_input_is_kept() {
        let request = extract_action("Action: Search\nInput: line one\nline two").unwrap();
        assert_eq!(request.input, "line one\nline two");
    }

    #[test]
    fn empty_text_is_a_parse_failure() {
        assert!(extract_action("").is_none());
    }
}
