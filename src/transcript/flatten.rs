//! Message log to fixed-width rows.
//!
//! The output is a pure function of the messages, the width, and the expansion flag,
//! so a resize simply flattens again.

use crate::core::text::width::visible_width;
use crate::core::text::wrap::wrap_text;

use super::message::{ConversationMessage, MessageKind};

const USER_PREFIX: &str = "> ";
const USER_INDENT: &str = "  ";

/// One terminal row of a session's transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationLine {
    pub role: MessageKind,
    pub content: String,
    /// Index of the source message. Separators point at the message they precede.
    pub message_index: usize,
    pub is_separator: bool,
    pub is_thinking: bool,
    pub is_error: bool,
    pub correlation_id: Option<String>,
    pub observed_correlation_ids: Vec<String>,
}

impl ConversationLine {
    fn from_message(message: &ConversationMessage, message_index: usize, content: String) -> Self {
        Self {
            role: message.kind,
            content,
            message_index,
            is_separator: false,
            is_thinking: message.kind == MessageKind::Thinking,
            is_error: message.is_error,
            correlation_id: message.correlation_id.clone(),
            observed_correlation_ids: message.observed_correlation_ids.clone(),
        }
    }

    fn separator(next: &ConversationMessage, message_index: usize) -> Self {
        Self {
            role: next.kind,
            content: String::new(),
            message_index,
            is_separator: true,
            is_thinking: false,
            is_error: false,
            correlation_id: None,
            observed_correlation_ids: Vec::new(),
        }
    }
}

pub fn flatten_messages(
    messages: &[ConversationMessage],
    width: usize,
    expand_tool_output: bool,
) -> Vec<ConversationLine> {
    let mut lines = Vec::new();
    let mut previous_turn = None;

    for (index, message) in messages.iter().enumerate() {
        if previous_turn.is_some_and(|turn| turn != message.turn) {
            lines.push(ConversationLine::separator(message, index));
        }
        previous_turn = Some(message.turn);

        for row in message_rows(message, width, expand_tool_output) {
            lines.push(ConversationLine::from_message(message, index, row));
        }
    }

    lines
}

fn message_rows(message: &ConversationMessage, width: usize, expand_tool_output: bool) -> Vec<String> {
    let content = message.display_content(expand_tool_output);
    if message.kind != MessageKind::UserInput {
        return wrap_text(content, width);
    }

    let prefix_width = visible_width(USER_PREFIX);
    if width <= prefix_width {
        return wrap_text(content, width);
    }

    wrap_text(content, width - prefix_width)
        .into_iter()
        .enumerate()
        .map(|(row, text)| {
            let lead = if row == 0 { USER_PREFIX } else { USER_INDENT };
            format!("{lead}{text}").trim_end().to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn message(kind: MessageKind, content: &str, turn: u64) -> ConversationMessage {
        let mut message = ConversationMessage::new(kind, content);
        message.turn = turn;
        message
    }

    fn texts(lines: &[ConversationLine]) -> Vec<&str> {
        lines.iter().map(|line| line.content.as_str()).collect()
    }

    #[test]
    fn user_input_gets_prefix_and_hanging_indent() {
        let messages = vec![message(MessageKind::UserInput, "please fix the bug", 0)];
        let lines = flatten_messages(&messages, 12, false);
        assert_eq!(texts(&lines), vec!["> please fix", "  the bug"]);
        assert!(lines.iter().all(|line| line.message_index == 0));
    }

    #[test]
    fn separators_mark_turn_boundaries() {
        let messages = vec![
            message(MessageKind::UserInput, "hi", 0),
            message(MessageKind::AssistantText, "hello", 0),
            message(MessageKind::UserInput, "bye", 1),
        ];
        let lines = flatten_messages(&messages, 20, false);
        assert_eq!(texts(&lines), vec!["> hi", "hello", "", "> bye"]);

        let separator = &lines[2];
        assert!(separator.is_separator);
        assert_eq!(separator.message_index, 2);
        assert_eq!(separator.correlation_id, None);
    }

    #[test]
    fn lines_inherit_message_metadata() {
        let mut thinking = message(MessageKind::Thinking, "hmm", 0);
        thinking.correlation_id = Some("s-0".to_string());
        thinking.observed_correlation_ids = vec!["p-4".to_string()];
        let mut failure = message(MessageKind::Status, "boom", 0);
        failure.is_error = true;

        let lines = flatten_messages(&[thinking, failure], 10, false);
        assert!(lines[0].is_thinking);
        assert_eq!(lines[0].correlation_id.as_deref(), Some("s-0"));
        assert_eq!(lines[0].observed_correlation_ids, vec!["p-4"]);
        assert!(lines[1].is_error);
        assert_eq!(lines[1].message_index, 1);
    }

    #[test]
    fn expansion_switches_to_full_tool_output() {
        let mut tool = message(MessageKind::ToolCall, "● ls\n  a\n  … +2 lines", 0);
        tool.full_content = Some("● ls\n  a\n  b\n  c".to_string());

        assert_eq!(flatten_messages(&[tool.clone()], 20, false).len(), 3);
        assert_eq!(
            texts(&flatten_messages(&[tool], 20, true)),
            vec!["● ls", "  a", "  b", "  c"]
        );
    }

    #[test]
    fn flattening_is_deterministic_and_width_bounded() {
        let messages = vec![
            message(MessageKind::UserInput, "日本語のテキスト and words", 0),
            message(MessageKind::AssistantText, "⚠\u{FE0F} careful: averyveryverylongidentifier", 0),
            message(MessageKind::AssistantText, "", 1),
        ];
        for width in 1..24 {
            let first = flatten_messages(&messages, width, false);
            assert_eq!(first, flatten_messages(&messages, width, false));
            for line in &first {
                assert!(visible_width(&line.content) <= width, "{line:?} at {width}");
            }
        }
    }

    #[test]
    fn zero_width_degrades_to_one_empty_row_per_message() {
        let messages = vec![
            message(MessageKind::UserInput, "hi", 0),
            message(MessageKind::AssistantText, "hello", 0),
        ];
        assert_eq!(texts(&flatten_messages(&messages, 0, false)), vec!["", ""]);
    }
}
