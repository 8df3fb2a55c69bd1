//! Turns one session's ordered event stream into its message log.

use std::collections::HashMap;

use agent_events::{AgentEvent, EventRecord, SessionId};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::DEFAULT_TOOL_PREVIEW_LINES;
use crate::core::text::wrap::truncate_to_width;

use super::message::{ConversationMessage, MessageKind};

const TOOL_HEADER_MARKER: &str = "●";
const TOOL_INPUT_SUMMARY_WIDTH: usize = 60;
const TOOL_RESULT_INDENT: &str = "  ";

/// An event that cannot be applied to the log in its current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedEvent {
    #[error("tool call event has an empty tool_call_id")]
    MissingToolCallId,
    #[error("tool call '{0}' is already running")]
    DuplicateToolCall(String),
    #[error("tool call '{0}' already has a result")]
    ToolCallAlreadyFinished(String),
    #[error("tool result references unknown tool call '{0}'")]
    UnknownToolCall(String),
}

#[derive(Debug, Clone)]
pub struct MessageAccumulator {
    session_id: SessionId,
    messages: Vec<ConversationMessage>,
    /// Running tool calls by linking id, pointing at their message.
    pending_tool_calls: HashMap<String, usize>,
    turn: u64,
    turn_closed: bool,
    next_correlation: u64,
    pending_observed: Vec<String>,
    tool_preview_lines: usize,
}

impl MessageAccumulator {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            messages: Vec::new(),
            pending_tool_calls: HashMap::new(),
            turn: 0,
            turn_closed: false,
            next_correlation: 0,
            pending_observed: Vec::new(),
            tool_preview_lines: DEFAULT_TOOL_PREVIEW_LINES,
        }
    }

    pub fn with_tool_preview_lines(mut self, lines: usize) -> Self {
        self.tool_preview_lines = lines;
        self
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn is_streaming(&self) -> bool {
        self.messages.iter().any(|message| message.streaming)
    }

    /// Observed ids attached to every following record that carries none of its own.
    pub fn set_observed_correlation_ids(&mut self, ids: Vec<String>) {
        self.pending_observed = ids;
    }

    pub fn clear_observed_correlation_ids(&mut self) {
        self.pending_observed.clear();
    }

    /// Applies one record, returning the indices of the messages it opened or changed.
    ///
    /// Malformed records are logged and leave the log untouched.
    pub fn apply(&mut self, record: &EventRecord) -> Vec<usize> {
        match self.try_apply(record) {
            Ok(touched) => {
                debug!(
                    session = %self.session_id,
                    kind = record.event.kind_name(),
                    touched = touched.len(),
                    "applied event"
                );
                touched
            }
            Err(err) => {
                warn!(
                    session = %self.session_id,
                    kind = record.event.kind_name(),
                    error = %err,
                    "dropping malformed event"
                );
                Vec::new()
            }
        }
    }

    pub fn try_apply(&mut self, record: &EventRecord) -> Result<Vec<usize>, MalformedEvent> {
        match &record.event {
            AgentEvent::UserInput { text } => {
                let message = ConversationMessage::new(MessageKind::UserInput, text.as_str());
                Ok(vec![self.open_from(record, message)])
            }
            AgentEvent::TextDelta { text } => {
                Ok(self.append_delta(record, MessageKind::AssistantText, text))
            }
            AgentEvent::ThinkingDelta { text } => {
                Ok(self.append_delta(record, MessageKind::Thinking, text))
            }
            AgentEvent::ToolCallStart {
                tool_call_id,
                tool_name,
                input,
            } => self.start_tool_call(record, tool_call_id, tool_name, input),
            AgentEvent::ToolCallResult {
                tool_call_id,
                content,
                is_error,
            } => self.finish_tool_call(record, tool_call_id, content, *is_error),
            AgentEvent::StatusChange { status } => {
                let message = ConversationMessage::new(MessageKind::Status, status.as_str());
                Ok(vec![self.open_from(record, message)])
            }
            AgentEvent::SessionError { message, .. } => {
                let message = ConversationMessage::new(MessageKind::Status, message.as_str()).error();
                Ok(vec![self.open_from(record, message)])
            }
            AgentEvent::TurnComplete => Ok(self.complete_turn()),
            // Pause requests change session state only.
            AgentEvent::ApprovalRequested { .. } | AgentEvent::InputRequested { .. } => {
                Ok(Vec::new())
            }
        }
    }

    /// Finalizes every streaming message as-is. Running tool calls can no longer
    /// receive results afterwards.
    pub fn finalize_streaming(&mut self) -> Vec<usize> {
        self.pending_tool_calls.clear();
        let mut finalized = Vec::new();
        for (index, message) in self.messages.iter_mut().enumerate() {
            if message.streaming {
                message.streaming = false;
                finalized.push(index);
            }
        }
        finalized
    }

    pub fn complete_turn(&mut self) -> Vec<usize> {
        let finalized = self.finalize_streaming();
        self.turn_closed = true;
        finalized
    }

    /// Appends a console-generated status line.
    pub fn push_status(&mut self, text: impl Into<String>, is_error: bool) -> usize {
        let mut message = ConversationMessage::new(MessageKind::Status, text);
        message.is_error = is_error;
        self.open(message)
    }

    fn append_delta(&mut self, record: &EventRecord, kind: MessageKind, text: &str) -> Vec<usize> {
        if text.is_empty() {
            return Vec::new();
        }

        if let Some(index) = self.open_delta_index(kind) {
            let observed = self.observed_for(record).to_vec();
            let message = &mut self.messages[index];
            message.content.push_str(text);
            if let Some(chunk_id) = &record.correlation_id {
                message.add_chunk_id(chunk_id);
            }
            message.observe(&observed);
            return vec![index];
        }

        let message = ConversationMessage::new(kind, text).streaming();
        vec![self.open_from(record, message)]
    }

    fn open_delta_index(&self, kind: MessageKind) -> Option<usize> {
        let index = self.messages.len().checked_sub(1)?;
        let last = &self.messages[index];
        (last.kind == kind && last.streaming).then_some(index)
    }

    fn start_tool_call(
        &mut self,
        record: &EventRecord,
        tool_call_id: &str,
        tool_name: &str,
        input: &str,
    ) -> Result<Vec<usize>, MalformedEvent> {
        if tool_call_id.is_empty() {
            return Err(MalformedEvent::MissingToolCallId);
        }
        if self.pending_tool_calls.contains_key(tool_call_id) {
            return Err(MalformedEvent::DuplicateToolCall(tool_call_id.to_string()));
        }

        let mut message =
            ConversationMessage::new(MessageKind::ToolCall, tool_header(tool_name, input)).streaming();
        message.tool_call_id = Some(tool_call_id.to_string());
        let index = self.open_from(record, message);
        self.pending_tool_calls.insert(tool_call_id.to_string(), index);
        Ok(vec![index])
    }

    fn finish_tool_call(
        &mut self,
        record: &EventRecord,
        tool_call_id: &str,
        result: &str,
        is_error: bool,
    ) -> Result<Vec<usize>, MalformedEvent> {
        if tool_call_id.is_empty() {
            return Err(MalformedEvent::MissingToolCallId);
        }
        let Some(index) = self.pending_tool_calls.remove(tool_call_id) else {
            let seen = self
                .messages
                .iter()
                .any(|message| message.tool_call_id.as_deref() == Some(tool_call_id));
            return Err(if seen {
                MalformedEvent::ToolCallAlreadyFinished(tool_call_id.to_string())
            } else {
                MalformedEvent::UnknownToolCall(tool_call_id.to_string())
            });
        };

        let observed = self.observed_for(record).to_vec();
        let preview_lines = self.tool_preview_lines;
        let message = &mut self.messages[index];
        let (content, full_content) = fold_tool_result(&message.content, result, preview_lines);
        message.content = content;
        message.full_content = full_content;
        message.streaming = false;
        message.is_error = is_error;
        message.observe(&observed);
        Ok(vec![index])
    }

    fn open_from(&mut self, record: &EventRecord, mut message: ConversationMessage) -> usize {
        message.correlation_id = record.correlation_id.clone();
        message.observe(self.observed_for(record));
        self.open(message)
    }

    fn open(&mut self, mut message: ConversationMessage) -> usize {
        self.finalize_open_delta();

        let starts_turn = message.kind == MessageKind::UserInput || self.turn_closed;
        if starts_turn && !self.messages.is_empty() {
            self.turn += 1;
        }
        self.turn_closed = false;
        message.turn = self.turn;

        if message.correlation_id.is_none() {
            message.correlation_id = Some(self.generate_correlation_id());
        }

        self.messages.push(message);
        self.messages.len() - 1
    }

    /// A delta message stops streaming once anything else follows it.
    fn finalize_open_delta(&mut self) {
        if let Some(last) = self.messages.last_mut() {
            if last.streaming && last.kind.is_delta() {
                last.streaming = false;
            }
        }
    }

    fn observed_for<'a>(&'a self, record: &'a EventRecord) -> &'a [String] {
        if record.observed_correlation_ids.is_empty() {
            &self.pending_observed
        } else {
            &record.observed_correlation_ids
        }
    }

    fn generate_correlation_id(&mut self) -> String {
        let id = format!("{}-{}", self.session_id, self.next_correlation);
        self.next_correlation += 1;
        id
    }
}

fn tool_header(tool_name: &str, input: &str) -> String {
    let summary = input.lines().map(str::trim).find(|line| !line.is_empty());
    match summary {
        Some(summary) => format!(
            "{TOOL_HEADER_MARKER} {tool_name}({})",
            truncate_to_width(summary, TOOL_INPUT_SUMMARY_WIDTH, "…")
        ),
        None => format!("{TOOL_HEADER_MARKER} {tool_name}"),
    }
}

/// Returns the collapsed content and, when lines were hidden, the full content.
fn fold_tool_result(header: &str, result: &str, preview_lines: usize) -> (String, Option<String>) {
    let result_lines: Vec<&str> = result.trim_end_matches('\n').lines().collect();
    if result_lines.is_empty() {
        return (header.to_string(), None);
    }

    let render = |lines: &[&str]| {
        let mut rendered = header.to_string();
        for line in lines {
            rendered.push('\n');
            rendered.push_str(TOOL_RESULT_INDENT);
            rendered.push_str(line);
        }
        rendered
    };

    if result_lines.len() <= preview_lines {
        return (render(&result_lines), None);
    }

    let hidden = result_lines.len() - preview_lines;
    let mut collapsed = render(&result_lines[..preview_lines]);
    collapsed.push('\n');
    collapsed.push_str(TOOL_RESULT_INDENT);
    collapsed.push_str(&format!("… +{hidden} lines"));
    (collapsed, Some(render(&result_lines)))
}
