//! Conversation message model.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    UserInput,
    AssistantText,
    Thinking,
    ToolCall,
    Status,
}

impl MessageKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::UserInput => "user-input",
            Self::AssistantText => "assistant-text",
            Self::Thinking => "thinking",
            Self::ToolCall => "tool-call",
            Self::Status => "status",
        }
    }

    /// Kinds that grow by appending deltas while streaming.
    pub fn is_delta(self) -> bool {
        matches!(self, Self::AssistantText | Self::Thinking)
    }
}

/// One logical unit of a session's transcript.
///
/// `content` only grows while `streaming` is set; once finalized the message is never
/// edited again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationMessage {
    pub kind: MessageKind,
    pub content: String,
    /// Uncollapsed form, present only when `content` hides part of a tool result.
    pub full_content: Option<String>,
    pub streaming: bool,
    pub is_error: bool,
    pub tool_call_id: Option<String>,
    pub correlation_id: Option<String>,
    /// Ids of continuation chunks that carried their own id. Ordered, no duplicates,
    /// never repeats `correlation_id`.
    pub chunk_correlation_ids: Vec<String>,
    /// Chunks of other sessions this message responded to. Ordered, no duplicates.
    pub observed_correlation_ids: Vec<String>,
    pub turn: u64,
}

impl ConversationMessage {
    pub fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            full_content: None,
            streaming: false,
            is_error: false,
            tool_call_id: None,
            correlation_id: None,
            chunk_correlation_ids: Vec::new(),
            observed_correlation_ids: Vec::new(),
            turn: 0,
        }
    }

    pub fn streaming(mut self) -> Self {
        self.streaming = true;
        self
    }

    pub fn error(mut self) -> Self {
        self.is_error = true;
        self
    }

    /// The text the flattener should lay out.
    pub fn display_content(&self, expand_tool_output: bool) -> &str {
        match (&self.full_content, expand_tool_output) {
            (Some(full), true) => full,
            _ => &self.content,
        }
    }

    /// Every id this message answers to: its own, then its chunks'.
    pub fn correlation_ids(&self) -> impl Iterator<Item = &str> {
        self.correlation_id
            .iter()
            .chain(&self.chunk_correlation_ids)
            .map(String::as_str)
    }

    /// Records the id of an appended chunk.
    pub(crate) fn add_chunk_id(&mut self, id: &str) {
        if id.is_empty() || self.correlation_ids().any(|known| known == id) {
            return;
        }
        self.chunk_correlation_ids.push(id.to_string());
    }

    /// Adds observed ids not already present, keeping first-seen order.
    pub(crate) fn observe(&mut self, ids: &[String]) {
        for id in ids {
            if !id.is_empty() && !self.observed_correlation_ids.contains(id) {
                self.observed_correlation_ids.push(id.clone());
            }
        }
    }
}
