//! Per-session event contract consumed by the conversation console.
//!
//! This crate defines only the record shape an external session transport pushes
//! for one already-demultiplexed session stream, and the signals the console sends
//! back. It excludes process spawning, protocol framing, and rendering concerns.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

/// Identifier for one agent session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps an externally assigned identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random (UUID v4) identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// One streamed event from an agent session.
///
/// Serialized adjacently tagged: `{"kind": "text-delta", "payload": {"text": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "kebab-case")]
pub enum AgentEvent {
    UserInput {
        text: String,
    },
    TextDelta {
        text: String,
    },
    ThinkingDelta {
        text: String,
    },
    ToolCallStart {
        tool_call_id: String,
        tool_name: String,
        #[serde(default)]
        input: String,
    },
    ToolCallResult {
        tool_call_id: String,
        #[serde(default)]
        content: String,
        #[serde(default)]
        is_error: bool,
    },
    StatusChange {
        status: String,
    },
    /// Closes the current turn; every streaming message is finalized.
    TurnComplete,
    /// The agent blocked on a tool that needs user approval.
    ApprovalRequested {
        tool_name: String,
        message: String,
        #[serde(default)]
        details: Option<String>,
    },
    /// The agent blocked waiting for user input.
    InputRequested {
        #[serde(default)]
        reason: Option<String>,
    },
    SessionError {
        message: String,
        #[serde(default)]
        fatal: bool,
    },
}

impl AgentEvent {
    /// Stable wire name of the event kind, used in logs and decode errors.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::UserInput { .. } => "user-input",
            Self::TextDelta { .. } => "text-delta",
            Self::ThinkingDelta { .. } => "thinking-delta",
            Self::ToolCallStart { .. } => "tool-call-start",
            Self::ToolCallResult { .. } => "tool-call-result",
            Self::StatusChange { .. } => "status-change",
            Self::TurnComplete => "turn-complete",
            Self::ApprovalRequested { .. } => "approval-requested",
            Self::InputRequested { .. } => "input-requested",
            Self::SessionError { .. } => "session-error",
        }
    }
}

/// One event plus its delivery metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub event: AgentEvent,
    pub timestamp: OffsetDateTime,
    /// Identity of the chunk this record carries. Assigned by the console when absent.
    pub correlation_id: Option<String>,
    /// Chunks of other sessions this record was produced in response to.
    pub observed_correlation_ids: Vec<String>,
}

impl EventRecord {
    /// Creates a record stamped with the current UTC time.
    #[must_use]
    pub fn new(event: AgentEvent) -> Self {
        Self {
            event,
            timestamp: OffsetDateTime::now_utc(),
            correlation_id: None,
            observed_correlation_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    #[must_use]
    pub fn observing<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.observed_correlation_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn at(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Decodes one JSON record.
    ///
    /// A missing `timestamp` is stamped with the current time; a present but
    /// unparseable one is an error.
    pub fn from_json(raw: &str) -> Result<Self, EventDecodeError> {
        let wire: WireRecord = serde_json::from_str(raw).map_err(EventDecodeError::Json)?;
        let kind = wire.kind;

        let tagged = if wire.payload.is_null() {
            serde_json::json!({ "kind": kind })
        } else {
            serde_json::json!({ "kind": kind, "payload": wire.payload })
        };
        let event: AgentEvent = serde_json::from_value(tagged)
            .map_err(|source| EventDecodeError::Payload { kind, source })?;

        let timestamp = match wire.timestamp {
            Some(value) => OffsetDateTime::parse(&value, &Rfc3339)
                .map_err(|source| EventDecodeError::Timestamp { value, source })?,
            None => OffsetDateTime::now_utc(),
        };

        Ok(Self {
            event,
            timestamp,
            correlation_id: wire.correlation_id.filter(|id| !id.is_empty()),
            observed_correlation_ids: wire.observed_correlation_ids,
        })
    }

    /// Encodes the record in the same shape [`EventRecord::from_json`] accepts.
    pub fn to_json(&self) -> Result<String, EventEncodeError> {
        let mut value = serde_json::to_value(&self.event)?;
        if let Value::Object(map) = &mut value {
            let timestamp = self.timestamp.format(&Rfc3339)?;
            map.insert("timestamp".to_string(), Value::String(timestamp));
            if let Some(id) = &self.correlation_id {
                map.insert("correlation_id".to_string(), Value::String(id.clone()));
            }
            if !self.observed_correlation_ids.is_empty() {
                map.insert(
                    "observed_correlation_ids".to_string(),
                    Value::from(self.observed_correlation_ids.clone()),
                );
            }
        }
        Ok(value.to_string())
    }
}

#[derive(Deserialize)]
struct WireRecord {
    kind: String,
    #[serde(default)]
    payload: Value,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    correlation_id: Option<String>,
    #[serde(default)]
    observed_correlation_ids: Vec<String>,
}

/// Failure to decode one raw event record.
#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("event record is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("unknown or malformed '{kind}' event: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid RFC3339 timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: time::error::Parse,
    },
}

#[derive(Debug, Error)]
pub enum EventEncodeError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Timestamp(#[from] time::error::Format),
}

/// Signals the console sends back to the process that owns a session.
///
/// Implementations must not block: they are called while the user is waiting
/// for the pane to reflect the new pause state.
pub trait SessionTransport: Send + Sync + 'static {
    /// Asks the agent to stop its current turn.
    fn interrupt(&self, session_id: &SessionId);

    /// Lets a paused agent continue.
    fn resume(&self, session_id: &SessionId);

    /// Answers a pending tool-approval request.
    fn confirm(&self, session_id: &SessionId, approved: bool);
}

/// Transport that drops every signal, for headless hosts and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTransport;

impl SessionTransport for NoopTransport {
    fn interrupt(&self, _session_id: &SessionId) {}

    fn resume(&self, _session_id: &SessionId) {}

    fn confirm(&self, _session_id: &SessionId, _approved: bool) {}
}
