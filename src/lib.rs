//! Live multi-session conversation console.
//!
//! Invariant: rendering is pure. `render::render(state, width, height)` only reads
//! committed state, and every change goes through [`ConsoleState`] mutators.
//!
//! # Public API Overview
//! - Feed agent events into sessions through [`ConsoleRuntime`] and [`SessionFeed`],
//!   or drive [`ConsoleState`] directly from a single thread.
//! - Render a [`ConsoleFrame`] of styled rows per pane for any terminal size.
//! - Select a correlation id to highlight related messages across panes.
//! - Pause, resume, focus, scroll, and watch sessions.

pub mod config;
pub mod console;
pub mod core;
pub mod error;
pub mod logging;
pub mod render;
pub mod runtime;
pub mod session;
pub mod transcript;

pub use agent_events::{AgentEvent, EventRecord, NoopTransport, SessionId, SessionTransport};

pub use crate::config::ConsoleConfig;
pub use crate::console::ConsoleState;
pub use crate::error::ConsoleError;
pub use crate::logging::{init_logging, LogConfig, LogOutput};

/// Render-layer frame types.
pub use crate::render::{
    render, ConsoleFrame, PaneFrame, PaneRect, SplitOrientation, StyleTag, StyledLine, Viewport,
};
pub use crate::runtime::{ConsoleRuntime, RenderScheduler, SessionFeed};
pub use crate::session::{
    CorrelationGraph, HighlightSet, InvalidTransition, MessageRef, PauseKind, RunState, Session,
    SessionRegistry, SessionStatus, WatchGraph,
};
pub use crate::transcript::{ConversationLine, ConversationMessage, MessageAccumulator, MessageKind};

/// Escape-aware truncation helper.
pub use crate::core::text::wrap::{truncate_to_width, wrap_text};
/// Visible width helper that ignores escape sequences.
pub use crate::core::text::width::visible_width;
