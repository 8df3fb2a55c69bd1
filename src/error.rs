//! Errors returned by the console API.
//!
//! Malformed agent events never surface here: they are dropped and logged where they
//! are applied. These variants cover caller mistakes and host environment failures.

use std::io;
use std::path::PathBuf;

use agent_events::SessionId;
use thiserror::Error;

use crate::session::pause::InvalidTransition;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("unknown session '{0}'")]
    UnknownSession(SessionId),
    #[error("session '{0}' is already registered")]
    DuplicateSession(SessionId),
    #[error("session limit reached ({limit} live sessions)")]
    SessionLimitReached { limit: usize },
    #[error("session '{0}' cannot watch itself")]
    SelfWatch(SessionId),
    #[error("session '{watcher}' already watches '{parent}'")]
    WatcherAlreadyAttached { watcher: SessionId, parent: SessionId },
    #[error("'{watcher}' watching '{parent}' would create a watch cycle")]
    WatchCycle { watcher: SessionId, parent: SessionId },
    /// The pause state is unchanged.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("event feed for session '{0}' is closed")]
    FeedClosed(SessionId),
    #[error("failed to spawn feed worker for session '{session_id}': {source}")]
    WorkerSpawn {
        session_id: SessionId,
        #[source]
        source: io::Error,
    },
    #[error("invalid log filter '{filter}': {message}")]
    InvalidLogFilter { filter: String, message: String },
    #[error("failed to {operation} {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
