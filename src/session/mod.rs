//! Session lifecycle, pause state, watch relations, and cross-session correlation.

pub mod correlation;
pub mod pause;
pub mod registry;
pub mod watch;

pub use correlation::{CorrelationGraph, HighlightSet, MessageRef};
pub use pause::{
    InvalidTransition, PauseController, PauseInfo, PauseKind, PauseTrigger, RunState,
    SessionStatus, Transition,
};
pub use registry::{Session, SessionRegistry};
pub use watch::WatchGraph;
