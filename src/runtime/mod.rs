//! Threaded ingest and render scheduling.

pub mod console_runtime;
pub mod render_scheduler;

pub use console_runtime::{ConsoleRuntime, SessionFeed};
pub use render_scheduler::RenderScheduler;
