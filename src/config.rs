//! Environment configuration.

use std::env;

pub const DEFAULT_MIN_PANE_WIDTH: usize = 40;
pub const DEFAULT_MAX_SESSIONS: usize = 10;
pub const DEFAULT_TOOL_PREVIEW_LINES: usize = 4;
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Narrowest pane that still allows side-by-side layout.
    pub min_pane_width: usize,
    pub max_sessions: usize,
    /// Result lines shown under a collapsed tool call.
    pub tool_preview_lines: usize,
    /// Initial tool-output expansion for new sessions.
    pub expand_tool_output: bool,
    pub log_filter: String,
    pub log_file: Option<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            min_pane_width: DEFAULT_MIN_PANE_WIDTH,
            max_sessions: DEFAULT_MAX_SESSIONS,
            tool_preview_lines: DEFAULT_TOOL_PREVIEW_LINES,
            expand_tool_output: false,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_file: None,
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Self {
        Self {
            min_pane_width: env_usize("AGENT_CONSOLE_MIN_PANE_WIDTH", DEFAULT_MIN_PANE_WIDTH),
            max_sessions: env_usize("AGENT_CONSOLE_MAX_SESSIONS", DEFAULT_MAX_SESSIONS),
            tool_preview_lines: env_usize(
                "AGENT_CONSOLE_TOOL_PREVIEW_LINES",
                DEFAULT_TOOL_PREVIEW_LINES,
            ),
            expand_tool_output: env_flag("AGENT_CONSOLE_EXPAND_TOOLS"),
            log_filter: env_string_opt("AGENT_CONSOLE_LOG")
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            log_file: env_string_opt("AGENT_CONSOLE_LOG_FILE"),
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

/// Positive integer from the environment; zero, garbage, or absence yields `default`.
fn env_usize(key: &str, default: usize) -> usize {
    env_string_opt(key)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}
