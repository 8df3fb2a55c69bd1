//! Logging setup on the `tracing` ecosystem.
//!
//! The terminal belongs to the external renderer, so hosts normally log to a file.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ConsoleConfig;
use crate::error::ConsoleError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stderr,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub output: LogOutput,
    /// `EnvFilter` directives, e.g. `warn` or `agent_console=debug`.
    pub filter: String,
    pub file_line: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output: LogOutput::Stderr,
            filter: crate::config::DEFAULT_LOG_FILTER.to_string(),
            file_line: false,
        }
    }
}

impl LogConfig {
    /// File output when `AGENT_CONSOLE_LOG_FILE` is set, stderr otherwise.
    pub fn from_console_config(config: &ConsoleConfig) -> Self {
        Self {
            output: config
                .log_file
                .as_ref()
                .map_or(LogOutput::Stderr, |path| LogOutput::File(PathBuf::from(path))),
            filter: config.log_filter.clone(),
            file_line: false,
        }
    }
}

/// Installs the global subscriber.
///
/// Returns `Ok(())` without changes when a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), ConsoleError> {
    let filter =
        EnvFilter::try_new(&config.filter).map_err(|err| ConsoleError::InvalidLogFilter {
            filter: config.filter.clone(),
            message: err.to_string(),
        })?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_file(config.file_line)
        .with_line_number(config.file_line);

    let installed = match &config.output {
        LogOutput::Stderr => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.with_writer(std::io::stderr))
            .try_init(),
        LogOutput::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| ConsoleError::Io {
                    operation: "open log file",
                    path: path.clone(),
                    source,
                })?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.with_writer(Mutex::new(file)).with_ansi(false))
                .try_init()
        }
    };

    if installed.is_err() {
        tracing::debug!("global subscriber already installed; keeping it");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_without_log_file_targets_stderr() {
        let config = ConsoleConfig::default();
        let log = LogConfig::from_console_config(&config);
        assert_eq!(log.output, LogOutput::Stderr);
        assert_eq!(log.filter, "warn");
    }

    #[test]
    fn config_with_log_file_targets_file() {
        let config = ConsoleConfig {
            log_file: Some("/tmp/agent-console.log".to_string()),
            log_filter: "debug".to_string(),
            ..ConsoleConfig::default()
        };
        let log = LogConfig::from_console_config(&config);
        assert_eq!(
            log.output,
            LogOutput::File(PathBuf::from("/tmp/agent-console.log"))
        );
        assert_eq!(log.filter, "debug");
    }

    #[test]
    fn invalid_filter_is_rejected_before_install() {
        let config = LogConfig {
            filter: "agent_console=verbose".to_string(),
            ..LogConfig::default()
        };
        assert!(matches!(
            init_logging(&config),
            Err(ConsoleError::InvalidLogFilter { .. })
        ));
    }

    #[test]
    fn file_logging_can_be_initialized_twice() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = LogConfig {
            output: LogOutput::File(dir.path().join("console.log")),
            filter: "debug".to_string(),
            file_line: true,
        };
        init_logging(&config).expect("first init");
        init_logging(&config).expect("second init is a no-op");
        assert!(dir.path().join("console.log").exists());
    }
}
