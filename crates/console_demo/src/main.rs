use std::io::{self, Write};
use std::sync::Arc;

use agent_console::{
    init_logging, truncate_to_width, visible_width, ConsoleConfig, ConsoleFrame, ConsoleRuntime,
    LogConfig, PaneFrame, SplitOrientation, StyleTag,
};
use agent_events::{AgentEvent, EventRecord, NoopTransport, SessionId};
use tracing::info;

const WIDTH: usize = 100;
const HEIGHT: usize = 16;

fn main() -> io::Result<()> {
    let config = ConsoleConfig::from_env();
    init_logging(&LogConfig::from_console_config(&config)).map_err(io::Error::other)?;

    let runtime = ConsoleRuntime::new(config, Arc::new(NoopTransport));
    let main_id = SessionId::from("main");
    let reviewer_id = SessionId::from("reviewer");

    let main_feed = runtime
        .start_session_with_id(main_id.clone(), "main")
        .map_err(io::Error::other)?;
    let reviewer_feed = runtime
        .start_session_with_id(reviewer_id.clone(), "reviewer")
        .map_err(io::Error::other)?;
    runtime
        .add_watcher(&main_id, &reviewer_id)
        .map_err(io::Error::other)?;

    for record in main_script() {
        main_feed.push(record).map_err(io::Error::other)?;
    }
    for record in reviewer_script() {
        reviewer_feed.push(record).map_err(io::Error::other)?;
    }
    main_feed.close();
    reviewer_feed.close();

    runtime.resize(WIDTH, HEIGHT);
    runtime.select("main-2");
    info!("rendering demo frame");

    let frame = runtime.render(WIDTH, HEIGHT);
    let mut stdout = io::stdout().lock();
    for row in compose(&frame) {
        writeln!(stdout, "{row}")?;
    }
    stdout.flush()
}

fn main_script() -> Vec<EventRecord> {
    vec![
        EventRecord::new(AgentEvent::UserInput {
            text: "Fix the flaky retry test in the network module".to_string(),
        }),
        EventRecord::new(AgentEvent::ThinkingDelta {
            text: "The retry loop probably sleeps on wall-clock time.".to_string(),
        }),
        EventRecord::new(AgentEvent::ToolCallStart {
            tool_call_id: "call-1".to_string(),
            tool_name: "read_file".to_string(),
            input: "src/net/retry.rs".to_string(),
        }),
        EventRecord::new(AgentEvent::ToolCallResult {
            tool_call_id: "call-1".to_string(),
            content: "fn retry() {\n    sleep(backoff);\n    attempt += 1;\n}\n// 40 more lines\n// ..."
                .to_string(),
            is_error: false,
        }),
        EventRecord::new(AgentEvent::TextDelta {
            text: "The test depends on real time. ".to_string(),
        }),
        EventRecord::new(AgentEvent::TextDelta {
            text: "I'll inject a clock so the backoff can be driven manually.".to_string(),
        }),
        EventRecord::new(AgentEvent::TurnComplete),
    ]
}

fn reviewer_script() -> Vec<EventRecord> {
    vec![
        EventRecord::new(AgentEvent::UserInput {
            text: "Review what main is doing".to_string(),
        }),
        EventRecord::new(AgentEvent::TextDelta {
            text: "Reading retry.rs is the right first step.".to_string(),
        })
        .observing(vec!["main-2".to_string()]),
        EventRecord::new(AgentEvent::TextDelta {
            text: " Make sure the clock is not global.".to_string(),
        }),
        EventRecord::new(AgentEvent::TurnComplete),
    ]
}

/// Lays panes out as plain text rows, marking highlighted rows with `*`.
fn compose(frame: &ConsoleFrame) -> Vec<String> {
    match frame.orientation {
        SplitOrientation::SideBySide => {
            let columns: Vec<Vec<String>> = frame.panes.iter().map(pane_rows).collect();
            (0..frame.height)
                .map(|row| {
                    columns
                        .iter()
                        .zip(&frame.panes)
                        .map(|(rows, pane)| {
                            pad(rows.get(row).map(String::as_str).unwrap_or(""), pane.rect.width)
                        })
                        .collect::<Vec<_>>()
                        .join("│")
                })
                .collect()
        }
        SplitOrientation::Stacked => frame
            .panes
            .iter()
            .flat_map(|pane| {
                let mut rows = pane_rows(pane);
                rows.resize(pane.rect.height, String::new());
                rows
            })
            .collect(),
    }
}

fn pane_rows(pane: &PaneFrame) -> Vec<String> {
    std::iter::once(pane.header.text().to_string())
        .chain(pane.lines.iter().map(|line| {
            let marker = if line.has_tag(StyleTag::Highlight) {
                '*'
            } else {
                ' '
            };
            let mut text = line.text().to_string();
            if visible_width(&text) >= pane.rect.width {
                // Keep the marker visible without overflowing the pane.
                text = truncate_to_width(&text, pane.rect.width.saturating_sub(1), "");
            }
            format!("{marker}{text}")
        }))
        .collect()
}

fn pad(text: &str, width: usize) -> String {
    let used = visible_width(text);
    let mut padded = text.to_string();
    padded.extend(std::iter::repeat(' ').take(width.saturating_sub(used)));
    padded
}
