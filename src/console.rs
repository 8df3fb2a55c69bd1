//! Console application state and its mutators.
//!
//! Everything the renderer reads lives in [`ConsoleState`]. Event application,
//! user actions, and resizes are the only ways to change it.

use agent_events::{AgentEvent, EventRecord, SessionId};
use tracing::{debug, info, warn};

use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::render::frame::ConsoleFrame;
use crate::render::layout::{compute_pane_rects, PaneRect};
use crate::render::renderer::render;
use crate::session::pause::{PauseTrigger, Transition};
use crate::session::{CorrelationGraph, MessageRef, Session, SessionRegistry};

const DEFAULT_TERMINAL_SIZE: (usize, usize) = (80, 24);
const INTERRUPT_NOTICE: &str = "⏸ Interrupted by user";
const RESUME_NOTICE: &str = "▶ Resumed";
const APPROVED_NOTICE: &str = "✓ Tool call approved";
const DENIED_NOTICE: &str = "✗ Tool call denied";

#[derive(Debug, Clone)]
pub struct ConsoleState {
    config: ConsoleConfig,
    registry: SessionRegistry,
    correlation: CorrelationGraph,
    selection: Option<String>,
    terminal_size: (usize, usize),
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self::new(ConsoleConfig::default())
    }
}

impl ConsoleState {
    pub fn new(config: ConsoleConfig) -> Self {
        Self {
            registry: SessionRegistry::new(config.max_sessions),
            config,
            correlation: CorrelationGraph::new(),
            selection: None,
            terminal_size: DEFAULT_TERMINAL_SIZE,
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn correlation(&self) -> &CorrelationGraph {
        &self.correlation
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// `(columns, rows)` last reported by the host.
    pub fn terminal_size(&self) -> (usize, usize) {
        self.terminal_size
    }

    pub fn session(&self, id: &SessionId) -> Option<&Session> {
        self.registry.get(id)
    }

    /// Renders at the last reported terminal size.
    pub fn render(&self) -> ConsoleFrame {
        let (columns, rows) = self.terminal_size;
        render(self, columns, rows)
    }

    /// Records `columns x rows` as the terminal size, then renders at it, so later
    /// scrolls and row selections use the geometry the user is looking at.
    pub fn render_at(&mut self, columns: usize, rows: usize) -> ConsoleFrame {
        if self.terminal_size != (columns, rows) {
            self.resize(columns, rows);
        }
        self.render()
    }

    pub fn add_session(&mut self, id: SessionId, name: impl Into<String>) -> Result<(), ConsoleError> {
        let session = Session::new(id, name, &self.config);
        self.registry.insert(session)
    }

    /// Removes a session together with its watch relations and correlation entries.
    pub fn remove_session(&mut self, id: &SessionId) -> Result<Session, ConsoleError> {
        let removed = self.registry.remove(id)?;
        self.correlation.remove_session(id);
        Ok(removed)
    }

    /// Applies one record to a session. Returns whether anything visible changed.
    pub fn apply_event(&mut self, id: &SessionId, record: &EventRecord) -> Result<bool, ConsoleError> {
        let session = self.registry.require_mut(id)?;
        let touched = session.transcript_mut().apply(record);
        let mut changed = !touched.is_empty();

        for index in touched {
            let message = &session.messages()[index];
            self.correlation.register(
                &MessageRef::new(id.clone(), index),
                message.correlation_ids(),
                &message.observed_correlation_ids,
            );
        }

        let pause_request = match &record.event {
            AgentEvent::ApprovalRequested {
                tool_name,
                message,
                details,
            } => Some((
                PauseTrigger::ToolApproval,
                Some(format!("{tool_name}: {message}")),
                details.clone(),
            )),
            AgentEvent::InputRequested { reason } => {
                Some((PauseTrigger::InputRequested, reason.clone(), None))
            }
            AgentEvent::SessionError { message, fatal } => Some((
                PauseTrigger::Failure { fatal: *fatal },
                Some(message.clone()),
                None,
            )),
            _ => None,
        };

        if let Some((trigger, reason, details)) = pause_request {
            let applied =
                session
                    .pause_mut()
                    .apply_with_details(trigger, reason, details, record.timestamp);
            match applied {
                Ok(transition) => {
                    if trigger == (PauseTrigger::Failure { fatal: true }) {
                        session.transcript_mut().finalize_streaming();
                    }
                    info!(session = %id, from = %transition.from, to = %transition.to, "pause state changed");
                    changed = true;
                }
                Err(err) => warn!(session = %id, error = %err, "ignoring pause request"),
            }
        }

        Ok(changed)
    }

    /// Decodes and applies a raw JSON record. Undecodable records are logged and dropped.
    pub fn apply_json(&mut self, id: &SessionId, raw: &str) -> Result<bool, ConsoleError> {
        match EventRecord::from_json(raw) {
            Ok(record) => self.apply_event(id, &record),
            Err(err) => {
                if self.registry.get(id).is_none() {
                    return Err(ConsoleError::UnknownSession(id.clone()));
                }
                warn!(session = %id, error = %err, "dropping undecodable event");
                Ok(false)
            }
        }
    }

    /// Pauses a running session on the user's behalf. Streaming output is kept and finalized as-is.
    pub fn interrupt(&mut self, id: &SessionId) -> Result<Transition, ConsoleError> {
        let session = self.registry.require_mut(id)?;
        let transition = session.pause_mut().interrupt(None)?;

        let transcript = session.transcript_mut();
        transcript.finalize_streaming();
        let index = transcript.push_status(INTERRUPT_NOTICE, false);
        transcript.complete_turn();
        self.register_message(id, index);

        info!(session = %id, "session interrupted");
        Ok(transition)
    }

    pub fn resume(&mut self, id: &SessionId) -> Result<Transition, ConsoleError> {
        let session = self.registry.require_mut(id)?;
        let transition = session.pause_mut().resume()?;
        let index = session.transcript_mut().push_status(RESUME_NOTICE, false);
        self.register_message(id, index);

        info!(session = %id, "session resumed");
        Ok(transition)
    }

    /// Answers a tool-approval pause. Only legal while the session waits for approval.
    pub fn confirm(&mut self, id: &SessionId, approved: bool) -> Result<Transition, ConsoleError> {
        let session = self.registry.require_mut(id)?;
        let transition = session.pause_mut().confirm(approved)?;
        let notice = if approved { APPROVED_NOTICE } else { DENIED_NOTICE };
        let index = session.transcript_mut().push_status(notice, false);
        self.register_message(id, index);

        info!(session = %id, approved, "tool approval answered");
        Ok(transition)
    }

    pub fn focus(&mut self, id: &SessionId) -> Result<(), ConsoleError> {
        self.registry.focus(id)
    }

    pub fn focus_next(&mut self) -> Option<SessionId> {
        self.registry.focus_next().cloned()
    }

    pub fn focus_prev(&mut self) -> Option<SessionId> {
        self.registry.focus_prev().cloned()
    }

    /// Selects a correlation id for highlighting across every pane.
    pub fn select(&mut self, correlation_id: impl Into<String>) {
        self.selection = Some(correlation_id.into());
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Selects the correlation id of the message behind `row` of a session's
    /// transcript at its current pane width. Separators select nothing.
    pub fn select_line(&mut self, id: &SessionId, row: usize) -> Result<Option<String>, ConsoleError> {
        let rect = self.pane_rect(id)?;
        let session = self
            .registry
            .get(id)
            .ok_or_else(|| ConsoleError::UnknownSession(id.clone()))?;
        let selected = session
            .lines(rect.width)
            .into_iter()
            .nth(row)
            .filter(|line| !line.is_separator)
            .and_then(|line| line.correlation_id);

        if let Some(correlation_id) = &selected {
            self.selection = Some(correlation_id.clone());
        }
        Ok(selected)
    }

    /// Scrolls a pane by `delta` rows; negative scrolls toward older output.
    pub fn scroll(&mut self, id: &SessionId, delta: isize) -> Result<(), ConsoleError> {
        self.with_viewport(id, |viewport, total, height| {
            viewport.scroll_by(delta, total, height)
        })
    }

    pub fn page_up(&mut self, id: &SessionId) -> Result<(), ConsoleError> {
        self.with_viewport(id, |viewport, total, height| viewport.page_up(total, height))
    }

    pub fn page_down(&mut self, id: &SessionId) -> Result<(), ConsoleError> {
        self.with_viewport(id, |viewport, total, height| viewport.page_down(total, height))
    }

    pub fn scroll_to_top(&mut self, id: &SessionId) -> Result<(), ConsoleError> {
        self.with_viewport(id, |viewport, total, height| {
            viewport.scroll_to_top(total, height)
        })
    }

    pub fn scroll_to_bottom(&mut self, id: &SessionId) -> Result<(), ConsoleError> {
        self.with_viewport(id, |viewport, _, _| viewport.scroll_to_bottom())
    }

    /// Brings the first row of a message to the top of its pane. Returns `false`
    /// when the session has no such message.
    pub fn scroll_to_message(&mut self, id: &SessionId, message_index: usize) -> Result<bool, ConsoleError> {
        let rect = self.pane_rect(id)?;
        let session = self.registry.require_mut(id)?;
        let lines = session.lines(rect.width);
        let Some(row) = lines
            .iter()
            .position(|line| line.message_index == message_index && !line.is_separator)
        else {
            return Ok(false);
        };
        session
            .viewport_mut()
            .scroll_to(row, lines.len(), rect.body_height());
        Ok(true)
    }

    /// Flips between collapsed and full tool output. Returns the new setting.
    pub fn toggle_tool_output(&mut self, id: &SessionId) -> Result<bool, ConsoleError> {
        let session = self.registry.require_mut(id)?;
        let expand = !session.expand_tool_output();
        session.set_expand_tool_output(expand);
        Ok(expand)
    }

    pub fn add_watcher(&mut self, parent: &SessionId, watcher: &SessionId) -> Result<(), ConsoleError> {
        self.registry.add_watcher(parent, watcher)
    }

    pub fn remove_watcher(&mut self, watcher: &SessionId) {
        self.registry.remove_watcher(watcher);
    }

    /// Tags the session's following records with `ids` until cleared with an empty list.
    pub fn set_observed_correlation_ids(&mut self, id: &SessionId, ids: Vec<String>) -> Result<(), ConsoleError> {
        self.registry
            .require_mut(id)?
            .transcript_mut()
            .set_observed_correlation_ids(ids);
        Ok(())
    }

    pub fn resize(&mut self, columns: usize, rows: usize) {
        debug!(columns, rows, "terminal resized");
        self.terminal_size = (columns, rows);
    }

    /// Geometry of a session's pane at the current terminal size.
    pub fn pane_rect(&self, id: &SessionId) -> Result<PaneRect, ConsoleError> {
        let (columns, rows) = self.terminal_size;
        let (_, rects) = compute_pane_rects(
            columns,
            rows,
            self.registry.len(),
            self.config.min_pane_width,
        );
        self.registry
            .iter()
            .zip(rects)
            .find_map(|(session, rect)| (session.id() == id).then_some(rect))
            .ok_or_else(|| ConsoleError::UnknownSession(id.clone()))
    }

    fn with_viewport(
        &mut self,
        id: &SessionId,
        scroll: impl FnOnce(&mut crate::render::viewport::Viewport, usize, usize),
    ) -> Result<(), ConsoleError> {
        let rect = self.pane_rect(id)?;
        let session = self.registry.require_mut(id)?;
        let total = session.lines(rect.width).len();
        scroll(session.viewport_mut(), total, rect.body_height());
        Ok(())
    }

    fn register_message(&mut self, id: &SessionId, index: usize) {
        if let Some(message) = self.registry.get(id).and_then(|s| s.messages().get(index)) {
            self.correlation.register(
                &MessageRef::new(id.clone(), index),
                message.correlation_ids(),
                &message.observed_correlation_ids,
            );
        }
    }
}
