//! Live sessions, focus, and watcher relations.

use agent_events::SessionId;
use tracing::info;

use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::render::viewport::Viewport;
use crate::transcript::{flatten_messages, ConversationLine, ConversationMessage, MessageAccumulator};

use super::pause::{PauseController, SessionStatus};
use super::watch::WatchGraph;

/// One running agent conversation and its view state.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    name: String,
    transcript: MessageAccumulator,
    pause: PauseController,
    viewport: Viewport,
    expand_tool_output: bool,
    focused: bool,
}

impl Session {
    pub fn new(id: SessionId, name: impl Into<String>, config: &ConsoleConfig) -> Self {
        Self {
            transcript: MessageAccumulator::new(id.clone())
                .with_tool_preview_lines(config.tool_preview_lines),
            id,
            name: name.into(),
            pause: PauseController::new(),
            viewport: Viewport::default(),
            expand_tool_output: config.expand_tool_output,
            focused: false,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        self.transcript.messages()
    }

    pub fn pause(&self) -> &PauseController {
        &self.pause
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn expand_tool_output(&self) -> bool {
        self.expand_tool_output
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn status(&self) -> SessionStatus {
        self.pause.status(self.transcript.is_streaming())
    }

    /// Transcript rows at `width`.
    pub fn lines(&self, width: usize) -> Vec<ConversationLine> {
        flatten_messages(self.messages(), width, self.expand_tool_output)
    }

    pub(crate) fn transcript_mut(&mut self) -> &mut MessageAccumulator {
        &mut self.transcript
    }

    pub(crate) fn pause_mut(&mut self) -> &mut PauseController {
        &mut self.pause
    }

    pub(crate) fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub(crate) fn set_expand_tool_output(&mut self, expand: bool) {
        self.expand_tool_output = expand;
    }
}

/// Owns every live session in display order.
///
/// Whenever the registry is non-empty exactly one session is focused.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    sessions: Vec<Session>,
    watch: WatchGraph,
    capacity: usize,
}

impl SessionRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Vec::new(),
            watch: WatchGraph::new(),
            capacity,
        }
    }

    pub fn insert(&mut self, mut session: Session) -> Result<(), ConsoleError> {
        if self.position(session.id()).is_some() {
            return Err(ConsoleError::DuplicateSession(session.id().clone()));
        }
        if self.sessions.len() >= self.capacity {
            return Err(ConsoleError::SessionLimitReached {
                limit: self.capacity,
            });
        }

        session.focused = self.sessions.is_empty();
        info!(session = %session.id(), name = session.name(), "session registered");
        self.sessions.push(session);
        Ok(())
    }

    /// Removes a session and its watch relations. Focus moves to the next session,
    /// or to the previous one when the removed session was last.
    pub fn remove(&mut self, id: &SessionId) -> Result<Session, ConsoleError> {
        let position = self
            .position(id)
            .ok_or_else(|| ConsoleError::UnknownSession(id.clone()))?;
        let removed = self.sessions.remove(position);
        self.watch.remove_session(id);

        if removed.focused {
            let successor = position.min(self.sessions.len().saturating_sub(1));
            if let Some(session) = self.sessions.get_mut(successor) {
                session.focused = true;
            }
        }
        info!(session = %id, "session removed");
        Ok(removed)
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.iter().find(|session| session.id() == id)
    }

    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|session| session.id() == id)
    }

    pub(crate) fn require_mut(&mut self, id: &SessionId) -> Result<&mut Session, ConsoleError> {
        self.get_mut(id)
            .ok_or_else(|| ConsoleError::UnknownSession(id.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn focused(&self) -> Option<&Session> {
        self.sessions.iter().find(|session| session.focused)
    }

    /// Moves focus to `id`. Pause state is never touched.
    pub fn focus(&mut self, id: &SessionId) -> Result<(), ConsoleError> {
        let target = self
            .position(id)
            .ok_or_else(|| ConsoleError::UnknownSession(id.clone()))?;
        self.focus_index(target);
        Ok(())
    }

    pub fn focus_next(&mut self) -> Option<&SessionId> {
        let current = self.focused_index()?;
        self.focus_index((current + 1) % self.sessions.len());
        self.focused().map(Session::id)
    }

    pub fn focus_prev(&mut self) -> Option<&SessionId> {
        let current = self.focused_index()?;
        let len = self.sessions.len();
        self.focus_index((current + len - 1) % len);
        self.focused().map(Session::id)
    }

    pub fn watch(&self) -> &WatchGraph {
        &self.watch
    }

    pub fn add_watcher(&mut self, parent: &SessionId, watcher: &SessionId) -> Result<(), ConsoleError> {
        for id in [parent, watcher] {
            if self.position(id).is_none() {
                return Err(ConsoleError::UnknownSession(id.clone()));
            }
        }
        self.watch.add_watcher(parent, watcher)?;
        info!(parent = %parent, watcher = %watcher, "watcher attached");
        Ok(())
    }

    pub fn remove_watcher(&mut self, watcher: &SessionId) {
        self.watch.remove_watcher(watcher);
    }

    fn focus_index(&mut self, target: usize) {
        for (index, session) in self.sessions.iter_mut().enumerate() {
            session.focused = index == target;
        }
    }

    fn focused_index(&self) -> Option<usize> {
        self.sessions.iter().position(|session| session.focused)
    }

    fn position(&self, id: &SessionId) -> Option<usize> {
        self.sessions.iter().position(|session| session.id() == id)
    }
}
