//! Watcher relations between sessions.
//!
//! A watcher observes exactly one parent; a parent may have many watchers. The
//! relation never forms a cycle.

use std::collections::HashMap;

use agent_events::SessionId;

use crate::error::ConsoleError;

#[derive(Debug, Clone, Default)]
pub struct WatchGraph {
    parent_to_watchers: HashMap<SessionId, Vec<SessionId>>,
    watcher_to_parent: HashMap<SessionId, SessionId>,
}

impl WatchGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_watcher(&mut self, parent: &SessionId, watcher: &SessionId) -> Result<(), ConsoleError> {
        if parent == watcher {
            return Err(ConsoleError::SelfWatch(watcher.clone()));
        }
        if let Some(existing) = self.watcher_to_parent.get(watcher) {
            return Err(ConsoleError::WatcherAlreadyAttached {
                watcher: watcher.clone(),
                parent: existing.clone(),
            });
        }

        // Walk up from the parent; meeting the watcher means the new edge closes a loop.
        let mut current = parent;
        while let Some(grandparent) = self.watcher_to_parent.get(current) {
            if grandparent == watcher {
                return Err(ConsoleError::WatchCycle {
                    watcher: watcher.clone(),
                    parent: parent.clone(),
                });
            }
            current = grandparent;
        }

        self.watcher_to_parent.insert(watcher.clone(), parent.clone());
        self.parent_to_watchers
            .entry(parent.clone())
            .or_default()
            .push(watcher.clone());
        Ok(())
    }

    /// Detaches `watcher` from its parent. No-op when it watches nothing.
    pub fn remove_watcher(&mut self, watcher: &SessionId) {
        let Some(parent) = self.watcher_to_parent.remove(watcher) else {
            return;
        };
        if let Some(watchers) = self.parent_to_watchers.get_mut(&parent) {
            watchers.retain(|id| id != watcher);
            if watchers.is_empty() {
                self.parent_to_watchers.remove(&parent);
            }
        }
    }

    /// Drops every relation `session` takes part in, as watcher or as parent.
    pub fn remove_session(&mut self, session: &SessionId) {
        self.remove_watcher(session);
        for watcher in self.parent_to_watchers.remove(session).unwrap_or_default() {
            self.watcher_to_parent.remove(&watcher);
        }
    }

    pub fn watchers(&self, parent: &SessionId) -> &[SessionId] {
        self.parent_to_watchers
            .get(parent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn parent(&self, watcher: &SessionId) -> Option<&SessionId> {
        self.watcher_to_parent.get(watcher)
    }

    pub fn is_empty(&self) -> bool {
        self.parent_to_watchers.is_empty() && self.watcher_to_parent.is_empty()
    }
}
