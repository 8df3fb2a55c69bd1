//! Threaded front of the console.
//!
//! Each session gets a [`SessionFeed`] and a named worker thread that applies its
//! records in arrival order. All workers share one [`ConsoleState`] behind a
//! coarse mutex, so a render never observes a half-applied event. A worker only
//! applies records while its own registration is live, so a feed left over from
//! a terminated session cannot write into a later session with the same id.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use agent_events::{EventRecord, SessionId, SessionTransport};
use tracing::{debug, error, info, warn};

use crate::config::ConsoleConfig;
use crate::console::ConsoleState;
use crate::error::ConsoleError;
use crate::render::frame::ConsoleFrame;
use crate::session::pause::Transition;

use super::render_scheduler::RenderScheduler;

enum FeedItem {
    Record(EventRecord),
    Raw(String),
}

pub struct ConsoleRuntime {
    state: Arc<Mutex<ConsoleState>>,
    registrations: Mutex<HashMap<SessionId, Arc<AtomicBool>>>,
    render_gate: Mutex<()>,
    scheduler: RenderScheduler,
    transport: Arc<dyn SessionTransport>,
}

impl ConsoleRuntime {
    pub fn new(config: ConsoleConfig, transport: Arc<dyn SessionTransport>) -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(Mutex::new(ConsoleState::new(config))),
            registrations: Mutex::new(HashMap::new()),
            render_gate: Mutex::new(()),
            scheduler: RenderScheduler::new(),
            transport,
        })
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    /// Registers a session under a fresh id and starts its feed worker.
    pub fn start_session(&self, name: impl Into<String>) -> Result<SessionFeed, ConsoleError> {
        self.start_session_with_id(SessionId::generate(), name)
    }

    pub fn start_session_with_id(
        &self,
        session_id: SessionId,
        name: impl Into<String>,
    ) -> Result<SessionFeed, ConsoleError> {
        let mut registrations = lock_unpoisoned(&self.registrations);
        lock_unpoisoned(&self.state).add_session(session_id.clone(), name)?;

        let live = Arc::new(AtomicBool::new(true));
        let (sender, receiver) = mpsc::channel();
        let worker = FeedWorker {
            session_id: session_id.clone(),
            live: Arc::clone(&live),
            state: Arc::clone(&self.state),
            scheduler: self.scheduler.clone(),
        };
        let spawned = thread::Builder::new()
            .name(format!("agent-console-feed-{session_id}"))
            .spawn(move || worker.run(receiver));

        let worker = match spawned {
            Ok(worker) => worker,
            Err(source) => {
                // The session never had a worker, so nothing else references it yet.
                let _ = lock_unpoisoned(&self.state).remove_session(&session_id);
                return Err(ConsoleError::WorkerSpawn { session_id, source });
            }
        };
        registrations.insert(session_id.clone(), live);
        drop(registrations);

        self.scheduler.request();
        Ok(SessionFeed {
            session_id,
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Removes the session from the console. Records still queued on its feed, or
    /// pushed later, are discarded by the worker even if the id is registered again.
    pub fn terminate_session(&self, id: &SessionId) -> Result<(), ConsoleError> {
        let mut registrations = lock_unpoisoned(&self.registrations);
        self.update(|state| state.remove_session(id).map(|_| ()))?;
        if let Some(live) = registrations.remove(id) {
            live.store(false, Ordering::Release);
        }
        Ok(())
    }

    /// Renders the committed state at `width x height`, recording that size for
    /// later scrolls. Only one render pass runs at a time.
    pub fn render(&self, width: usize, height: usize) -> ConsoleFrame {
        let _gate = lock_unpoisoned(&self.render_gate);
        let mut state = lock_unpoisoned(&self.state);
        state.render_at(width, height)
    }

    /// Renders at the last size passed to [`ConsoleRuntime::resize`].
    pub fn render_current(&self) -> ConsoleFrame {
        let _gate = lock_unpoisoned(&self.render_gate);
        let state = lock_unpoisoned(&self.state);
        state.render()
    }

    pub fn resize(&self, columns: usize, rows: usize) {
        lock_unpoisoned(&self.state).resize(columns, rows);
        self.scheduler.request();
    }

    pub fn select(&self, correlation_id: impl Into<String>) {
        let correlation_id = correlation_id.into();
        lock_unpoisoned(&self.state).select(correlation_id);
        self.scheduler.request();
    }

    pub fn clear_selection(&self) {
        lock_unpoisoned(&self.state).clear_selection();
        self.scheduler.request();
    }

    /// Selects the message behind a transcript row; see [`ConsoleState::select_line`].
    pub fn select_line(&self, id: &SessionId, row: usize) -> Result<Option<String>, ConsoleError> {
        self.update(|state| state.select_line(id, row))
    }

    pub fn focus(&self, id: &SessionId) -> Result<(), ConsoleError> {
        self.update(|state| state.focus(id))
    }

    pub fn focus_next(&self) -> Option<SessionId> {
        let focused = lock_unpoisoned(&self.state).focus_next();
        self.scheduler.request();
        focused
    }

    pub fn focus_prev(&self) -> Option<SessionId> {
        let focused = lock_unpoisoned(&self.state).focus_prev();
        self.scheduler.request();
        focused
    }

    pub fn scroll(&self, id: &SessionId, delta: isize) -> Result<(), ConsoleError> {
        self.update(|state| state.scroll(id, delta))
    }

    pub fn page_up(&self, id: &SessionId) -> Result<(), ConsoleError> {
        self.update(|state| state.page_up(id))
    }

    pub fn page_down(&self, id: &SessionId) -> Result<(), ConsoleError> {
        self.update(|state| state.page_down(id))
    }

    pub fn scroll_to_top(&self, id: &SessionId) -> Result<(), ConsoleError> {
        self.update(|state| state.scroll_to_top(id))
    }

    pub fn scroll_to_bottom(&self, id: &SessionId) -> Result<(), ConsoleError> {
        self.update(|state| state.scroll_to_bottom(id))
    }

    pub fn scroll_to_message(&self, id: &SessionId, message_index: usize) -> Result<bool, ConsoleError> {
        self.update(|state| state.scroll_to_message(id, message_index))
    }

    pub fn toggle_tool_output(&self, id: &SessionId) -> Result<bool, ConsoleError> {
        self.update(|state| state.toggle_tool_output(id))
    }

    pub fn add_watcher(&self, parent: &SessionId, watcher: &SessionId) -> Result<(), ConsoleError> {
        self.update(|state| state.add_watcher(parent, watcher))
    }

    pub fn remove_watcher(&self, watcher: &SessionId) {
        lock_unpoisoned(&self.state).remove_watcher(watcher);
        self.scheduler.request();
    }

    /// Ids the session's next opened message will observe.
    pub fn set_observed_correlation_ids(
        &self,
        id: &SessionId,
        ids: Vec<String>,
    ) -> Result<(), ConsoleError> {
        self.update(|state| state.set_observed_correlation_ids(id, ids))
    }

    /// Pauses the session locally, then asks the agent to stop.
    pub fn interrupt(&self, id: &SessionId) -> Result<Transition, ConsoleError> {
        let transition = self.update(|state| state.interrupt(id))?;
        self.transport.interrupt(id);
        Ok(transition)
    }

    pub fn resume(&self, id: &SessionId) -> Result<Transition, ConsoleError> {
        let transition = self.update(|state| state.resume(id))?;
        self.transport.resume(id);
        Ok(transition)
    }

    /// Answers a pending tool approval locally, then forwards the answer.
    pub fn confirm(&self, id: &SessionId, approved: bool) -> Result<Transition, ConsoleError> {
        let transition = self.update(|state| state.confirm(id, approved))?;
        self.transport.confirm(id, approved);
        Ok(transition)
    }

    /// Runs `f` against the state under the state lock without requesting a render.
    pub fn with_state<R>(&self, f: impl FnOnce(&ConsoleState) -> R) -> R {
        let state = lock_unpoisoned(&self.state);
        f(&state)
    }

    fn update<R>(
        &self,
        f: impl FnOnce(&mut ConsoleState) -> Result<R, ConsoleError>,
    ) -> Result<R, ConsoleError> {
        let result = f(&mut lock_unpoisoned(&self.state));
        if result.is_ok() {
            self.scheduler.request();
        }
        result
    }
}

impl std::fmt::Debug for ConsoleRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleRuntime")
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

struct FeedWorker {
    session_id: SessionId,
    live: Arc<AtomicBool>,
    state: Arc<Mutex<ConsoleState>>,
    scheduler: RenderScheduler,
}

impl FeedWorker {
    fn run(self, receiver: Receiver<FeedItem>) {
        let session_id = &self.session_id;
        debug!(session = %session_id, "feed worker started");
        for item in receiver {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                let mut state = lock_unpoisoned(&self.state);
                if !self.live.load(Ordering::Acquire) {
                    return Err(ConsoleError::UnknownSession(session_id.clone()));
                }
                match &item {
                    FeedItem::Record(record) => state.apply_event(session_id, record),
                    FeedItem::Raw(raw) => state.apply_json(session_id, raw),
                }
            }));

            match outcome {
                Ok(Ok(true)) => self.scheduler.request(),
                Ok(Ok(false)) => {}
                Ok(Err(ConsoleError::UnknownSession(_))) => {
                    debug!(session = %session_id, "discarding record for removed session");
                }
                Ok(Err(err)) => warn!(session = %session_id, error = %err, "record rejected"),
                Err(_) => error!(session = %session_id, "feed worker panicked applying a record"),
            }
        }
        debug!(session = %session_id, "feed worker stopped");
    }
}

/// Producer side of one session's event feed.
///
/// Records pushed through one feed are applied in push order. Dropping the feed
/// lets the worker drain and exit in the background; [`SessionFeed::close`]
/// waits for it.
#[derive(Debug)]
pub struct SessionFeed {
    session_id: SessionId,
    sender: Option<Sender<FeedItem>>,
    worker: Option<JoinHandle<()>>,
}

impl SessionFeed {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn push(&self, record: EventRecord) -> Result<(), ConsoleError> {
        self.send(FeedItem::Record(record))
    }

    /// Queues a raw JSON record. Decoding happens on the worker; undecodable
    /// records are logged and dropped there.
    pub fn push_json(&self, raw: impl Into<String>) -> Result<(), ConsoleError> {
        self.send(FeedItem::Raw(raw.into()))
    }

    /// Closes the feed and blocks until every pushed record has been applied.
    pub fn close(mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!(session = %self.session_id, "feed worker exited with a panic");
            }
        }
        info!(session = %self.session_id, "feed closed");
    }

    fn send(&self, item: FeedItem) -> Result<(), ConsoleError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| ConsoleError::FeedClosed(self.session_id.clone()))?;
        sender
            .send(item)
            .map_err(|_| ConsoleError::FeedClosed(self.session_id.clone()))
    }
}

impl Drop for SessionFeed {
    fn drop(&mut self) {
        self.sender.take();
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
