//! Coalescing render requests.
//!
//! Feed workers call [`RenderScheduler::request`] after every applied change; the
//! host loop waits on the scheduler and renders once per burst of requests.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Default)]
struct SchedulerState {
    render_requested: bool,
    stop_requested: bool,
}

#[derive(Default)]
struct SchedulerShared {
    state: Mutex<SchedulerState>,
    cvar: Condvar,
}

impl SchedulerShared {
    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Cloneable handle; all clones share one pending flag.
#[derive(Clone, Default)]
pub struct RenderScheduler {
    shared: Arc<SchedulerShared>,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        let mut state = self.shared.lock();
        state.render_requested = true;
        self.shared.cvar.notify_all();
    }

    /// Returns whether a render was pending and clears the flag.
    pub fn take_request(&self) -> bool {
        let mut state = self.shared.lock();
        std::mem::take(&mut state.render_requested)
    }

    pub fn is_requested(&self) -> bool {
        self.shared.lock().render_requested
    }

    /// Wakes every waiter and makes later waits return immediately.
    pub fn stop(&self) {
        let mut state = self.shared.lock();
        state.stop_requested = true;
        self.shared.cvar.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.lock().stop_requested
    }

    /// Blocks until a render is requested, the scheduler stops, or `timeout`
    /// elapses. Consumes the request and returns `true` when one was pending.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.lock();
        while !state.render_requested && !state.stop_requested {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            state = match self.shared.cvar.wait_timeout(state, deadline - now) {
                Ok((state, _)) => state,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        std::mem::take(&mut state.render_requested)
    }
}

impl std::fmt::Debug for RenderScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("RenderScheduler")
            .field("render_requested", &state.render_requested)
            .field("stop_requested", &state.stop_requested)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn requests_coalesce_until_taken() {
        let scheduler = RenderScheduler::new();
        assert!(!scheduler.take_request());

        scheduler.request();
        scheduler.request();
        assert!(scheduler.is_requested());
        assert!(scheduler.take_request());
        assert!(!scheduler.take_request());
    }

    #[test]
    fn wait_times_out_without_a_request() {
        let scheduler = RenderScheduler::new();
        assert!(!scheduler.wait(Duration::from_millis(10)));
    }

    #[test]
    fn wait_wakes_on_request_from_another_thread() {
        let scheduler = RenderScheduler::new();
        let remote = scheduler.clone();
        let handle = thread::spawn(move || remote.request());

        assert!(scheduler.wait(Duration::from_secs(5)));
        handle.join().expect("requester thread");
        assert!(!scheduler.is_requested());
    }

    #[test]
    fn stop_releases_waiters() {
        let scheduler = RenderScheduler::new();
        scheduler.stop();
        assert!(!scheduler.wait(Duration::from_secs(5)));
        assert!(scheduler.is_stopped());
    }
}
