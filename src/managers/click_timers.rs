//! Per-record cancelable delayed tasks.
//!
//! Backs the favorite tap-vs-double-tap gesture: a single activation
//! schedules an action after a short window, and a second activation inside
//! that window cancels it. Timers are keyed by record id so gestures on
//! different records never interfere.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// A map of record id to in-flight delayed task.
///
/// Finished handles may linger in the map until the key is scheduled again;
/// aborting a finished handle is a no-op, so stale entries are harmless and
/// cancellation stays idempotent.
pub struct ClickTimers {
    pending: Mutex<HashMap<i64, JoinHandle<()>>>,
}

impl ClickTimers {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Schedules `task` to run after `delay`, replacing (and canceling) any
    /// task previously scheduled for the same key.
    pub fn schedule<F>(&self, key: i64, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });

        let mut pending = self.pending.lock().unwrap();
        if let Some(previous) = pending.insert(key, handle) {
            previous.abort();
        }
    }

    /// Cancels the task scheduled for `key`, if any. Returns whether an
    /// entry was present; calling again for the same key is a no-op.
    pub fn cancel(&self, key: i64) -> bool {
        match self.pending.lock().unwrap().remove(&key) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Cancels every scheduled task (used when the session ends).
    pub fn cancel_all(&self) {
        let mut pending = self.pending.lock().unwrap();
        for (_, handle) in pending.drain() {
            handle.abort();
        }
    }

    /// Whether a task for `key` is scheduled and has not yet run.
    pub fn is_pending(&self, key: i64) -> bool {
        self.pending
            .lock()
            .unwrap()
            .get(&key)
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Default for ClickTimers {
    fn default() -> Self {
        Self::new()
    }
}
