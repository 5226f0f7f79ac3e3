use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A boolean flag threads can wait on.
///
/// `set` wakes every waiter and the flag stays set until `clear`, so threads
/// that arrive late do not wait at all.
#[derive(Debug, Default)]
pub struct Event {
    flag: Mutex<bool>,
    condvar: Condvar,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    // A bool is never left half-written.
    fn flag(&self) -> MutexGuard<'_, bool> {
        self.flag.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self) {
        *self.flag() = true;
        self.condvar.notify_all();
    }

    pub fn clear(&self) {
        *self.flag() = false;
    }

    pub fn is_set(&self) -> bool {
        *self.flag()
    }

    /// Blocks until the flag is set.
    pub fn wait(&self) {
        let guard = self.flag();
        let _guard = self
            .condvar
            .wait_while(guard, |set| !*set)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Blocks until the flag is set or `timeout` elapses. Returns the flag.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.flag();
        let (guard, _) = self
            .condvar
            .wait_timeout_while(guard, timeout, |set| !*set)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}
