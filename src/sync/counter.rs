//! Shared counter guarded by a single `Mutex`.
//!
//! All access goes through [`SharedCounter::with_lock`]: the guard lives only
//! for the closure, so the lock is released on every exit path, including a
//! panic inside the closure (which poisons the mutex).

use std::sync::{Mutex, MutexGuard};
use std::thread;

use tracing::warn;

use crate::error::{panic_message, SyncError};

/// What to do with a mutex whose previous holder panicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoisonPolicy {
    /// An `i64` cannot be left half-written, so keep using the value.
    #[default]
    Recover,
    /// Refuse to touch the value again.
    Refuse,
}

#[derive(Debug, Default)]
pub struct SharedCounter {
    value: Mutex<i64>,
    policy: PoisonPolicy,
}

impl SharedCounter {
    pub fn new(initial: i64) -> Self {
        Self::with_policy(initial, PoisonPolicy::Recover)
    }

    pub fn with_policy(initial: i64, policy: PoisonPolicy) -> Self {
        Self {
            value: Mutex::new(initial),
            policy,
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, i64>, SyncError> {
        match self.value.lock() {
            Ok(guard) => Ok(guard),
            Err(poisoned) => match self.policy {
                PoisonPolicy::Recover => {
                    warn!("counter mutex poisoned, recovering");
                    Ok(poisoned.into_inner())
                }
                PoisonPolicy::Refuse => Err(SyncError::Poisoned),
            },
        }
    }

    /// Runs `f` with exclusive access to the value.
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut i64) -> R) -> Result<R, SyncError> {
        let mut guard = self.guard()?;
        Ok(f(&mut guard))
    }

    pub fn increment(&self) -> Result<i64, SyncError> {
        self.add(1)
    }

    /// Adds `delta` and returns the new value.
    pub fn add(&self, delta: i64) -> Result<i64, SyncError> {
        self.with_lock(|value| {
            *value += delta;
            *value
        })
    }

    pub fn get(&self) -> Result<i64, SyncError> {
        self.with_lock(|value| *value)
    }

    pub fn is_poisoned(&self) -> bool {
        self.value.is_poisoned()
    }
}

/// Spawns `threads` threads that each increment one counter `per_thread`
/// times, and returns the final count.
pub fn hammer(threads: usize, per_thread: u32) -> Result<i64, SyncError> {
    let counter = SharedCounter::new(0);

    thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let counter = &counter;
                scope.spawn(move || -> Result<(), SyncError> {
                    for _ in 0..per_thread {
                        counter.increment()?;
                    }
                    Ok(())
                })
            })
            .collect();

        for handle in handles {
            handle
                .join()
                .map_err(|payload| SyncError::Panicked(panic_message(&*payload)))??;
        }
        Ok::<_, SyncError>(())
    })?;

    counter.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};

    fn poison(counter: &SharedCounter) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _ = counter.with_lock(|value| {
                *value += 100;
                panic!("boom while holding the lock");
            });
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_increment_and_get() {
        let counter = SharedCounter::new(5);
        assert_eq!(counter.increment(), Ok(6));
        assert_eq!(counter.add(-10), Ok(-4));
        assert_eq!(counter.get(), Ok(-4));
    }

    #[test]
    fn test_hammer_counts_every_increment() {
        assert_eq!(hammer(8, 1_000), Ok(8_000));
    }

    #[test]
    fn test_hammer_with_no_threads() {
        assert_eq!(hammer(0, 10), Ok(0));
    }

    #[test]
    fn test_lock_released_after_panic() {
        let counter = SharedCounter::new(0);
        poison(&counter);

        assert!(counter.is_poisoned());
        // The guard was dropped during unwinding, so this does not deadlock.
        assert_eq!(counter.increment(), Ok(101));
    }

    #[test]
    fn test_refuse_policy_reports_poison() {
        let counter = SharedCounter::with_policy(0, PoisonPolicy::Refuse);
        poison(&counter);

        assert_eq!(counter.get(), Err(SyncError::Poisoned));
        assert_eq!(counter.with_lock(|v| *v), Err(SyncError::Poisoned));
    }

    #[test]
    fn test_with_lock_returns_closure_value() {
        let counter = SharedCounter::new(3);
        let doubled = counter.with_lock(|value| {
            *value *= 2;
            format!("now {value}")
        });
        assert_eq!(doubled.unwrap(), "now 6");
    }
}
