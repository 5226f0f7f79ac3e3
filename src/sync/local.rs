//! Thread-local tally: every thread gets its own counter, no locking needed.

use std::cell::Cell;
use std::thread;

thread_local! {
    static TALLY: Cell<u64> = const { Cell::new(0) };
}

/// Increments this thread's tally and returns the new value.
pub fn bump() -> u64 {
    TALLY.with(|tally| {
        let next = tally.get() + 1;
        tally.set(next);
        next
    })
}

pub fn current() -> u64 {
    TALLY.with(Cell::get)
}

pub fn reset() {
    TALLY.with(|tally| tally.set(0));
}

/// Spawns one thread per entry of `bumps`; thread `i` bumps its tally
/// `bumps[i]` times and reports what it sees.
pub fn tally_per_thread(bumps: &[u64]) -> Vec<u64> {
    thread::scope(|scope| {
        let handles: Vec<_> = bumps
            .iter()
            .map(|&n| {
                scope.spawn(move || {
                    for _ in 0..n {
                        bump();
                    }
                    current()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_default())
            .collect()
    })
}
