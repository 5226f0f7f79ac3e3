//! Concurrency vocabulary: a lock-guarded counter, a settable event, a
//! thread pool fed by the bounded channel, and per-thread storage.

pub mod counter;
pub mod event;
pub mod local;
pub mod pool;

pub use counter::{PoisonPolicy, SharedCounter};
pub use event::Event;
pub use pool::{PoolStats, ThreadPool};
