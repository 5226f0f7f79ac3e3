//! Bounded producer/consumer handoff plus a set of small concurrency and
//! algorithm exercises.
//!
//! - [`channel`]: fixed-capacity FIFO channel with blocking `offer`/`take`
//!   and an explicit close.
//! - [`exchange`]: producer and consumer tasks running over that channel.
//! - [`sync`]: shared counter, event, thread pool, thread-local tally.
//! - [`drills`]: searching, counting, hashing, palindromes, recursion, and
//!   input parsing.

pub mod channel;
pub mod config;
pub mod drills;
pub mod error;
pub mod exchange;
pub mod logging;
pub mod sync;

pub use channel::{bounded, BoundedChannel, ChannelState, ChannelStats, Receiver, Sender};
pub use config::ExchangeConfig;
pub use error::{ConfigError, ExchangeError, InputError, SyncError};
pub use exchange::{run_exchange, Consumer, ExchangeReport, Item, Producer};
