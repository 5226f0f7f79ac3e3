use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Configuration errors
// =============================================================================

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for field '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Producer/consumer exchange errors
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Producer,
    Consumer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Producer => write!(f, "producer"),
            Role::Consumer => write!(f, "consumer"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Bounded channel rejected capacity: {0}")]
    Channel(#[from] crate::channel::ChannelError),

    #[error("{role} {id} stopped after {produced} items: channel closed early")]
    ClosedEarly { role: Role, id: usize, produced: u64 },

    #[error("{role} {id} panicked: {message}")]
    TaskPanicked {
        role: Role,
        id: usize,
        message: String,
    },

    #[error("Failed to spawn {role} thread: {source}")]
    Spawn {
        role: Role,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Synchronisation primitive errors
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Mutex poisoned: data may be corrupted")]
    Poisoned,

    #[error("Thread pool needs at least one worker")]
    NoWorkers,

    #[error("Thread pool is shut down")]
    PoolClosed,

    #[error("Thread pool queue: {0}")]
    Queue(#[from] crate::channel::ChannelError),

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(String),

    #[error("Thread panicked: {0}")]
    Panicked(String),
}

// =============================================================================
// Input errors (reported, never a silent crash)
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Expected a number at position {position}, got '{token}'")]
    NotANumber { position: usize, token: String },

    #[error("Number '{token}' at position {position} is out of range")]
    OutOfRange { position: usize, token: String },

    #[error("No input provided")]
    Empty,
}

/// Stringifies a `JoinHandle` panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
