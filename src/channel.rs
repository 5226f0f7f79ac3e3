//! Bounded FIFO channel
//!
//! A fixed-capacity queue shared between producer and consumer threads. One
//! `Mutex` guards the buffer; `not_full` parks producers while the buffer
//! holds `capacity` items and `not_empty` parks consumers while it holds none.
//!
//! Unlike the classic condvar queue, the channel can be *closed*: producers
//! are refused from then on, while consumers keep draining what is buffered
//! and get [`TakeError::Closed`] once the buffer is empty. The
//! [`Sender`]/[`Receiver`] handles close the channel automatically when the
//! last producer (or the last consumer) goes away.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

// =============================================================================
// Errors
// =============================================================================

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    #[error("capacity must be at least 1")]
    ZeroCapacity,
}

/// Returned by a blocking offer; hands the rejected item back.
#[derive(PartialEq, Eq)]
pub enum OfferError<T> {
    Closed(T),
}

impl<T> OfferError<T> {
    pub fn into_inner(self) -> T {
        match self {
            OfferError::Closed(item) => item,
        }
    }
}

impl<T> fmt::Debug for OfferError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Closed(..)")
    }
}

impl<T> fmt::Display for OfferError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("offering on a closed channel")
    }
}

impl<T> std::error::Error for OfferError<T> {}

#[derive(PartialEq, Eq)]
pub enum TryOfferError<T> {
    Full(T),
    Closed(T),
}

impl<T> TryOfferError<T> {
    pub fn into_inner(self) -> T {
        match self {
            TryOfferError::Full(item) | TryOfferError::Closed(item) => item,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, TryOfferError::Full(_))
    }
}

impl<T> fmt::Debug for TryOfferError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryOfferError::Full(_) => f.write_str("Full(..)"),
            TryOfferError::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

impl<T> fmt::Display for TryOfferError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryOfferError::Full(_) => f.write_str("offering on a full channel"),
            TryOfferError::Closed(_) => f.write_str("offering on a closed channel"),
        }
    }
}

impl<T> std::error::Error for TryOfferError<T> {}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakeError {
    #[error("taking from a closed and drained channel")]
    Closed,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryTakeError {
    #[error("taking from an empty channel")]
    Empty,
    #[error("taking from a closed and drained channel")]
    Closed,
}

// =============================================================================
// State and statistics
// =============================================================================

/// Occupancy of the buffer. Closing is tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChannelState {
    Empty,
    Partial,
    Full,
}

impl ChannelState {
    fn from_len(len: usize, capacity: usize) -> Self {
        if len == 0 {
            ChannelState::Empty
        } else if len >= capacity {
            ChannelState::Full
        } else {
            ChannelState::Partial
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Empty => write!(f, "EMPTY"),
            ChannelState::Partial => write!(f, "PARTIAL"),
            ChannelState::Full => write!(f, "FULL"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    pub offered: u64,
    pub taken: u64,
    /// Offers that found the channel full and had to wait.
    pub blocked_offers: u64,
    /// Takes that found the channel empty and had to wait.
    pub blocked_takes: u64,
    /// Largest buffer length ever observed.
    pub high_water: usize,
}

struct Queue<T> {
    items: VecDeque<T>,
    closed: bool,
    stats: ChannelStats,
}

impl<T> Queue<T> {
    fn push(&mut self, item: T) {
        self.items.push_back(item);
        self.stats.offered += 1;
        self.stats.high_water = self.stats.high_water.max(self.items.len());
    }

    fn pop(&mut self) -> Option<T> {
        let item = self.items.pop_front()?;
        self.stats.taken += 1;
        Some(item)
    }
}

// =============================================================================
// BoundedChannel
// =============================================================================

pub struct BoundedChannel<T> {
    queue: Mutex<Queue<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl<T> BoundedChannel<T> {
    pub fn new(capacity: usize) -> Result<Self, ChannelError> {
        if capacity == 0 {
            return Err(ChannelError::ZeroCapacity);
        }
        Ok(Self {
            queue: Mutex::new(Queue {
                items: VecDeque::with_capacity(capacity),
                closed: false,
                stats: ChannelStats::default(),
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        })
    }

    // Every mutation of `Queue` completes before the guard is released, so a
    // poisoned lock still protects a consistent buffer.
    fn lock(&self) -> MutexGuard<'_, Queue<T>> {
        self.queue.lock().unwrap_or_else(|poisoned| {
            warn!("bounded channel lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Appends `item`, waiting while the channel is full.
    pub fn offer(&self, item: T) -> Result<(), OfferError<T>> {
        self.offer_and_report(item).map(|_| ())
    }

    /// Like [`offer`](Self::offer), but reports whether the call had to wait
    /// for space.
    pub fn offer_and_report(&self, item: T) -> Result<bool, OfferError<T>> {
        let mut queue = self.lock();
        if queue.closed {
            return Err(OfferError::Closed(item));
        }

        let waited = queue.items.len() >= self.capacity;
        if waited {
            queue.stats.blocked_offers += 1;
            debug!(capacity = self.capacity, "offer waiting on full channel");
            while queue.items.len() >= self.capacity && !queue.closed {
                queue = self
                    .not_full
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            if queue.closed {
                return Err(OfferError::Closed(item));
            }
        }

        queue.push(item);
        drop(queue);
        self.not_empty.notify_one();
        Ok(waited)
    }

    pub fn try_offer(&self, item: T) -> Result<(), TryOfferError<T>> {
        let mut queue = self.lock();
        if queue.closed {
            return Err(TryOfferError::Closed(item));
        }
        if queue.items.len() >= self.capacity {
            return Err(TryOfferError::Full(item));
        }
        queue.push(item);
        drop(queue);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes the oldest item, waiting while the channel is empty and open.
    pub fn take(&self) -> Result<T, TakeError> {
        let mut queue = self.lock();
        if queue.items.is_empty() && !queue.closed {
            queue.stats.blocked_takes += 1;
            while queue.items.is_empty() && !queue.closed {
                queue = self
                    .not_empty
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }

        match queue.pop() {
            Some(item) => {
                drop(queue);
                self.not_full.notify_one();
                Ok(item)
            }
            None => Err(TakeError::Closed),
        }
    }

    pub fn try_take(&self) -> Result<T, TryTakeError> {
        let mut queue = self.lock();
        match queue.pop() {
            Some(item) => {
                drop(queue);
                self.not_full.notify_one();
                Ok(item)
            }
            None if queue.closed => Err(TryTakeError::Closed),
            None => Err(TryTakeError::Empty),
        }
    }

    /// Closes the channel and wakes every waiting thread. Returns `false` if
    /// it was already closed.
    pub fn close(&self) -> bool {
        let mut queue = self.lock();
        if queue.closed {
            return false;
        }
        queue.closed = true;
        let pending = queue.items.len();
        drop(queue);

        debug!(pending, "bounded channel closed");
        self.not_full.notify_all();
        self.not_empty.notify_all();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn state(&self) -> ChannelState {
        ChannelState::from_len(self.lock().items.len(), self.capacity)
    }

    pub fn stats(&self) -> ChannelStats {
        self.lock().stats
    }
}

impl<T> fmt::Debug for BoundedChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.lock();
        f.debug_struct("BoundedChannel")
            .field("capacity", &self.capacity)
            .field("len", &queue.items.len())
            .field("closed", &queue.closed)
            .finish()
    }
}

// =============================================================================
// Sender / Receiver handles
// =============================================================================

struct Shared<T> {
    channel: BoundedChannel<T>,
    senders: AtomicUsize,
    receivers: AtomicUsize,
}

/// Creates a channel and its first pair of handles.
///
/// The channel closes when every `Sender` has been dropped (no more items will
/// arrive) or when every `Receiver` has been dropped (nobody is left to drain).
pub fn bounded<T>(capacity: usize) -> Result<(Sender<T>, Receiver<T>), ChannelError> {
    let shared = Arc::new(Shared {
        channel: BoundedChannel::new(capacity)?,
        senders: AtomicUsize::new(1),
        receivers: AtomicUsize::new(1),
    });
    Ok((
        Sender {
            shared: Arc::clone(&shared),
        },
        Receiver { shared },
    ))
}

pub struct Sender<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Sender<T> {
    pub fn offer(&self, item: T) -> Result<(), OfferError<T>> {
        self.shared.channel.offer(item)
    }

    pub fn offer_and_report(&self, item: T) -> Result<bool, OfferError<T>> {
        self.shared.channel.offer_and_report(item)
    }

    pub fn try_offer(&self, item: T) -> Result<(), TryOfferError<T>> {
        self.shared.channel.try_offer(item)
    }

    /// Closes the channel for every handle, not just this one.
    pub fn close(&self) -> bool {
        self.shared.channel.close()
    }

    pub fn observer(&self) -> Observer<T> {
        Observer {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        self.shared.senders.fetch_add(1, Ordering::Relaxed);
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        if self.shared.senders.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared.channel.close();
        }
    }
}

impl<T> fmt::Debug for Sender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("channel", &self.shared.channel)
            .finish()
    }
}

pub struct Receiver<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Receiver<T> {
    pub fn take(&self) -> Result<T, TakeError> {
        self.shared.channel.take()
    }

    pub fn try_take(&self) -> Result<T, TryTakeError> {
        self.shared.channel.try_take()
    }

    /// Blocking iterator that ends once the channel is closed and drained.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { receiver: self }
    }

    pub fn close(&self) -> bool {
        self.shared.channel.close()
    }

    pub fn observer(&self) -> Observer<T> {
        Observer {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        self.shared.receivers.fetch_add(1, Ordering::Relaxed);
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        if self.shared.receivers.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared.channel.close();
        }
    }
}

impl<T> fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("channel", &self.shared.channel)
            .finish()
    }
}

pub struct Iter<'a, T> {
    receiver: &'a Receiver<T>,
}

impl<T> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.receiver.take().ok()
    }
}

impl<'a, T> IntoIterator for &'a Receiver<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Read-only view of a channel. Holding one neither keeps the channel open
/// nor counts as a producer or consumer.
pub struct Observer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Observer<T> {
    pub fn len(&self) -> usize {
        self.shared.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.channel.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.shared.channel.capacity()
    }

    pub fn state(&self) -> ChannelState {
        self.shared.channel.state()
    }

    pub fn stats(&self) -> ChannelStats {
        self.shared.channel.stats()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.channel.is_closed()
    }
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
