//! Fixed-size thread pool.
//!
//! Jobs travel through a [`BoundedChannel`](crate::channel::BoundedChannel),
//! so `execute` blocks once `queue_capacity` jobs are waiting. The pool owns
//! the only `Sender`; dropping it closes the queue and the workers exit after
//! draining what is left.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::Serialize;
use tracing::{debug, warn};

use crate::channel::{bounded, Receiver, Sender};
use crate::error::{panic_message, SyncError};

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub completed: u64,
    pub panicked: u64,
}

#[derive(Default)]
struct Counters {
    completed: AtomicU64,
    panicked: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> PoolStats {
        PoolStats {
            completed: self.completed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }
}

struct Worker {
    id: usize,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(id: usize, jobs: Receiver<Job>, counters: Arc<Counters>) -> Result<Self, SyncError> {
        let handle = thread::Builder::new()
            .name(format!("pool-worker-{id}"))
            .spawn(move || {
                for job in jobs.iter() {
                    match panic::catch_unwind(AssertUnwindSafe(job)) {
                        Ok(()) => {
                            counters.completed.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(payload) => {
                            counters.panicked.fetch_add(1, Ordering::Relaxed);
                            warn!(worker = id, message = %panic_message(&*payload), "job panicked");
                        }
                    }
                }
                debug!(worker = id, "worker exiting");
            })
            .map_err(|e| SyncError::Spawn(e.to_string()))?;

        Ok(Self {
            id,
            handle: Some(handle),
        })
    }
}

pub struct ThreadPool {
    sender: Option<Sender<Job>>,
    workers: Vec<Worker>,
    counters: Arc<Counters>,
}

impl ThreadPool {
    pub fn new(workers: usize, queue_capacity: usize) -> Result<Self, SyncError> {
        if workers == 0 {
            return Err(SyncError::NoWorkers);
        }
        let (sender, receiver) = bounded::<Job>(queue_capacity)?;
        let counters = Arc::new(Counters::default());

        let workers = (0..workers)
            .map(|id| Worker::spawn(id, receiver.clone(), Arc::clone(&counters)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            sender: Some(sender),
            workers,
            counters,
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queues `job`, blocking while the queue is full.
    pub fn execute<F>(&self, job: F) -> Result<(), SyncError>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(SyncError::PoolClosed)?;
        sender
            .offer(Box::new(job))
            .map_err(|_| SyncError::PoolClosed)
    }

    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }

    /// Runs every queued job, stops the workers and returns the final stats.
    pub fn shutdown(mut self) -> PoolStats {
        self.close_and_join();
        self.counters.snapshot()
    }

    fn close_and_join(&mut self) {
        drop(self.sender.take());
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    warn!(worker = worker.id, "worker thread panicked");
                }
            }
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.close_and_join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SharedCounter;
    use std::sync::Mutex;

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(ThreadPool::new(0, 4), Err(SyncError::NoWorkers)));
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        assert!(matches!(ThreadPool::new(2, 0), Err(SyncError::Queue(_))));
    }

    #[test]
    fn test_runs_every_job_before_shutdown_returns() {
        let pool = ThreadPool::new(4, 2).unwrap();
        assert_eq!(pool.size(), 4);
        let counter = Arc::new(SharedCounter::new(0));

        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                counter.increment().unwrap();
            })
            .unwrap();
        }

        let stats = pool.shutdown();
        assert_eq!(stats.completed, 100);
        assert_eq!(stats.panicked, 0);
        assert_eq!(counter.get(), Ok(100));
    }

    #[test]
    fn test_panicking_job_does_not_kill_worker() {
        let pool = ThreadPool::new(1, 4).unwrap();
        let results = Arc::new(Mutex::new(Vec::new()));

        pool.execute(|| panic!("bad job")).unwrap();
        for i in 0..3 {
            let results = Arc::clone(&results);
            pool.execute(move || results.lock().unwrap().push(i)).unwrap();
        }

        let stats = pool.shutdown();
        assert_eq!(stats, PoolStats { completed: 3, panicked: 1 });
        assert_eq!(*results.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_single_worker_preserves_submission_order() {
        let pool = ThreadPool::new(1, 1).unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..20 {
            let order = Arc::clone(&order);
            pool.execute(move || order.lock().unwrap().push(i)).unwrap();
        }
        drop(pool);
        assert_eq!(*order.lock().unwrap(), (0..20).collect::<Vec<_>>());
    }
}
