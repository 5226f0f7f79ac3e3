//! Tour of the synchronisation primitives
//! Shared counter, event, thread pool, thread-local storage
//!
//! Run with: cargo run --bin sync_tour

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;

use handoff_lab::logging;
use handoff_lab::sync::{counter, local, Event, PoisonPolicy, SharedCounter, ThreadPool};

fn shared_counter() -> Result<()> {
    let total = counter::hammer(10, 1_000)?;
    println!("10 threads x 1000 increments = {total}");

    let strict = Arc::new(SharedCounter::with_policy(0, PoisonPolicy::Refuse));
    let poisoner = Arc::clone(&strict);
    let _ = thread::spawn(move || {
        let _ = poisoner.with_lock(|value| {
            *value += 1;
            panic!("intentional panic while holding the lock");
        });
    })
    .join();

    match strict.get() {
        Ok(value) => println!("strict counter still readable: {value}"),
        Err(err) => println!("strict counter refused: {err}"),
    }
    Ok(())
}

fn event() {
    let ready = Arc::new(Event::new());
    let waiter = {
        let ready = Arc::clone(&ready);
        thread::spawn(move || {
            println!("waiter: waiting for the signal...");
            ready.wait();
            println!("waiter: signal received");
        })
    };

    thread::sleep(Duration::from_millis(100));
    println!("main: setting the event");
    ready.set();
    let _ = waiter.join();

    ready.clear();
    let fired = ready.wait_timeout(Duration::from_millis(50));
    println!("after clear, wait_timeout(50ms) returned {fired}");
}

fn thread_pool() -> Result<()> {
    let pool = ThreadPool::new(4, 2)?;
    let sum = Arc::new(SharedCounter::new(0));

    for i in 1..=20 {
        let sum = Arc::clone(&sum);
        pool.execute(move || {
            let _ = sum.add(i);
        })?;
    }
    pool.execute(|| panic!("one bad job"))?;

    let stats = pool.shutdown();
    println!(
        "pool finished: {} completed, {} panicked, sum = {}",
        stats.completed,
        stats.panicked,
        sum.get()?
    );
    Ok(())
}

fn thread_local() {
    local::bump();
    let seen = local::tally_per_thread(&[1, 5, 10]);
    println!("each thread saw only its own tally: {seen:?}");
    println!("main thread tally: {}", local::current());
}

fn main() -> Result<()> {
    logging::init(false);

    println!("{}", "=== Shared Counter ===".bold());
    shared_counter()?;

    println!("\n{}", "=== Event ===".bold());
    event();

    println!("\n{}", "=== Thread Pool ===".bold());
    thread_pool()?;

    println!("\n{}", "=== Thread-Local Storage ===".bold());
    thread_local();

    println!("\n=== Key Points ===");
    println!("1. The counter lock is released on every exit path, even a panic");
    println!("2. An event stays set until cleared, so late waiters do not block");
    println!("3. The pool queue is a bounded channel: execute() applies backpressure");
    println!("4. Thread-local values need no locking because nothing is shared");
    Ok(())
}
