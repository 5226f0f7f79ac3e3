//! Producer/consumer exchange over a [`BoundedChannel`](crate::channel::BoundedChannel).
//!
//! Producers emit a fixed number of sequenced items and then drop their
//! [`Sender`]; the last one to finish closes the channel. Consumers drain the
//! channel until it is closed and empty, so every task ends on its own
//! without process teardown.

use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::channel::{bounded, ChannelStats, OfferError, Receiver, Sender};
use crate::config::ExchangeConfig;
use crate::error::{panic_message, ExchangeError, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Item {
    pub producer: usize,
    pub seq: u64,
}

// =============================================================================
// Pacing
// =============================================================================

/// Fixed pause plus an optional random jitter, applied after each item.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pacing {
    delay: Duration,
    jitter: Duration,
}

impl Pacing {
    pub fn new(delay: Duration, jitter: Duration) -> Self {
        Self { delay, jitter }
    }

    fn jitter_micros(&self) -> u64 {
        u64::try_from(self.jitter.as_micros()).unwrap_or(u64::MAX)
    }

    fn pause(&self) {
        let mut pause = self.delay;
        if !self.jitter.is_zero() {
            let extra = rand::thread_rng().gen_range(0..=self.jitter_micros());
            pause += Duration::from_micros(extra);
        }
        if !pause.is_zero() {
            thread::sleep(pause);
        }
    }
}

// =============================================================================
// Producer
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProducerSummary {
    pub id: usize,
    pub produced: u64,
    /// Offers that found the channel full.
    pub blocked: u64,
}

pub struct Producer<T> {
    id: usize,
    sender: Sender<T>,
    count: u64,
    pacing: Pacing,
}

impl<T> Producer<T> {
    pub fn new(id: usize, sender: Sender<T>, count: u64) -> Self {
        Self {
            id,
            sender,
            count,
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Offers `make(0)`, `make(1)`, ... `make(count - 1)` in order.
    ///
    /// Consumes the producer, so its `Sender` is released on return. Fails
    /// with [`ExchangeError::ClosedEarly`] if the channel closes first.
    pub fn run<F>(self, mut make: F) -> Result<ProducerSummary, ExchangeError>
    where
        F: FnMut(u64) -> T,
    {
        let Producer {
            id,
            sender,
            count,
            pacing,
        } = self;
        let mut summary = ProducerSummary {
            id,
            produced: 0,
            blocked: 0,
        };

        for seq in 0..count {
            match sender.offer_and_report(make(seq)) {
                Ok(waited) => {
                    summary.produced += 1;
                    if waited {
                        summary.blocked += 1;
                    }
                }
                Err(OfferError::Closed(_)) => {
                    return Err(ExchangeError::ClosedEarly {
                        role: Role::Producer,
                        id,
                        produced: summary.produced,
                    });
                }
            }
            pacing.pause();
        }

        debug!(
            producer = id,
            produced = summary.produced,
            blocked = summary.blocked,
            "producer finished"
        );
        Ok(summary)
    }
}

// =============================================================================
// Consumer
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConsumerSummary {
    pub id: usize,
    pub consumed: u64,
}

pub struct Consumer<T> {
    id: usize,
    receiver: Receiver<T>,
    pacing: Pacing,
}

impl<T> Consumer<T> {
    pub fn new(id: usize, receiver: Receiver<T>) -> Self {
        Self {
            id,
            receiver,
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Hands every item to `handle` in arrival order until the channel is
    /// closed and drained.
    pub fn run<F>(self, mut handle: F) -> ConsumerSummary
    where
        F: FnMut(&T),
    {
        let mut consumed = 0;
        for item in self.receiver.iter() {
            handle(&item);
            consumed += 1;
            self.pacing.pause();
        }

        debug!(consumer = self.id, consumed, "consumer finished");
        ConsumerSummary {
            id: self.id,
            consumed,
        }
    }
}

// =============================================================================
// Exchange
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ConsumerReport {
    #[serde(flatten)]
    pub summary: ConsumerSummary,
    /// Items in the order this consumer received them.
    #[serde(skip)]
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExchangeReport {
    pub config: ExchangeConfig,
    pub producers: Vec<ProducerSummary>,
    pub consumers: Vec<ConsumerReport>,
    pub stats: ChannelStats,
}

impl ExchangeReport {
    pub fn total_delivered(&self) -> u64 {
        self.consumers.iter().map(|c| c.summary.consumed).sum()
    }

    pub fn producer_blocked(&self) -> bool {
        self.producers.iter().any(|p| p.blocked > 0)
    }

    /// Every produced item was delivered exactly once.
    pub fn is_complete(&self) -> bool {
        let mut seen = HashSet::new();
        for item in self.consumers.iter().flat_map(|c| &c.items) {
            if !seen.insert(*item) {
                return false;
            }
        }
        let expected = (0..self.config.producers)
            .flat_map(|producer| (0..self.config.items).map(move |seq| Item { producer, seq }));
        let mut count = 0;
        for item in expected {
            if !seen.contains(&item) {
                return false;
            }
            count += 1;
        }
        count == seen.len()
    }

    /// Each consumer saw every producer's items in increasing sequence order.
    pub fn in_production_order(&self) -> bool {
        self.consumers.iter().all(|consumer| {
            let mut last_seq: Vec<Option<u64>> = vec![None; self.config.producers];
            consumer.items.iter().all(|item| {
                let Some(last) = last_seq.get_mut(item.producer) else {
                    return false;
                };
                let in_order = last.map_or(true, |prev| item.seq > prev);
                *last = Some(item.seq);
                in_order
            })
        })
    }
}

/// Unwraps joined task results. A panic wins over the `ClosedEarly` it
/// causes on the other side of the channel; otherwise the first error wins.
fn settle(
    producers: Vec<Result<ProducerSummary, ExchangeError>>,
    consumers: Vec<Result<ConsumerReport, ExchangeError>>,
) -> Result<(Vec<ProducerSummary>, Vec<ConsumerReport>), ExchangeError> {
    fn keep(failure: Option<ExchangeError>, err: ExchangeError) -> ExchangeError {
        match failure {
            Some(current @ ExchangeError::TaskPanicked { .. }) => current,
            Some(_) if matches!(err, ExchangeError::TaskPanicked { .. }) => err,
            Some(current) => current,
            None => err,
        }
    }

    let mut failure = None;
    let mut consumer_reports = Vec::with_capacity(consumers.len());
    for result in consumers {
        match result {
            Ok(report) => consumer_reports.push(report),
            Err(err) => failure = Some(keep(failure, err)),
        }
    }
    let mut producer_summaries = Vec::with_capacity(producers.len());
    for result in producers {
        match result {
            Ok(summary) => producer_summaries.push(summary),
            Err(err) => failure = Some(keep(failure, err)),
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok((producer_summaries, consumer_reports)),
    }
}

/// Runs one exchange: P producers and C consumers sharing a single channel.
///
/// Each consumer logs every item it receives. Returns once all producers have
/// finished and every item has been drained.
pub fn run_exchange(config: &ExchangeConfig) -> Result<ExchangeReport, ExchangeError> {
    config.validate()?;
    let (sender, receiver) = bounded::<Item>(config.capacity)?;
    let observer = sender.observer();
    let producer_pacing = Pacing::new(config.producer_delay(), config.jitter());
    let consumer_pacing = Pacing::new(config.consumer_delay(), config.jitter());

    info!(
        capacity = config.capacity,
        producers = config.producers,
        consumers = config.consumers,
        items = config.items,
        "starting exchange"
    );

    let (producer_results, consumer_results) = thread::scope(move |scope| {
        let mut consumer_handles = Vec::with_capacity(config.consumers);
        for id in 0..config.consumers {
            let consumer = Consumer::new(id, receiver.clone()).with_pacing(consumer_pacing);
            let handle = thread::Builder::new()
                .name(format!("consumer-{id}"))
                .spawn_scoped(scope, move || {
                    let mut items = Vec::new();
                    let summary = consumer.run(|item: &Item| {
                        info!(
                            consumer = id,
                            producer = item.producer,
                            seq = item.seq,
                            "consumed item"
                        );
                        items.push(*item);
                    });
                    ConsumerReport { summary, items }
                })
                .map_err(|source| ExchangeError::Spawn {
                    role: Role::Consumer,
                    source,
                })?;
            consumer_handles.push((id, handle));
        }
        drop(receiver);

        let mut producer_handles = Vec::with_capacity(config.producers);
        for id in 0..config.producers {
            let producer = Producer::new(id, sender.clone(), config.items).with_pacing(producer_pacing);
            let handle = thread::Builder::new()
                .name(format!("producer-{id}"))
                .spawn_scoped(scope, move || producer.run(|seq| Item { producer: id, seq }))
                .map_err(|source| ExchangeError::Spawn {
                    role: Role::Producer,
                    source,
                })?;
            producer_handles.push((id, handle));
        }
        drop(sender);

        let producer_results: Vec<_> = producer_handles
            .into_iter()
            .map(|(id, handle)| {
                handle
                    .join()
                    .map_err(|payload| ExchangeError::TaskPanicked {
                        role: Role::Producer,
                        id,
                        message: panic_message(&*payload),
                    })
                    .and_then(|result| result)
            })
            .collect();
        let consumer_results: Vec<_> = consumer_handles
            .into_iter()
            .map(|(id, handle)| {
                handle.join().map_err(|payload| ExchangeError::TaskPanicked {
                    role: Role::Consumer,
                    id,
                    message: panic_message(&*payload),
                })
            })
            .collect();

        Ok::<_, ExchangeError>((producer_results, consumer_results))
    })?;

    let (producers, consumers) = settle(producer_results, consumer_results)?;

    let report = ExchangeReport {
        config: config.clone(),
        producers,
        consumers,
        stats: observer.stats(),
    };
    info!(
        delivered = report.total_delivered(),
        blocked_offers = report.stats.blocked_offers,
        high_water = report.stats.high_water,
        "exchange finished"
    );
    Ok(report)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(capacity: usize, items: u64) -> ExchangeConfig {
        ExchangeConfig {
            capacity,
            items,
            ..ExchangeConfig::default()
        }
    }

    #[test]
    fn test_single_pair_delivers_in_order() {
        let report = run_exchange(&config(3, 10)).unwrap();

        let seqs: Vec<u64> = report.consumers[0].items.iter().map(|i| i.seq).collect();
        assert_eq!(seqs, (0..10).collect::<Vec<_>>());
        assert_eq!(report.total_delivered(), 10);
        assert!(report.is_complete());
        assert!(report.in_production_order());
    }

    #[test]
    fn test_zero_items_finishes() {
        let report = run_exchange(&config(2, 0)).unwrap();
        assert_eq!(report.total_delivered(), 0);
        assert_eq!(report.stats.offered, 0);
        assert!(report.is_complete());
    }

    #[test]
    fn test_capacity_covering_items_never_blocks_producer() {
        let report = run_exchange(&config(10, 10)).unwrap();
        assert!(!report.producer_blocked());
        assert_eq!(report.stats.blocked_offers, 0);
    }

    #[test]
    fn test_slow_consumer_blocks_producer() {
        let cfg = ExchangeConfig {
            consumer_delay_ms: 5,
            ..config(2, 6)
        };
        let report = run_exchange(&cfg).unwrap();
        assert!(report.producer_blocked());
        assert!(report.stats.high_water <= 2);
        assert!(report.in_production_order());
    }

    #[test]
    fn test_many_producers_and_consumers() {
        let cfg = ExchangeConfig {
            capacity: 4,
            items: 50,
            producers: 3,
            consumers: 4,
            ..ExchangeConfig::default()
        };
        let report = run_exchange(&cfg).unwrap();

        assert_eq!(report.total_delivered(), 150);
        assert_eq!(report.producers.iter().map(|p| p.produced).sum::<u64>(), 150);
        assert!(report.is_complete());
        assert!(report.in_production_order());
        assert!(report.stats.high_water <= 4);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = run_exchange(&config(0, 5)).unwrap_err();
        assert!(matches!(err, ExchangeError::Config(_)));
    }

    #[test]
    fn test_producer_stops_when_consumers_leave() {
        let (tx, rx) = bounded::<u64>(1).unwrap();
        drop(rx);
        let err = Producer::new(7, tx, 3).run(|seq| seq).unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::ClosedEarly {
                role: Role::Producer,
                id: 7,
                produced: 0
            }
        ));
    }

    #[test]
    fn test_consumer_exits_after_producer_finishes() {
        let (tx, rx) = bounded(2).unwrap();
        let producer = thread::spawn(move || Producer::new(0, tx, 5).run(|seq| seq * 10));

        let mut seen = Vec::new();
        let summary = Consumer::new(0, rx).run(|value: &u64| seen.push(*value));

        assert_eq!(producer.join().unwrap().unwrap().produced, 5);
        assert_eq!(summary.consumed, 5);
        assert_eq!(seen, vec![0, 10, 20, 30, 40]);
    }

    #[test]
    fn test_consumer_panic_is_reported() {
        let (tx, rx) = bounded::<u64>(1).unwrap();
        let consumer = thread::spawn(move || {
            Consumer::new(0, rx).run(|_| panic!("handler failed"))
        });
        let producer = Producer::new(0, tx, 4).run(|seq| seq);

        let payload = consumer.join().unwrap_err();
        assert_eq!(panic_message(&*payload), "handler failed");
        assert!(matches!(producer, Err(ExchangeError::ClosedEarly { .. })));
    }

    #[test]
    fn test_jitter_bound_saturates() {
        let pacing = Pacing::new(Duration::ZERO, Duration::from_millis(3));
        assert_eq!(pacing.jitter_micros(), 3_000);
        let pacing = Pacing::new(Duration::ZERO, Duration::MAX);
        assert_eq!(pacing.jitter_micros(), u64::MAX);
    }

    #[test]
    fn test_consumer_panic_outranks_closed_producer() {
        let producers = vec![Err(ExchangeError::ClosedEarly {
            role: Role::Producer,
            id: 0,
            produced: 1,
        })];
        let consumers = vec![Err(ExchangeError::TaskPanicked {
            role: Role::Consumer,
            id: 0,
            message: "handler failed".to_string(),
        })];

        let err = settle(producers, consumers).unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::TaskPanicked {
                role: Role::Consumer,
                id: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_settle_keeps_first_error_without_panics() {
        let producers = vec![
            Ok(ProducerSummary {
                id: 0,
                produced: 2,
                blocked: 0,
            }),
            Err(ExchangeError::ClosedEarly {
                role: Role::Producer,
                id: 1,
                produced: 0,
            }),
        ];
        let err = settle(producers, Vec::new()).unwrap_err();
        assert!(matches!(err, ExchangeError::ClosedEarly { id: 1, .. }));

        let (producers, consumers) = settle(Vec::new(), Vec::new()).unwrap();
        assert!(producers.is_empty() && consumers.is_empty());
    }

    #[test]
    fn test_report_order_check_detects_reordering() {
        let report = ExchangeReport {
            config: config(1, 2),
            producers: vec![],
            consumers: vec![ConsumerReport {
                summary: ConsumerSummary { id: 0, consumed: 2 },
                items: vec![Item { producer: 0, seq: 1 }, Item { producer: 0, seq: 0 }],
            }],
            stats: ChannelStats::default(),
        };
        assert!(report.is_complete());
        assert!(!report.in_production_order());
    }

    #[test]
    fn test_report_serializes_without_items() {
        let report = run_exchange(&config(2, 3)).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["consumers"][0]["consumed"], 3);
        assert!(json["consumers"][0].get("items").is_none());
        assert_eq!(json["stats"]["taken"], 3);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_exchange_properties(capacity in 1usize..8, items in 0u64..60) {
            let report = run_exchange(&config(capacity, items)).unwrap();

            prop_assert_eq!(report.total_delivered(), items);
            prop_assert!(report.is_complete());
            prop_assert!(report.in_production_order());
            prop_assert!(report.stats.high_water <= capacity);
            if capacity as u64 >= items {
                prop_assert!(!report.producer_blocked());
            }
        }
    }
}
