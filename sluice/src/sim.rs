//! Producer/consumer simulation over a [`BoundedQueue`].
//!
//! Producers manufacture numbered items at a fixed pace and consumers "pack"
//! them at another pace, with the queue as the only point of coordination. With
//! the default pacing (2 s to produce, 3 s to pack) the queue fills up and the
//! producer spends most of its time blocked in `put`.
//!
//! # Lifecycle
//!
//! ```text
//! spawn ──> running ──┬── join      producers finish their quota
//!                     │             close queue, consumers drain, report
//!                     └── shutdown  cancel token: blocked puts and delays abort
//!                                   close queue, consumers drain, report
//! ```
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use sluice::sim::{SimConfig, Simulation};
//!
//! let config = SimConfig {
//!     capacity: 2,
//!     items_per_producer: Some(5),
//!     produce_delay: Duration::ZERO,
//!     consume_delay: Duration::from_millis(1),
//!     ..SimConfig::default()
//! };
//!
//! let report = Simulation::spawn(config)?.join();
//! assert_eq!(report.produced, 5);
//! assert_eq!(report.consumed, 5);
//! # Ok::<(), sluice::sim::SimError>(())
//! ```

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use minstant::Instant;

use crate::error::{InvalidCapacity, QueueError};
use crate::stats::{self, Summary};
use crate::sync::bounded::BoundedQueue;
use crate::sync::cancel::CancelToken;
use crate::sync::wait::Timeout;
use crate::trace::{debug, info, warn};

/// Simulation parameters.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Queue capacity.
    pub capacity: usize,
    /// Number of producer threads.
    pub producers: usize,
    /// Number of consumer threads.
    pub consumers: usize,
    /// Items each producer makes before stopping. `None` runs until shutdown.
    pub items_per_producer: Option<u64>,
    /// Time spent producing each item.
    pub produce_delay: Duration,
    /// Time spent packing each item.
    pub consume_delay: Duration,
    /// Random extra delay of up to this fraction of each base delay.
    pub jitter: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            producers: 1,
            consumers: 1,
            items_per_producer: None,
            produce_delay: Duration::from_secs(2),
            consume_delay: Duration::from_secs(3),
            jitter: 0.0,
        }
    }
}

/// Error starting the simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The configured queue capacity is zero.
    #[error(transparent)]
    InvalidCapacity(#[from] InvalidCapacity),
    /// At least one producer and one consumer are required.
    #[error("simulation needs at least one producer and one consumer")]
    NoWorkers,
    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(std::io::Error),
}

/// A unit of work flowing through the queue.
#[derive(Debug, Clone, Copy)]
pub struct Item {
    /// Index of the producer that made it.
    pub producer: usize,
    /// Per-producer sequence number, starting at 1.
    pub seq: u64,
    produced_at: Instant,
}

/// What one consumer packed.
#[derive(Debug, Default)]
struct Packed {
    items: Vec<(usize, u64)>,
    latencies: Vec<f64>,
}

/// Outcome of a finished simulation.
#[derive(Debug, Clone, Default)]
pub struct SimReport {
    /// Items successfully enqueued, over all producers.
    pub produced: u64,
    /// Items taken and packed, over all consumers.
    pub consumed: u64,
    /// Sequence numbers packed per producer, in the order each consumer took
    /// them, consumers concatenated by index.
    pub packed: Vec<Vec<u64>>,
    /// Seconds each item spent between production and being taken.
    pub latencies: Vec<f64>,
    /// Worker threads that panicked. Their counts and packed items are missing
    /// from the totals above.
    pub panicked: usize,
}

impl SimReport {
    /// `true` if every worker thread ran to completion.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.panicked == 0
    }

    /// Statistics over [`latencies`](Self::latencies).
    #[must_use]
    pub fn latency_summary(&self) -> Summary {
        stats::describe(&self.latencies)
    }
}

/// Handle to running producer and consumer threads.
///
/// Dropping the handle cancels the simulation without waiting for threads.
/// Use [`Simulation::join`] or [`Simulation::shutdown`] to collect a report.
pub struct Simulation {
    queue: Arc<BoundedQueue<Item>>,
    cancel: CancelToken,
    producers: Vec<JoinHandle<u64>>,
    consumers: Vec<JoinHandle<Packed>>,
    producer_count: usize,
}

impl Simulation {
    /// Creates the queue and spawns the worker threads.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidCapacity`], [`SimError::NoWorkers`], or
    /// [`SimError::Spawn`] if the OS refuses a thread. Threads that did start are
    /// cancelled before the error is returned.
    pub fn spawn(config: SimConfig) -> Result<Self, SimError> {
        if config.producers == 0 || config.consumers == 0 {
            return Err(SimError::NoWorkers);
        }
        let queue = Arc::new(BoundedQueue::new(config.capacity)?);

        info!(
            capacity = config.capacity,
            producers = config.producers,
            consumers = config.consumers,
            items_per_producer = ?config.items_per_producer,
            produce_delay_ms = config.produce_delay.as_millis() as u64,
            consume_delay_ms = config.consume_delay.as_millis() as u64,
            "simulation starting"
        );

        let mut sim = Self {
            queue,
            cancel: CancelToken::new(),
            producers: Vec::with_capacity(config.producers),
            consumers: Vec::with_capacity(config.consumers),
            producer_count: config.producers,
        };

        for index in 0..config.consumers {
            let worker = Consumer {
                index,
                queue: Arc::clone(&sim.queue),
                cancel: sim.cancel.clone(),
                pace: Pace::new(config.consume_delay, config.jitter),
                producers: config.producers,
            };
            let handle = thread::Builder::new()
                .name(format!("sluice-consumer-{index}"))
                .spawn(move || worker.run())
                .map_err(|e| sim.abort(e))?;
            sim.consumers.push(handle);
        }

        for index in 0..config.producers {
            let worker = Producer {
                index,
                queue: Arc::clone(&sim.queue),
                cancel: sim.cancel.clone(),
                pace: Pace::new(config.produce_delay, config.jitter),
                quota: config.items_per_producer,
            };
            let handle = thread::Builder::new()
                .name(format!("sluice-producer-{index}"))
                .spawn(move || worker.run())
                .map_err(|e| sim.abort(e))?;
            sim.producers.push(handle);
        }

        info!("simulation started");
        Ok(sim)
    }

    /// The shared queue, e.g. for observing its length while running.
    #[must_use]
    pub fn queue(&self) -> &BoundedQueue<Item> {
        &self.queue
    }

    /// Waits for every producer to reach its quota, then drains and reports.
    ///
    /// With `items_per_producer: None` this only returns after another thread
    /// cancels via [`Simulation::cancel_token`].
    #[must_use]
    pub fn join(mut self) -> SimReport {
        debug!("waiting for producers to finish");
        self.finish()
    }

    /// Stops producing, lets consumers drain what is buffered, and reports.
    ///
    /// Producers blocked on a full queue or mid-delay are interrupted; consumers
    /// skip their packing delay once shutdown has started.
    #[must_use]
    pub fn shutdown(mut self) -> SimReport {
        info!("simulation shutdown initiated");
        self.cancel.cancel();
        self.finish()
    }

    /// Token that stops the producers when cancelled.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn finish(&mut self) -> SimReport {
        let mut report = SimReport {
            packed: vec![Vec::new(); self.producer_count],
            ..SimReport::default()
        };

        for handle in self.producers.drain(..) {
            match handle.join() {
                Ok(made) => report.produced += made,
                Err(_) => {
                    warn!("producer thread panicked");
                    report.panicked += 1;
                }
            }
        }

        // Nothing more will be put; consumers drain and then see Closed.
        self.queue.close();

        for handle in self.consumers.drain(..) {
            match handle.join() {
                Ok(packed) => {
                    report.consumed += packed.items.len() as u64;
                    for (producer, seq) in packed.items {
                        report.packed[producer].push(seq);
                    }
                    report.latencies.extend(packed.latencies);
                }
                Err(_) => {
                    warn!("consumer thread panicked");
                    report.panicked += 1;
                }
            }
        }

        info!(
            produced = report.produced,
            consumed = report.consumed,
            panicked = report.panicked,
            "simulation finished"
        );
        report
    }

    /// Cancels already-started workers after a failed spawn.
    fn abort(&self, err: std::io::Error) -> SimError {
        warn!(error = %err, "failed to spawn worker, cancelling simulation");
        self.cancel.cancel();
        self.queue.close();
        SimError::Spawn(err)
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        // Release any blocked workers; join()/shutdown() leave nothing to do here.
        self.cancel.cancel();
        self.queue.close();
    }
}

/// Base delay plus optional jitter.
#[derive(Debug, Clone, Copy)]
struct Pace {
    base: Duration,
    jitter: f64,
}

impl Pace {
    fn new(base: Duration, jitter: f64) -> Self {
        Self {
            base,
            jitter: if jitter.is_finite() { jitter.max(0.0) } else { 0.0 },
        }
    }

    fn next(&self) -> Duration {
        if self.jitter == 0.0 || self.base.is_zero() {
            return self.base;
        }
        let secs = self.base.as_secs_f64() * (1.0 + self.jitter * rand::random::<f64>());
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

struct Producer {
    index: usize,
    queue: Arc<BoundedQueue<Item>>,
    cancel: CancelToken,
    pace: Pace,
    quota: Option<u64>,
}

impl Producer {
    /// Produces until the quota is met or the simulation is cancelled.
    ///
    /// Returns how many items were enqueued.
    fn run(self) -> u64 {
        info!(producer = self.index, "producer started");
        let mut made = 0u64;

        while self.quota.is_none_or(|quota| made < quota) {
            if self.cancel.sleep(self.pace.next()) {
                break;
            }

            let item = Item {
                producer: self.index,
                seq: made + 1,
                produced_at: Instant::now(),
            };

            let result = match self.queue.try_put_len(item) {
                Err(err) if err.reason() == QueueError::Full => {
                    info!(producer = self.index, "queue full, waiting");
                    self.queue
                        .put_cancellable_len(err.into_inner(), Timeout::Infinite, &self.cancel)
                }
                other => other,
            };

            match result {
                Ok(_queue_size) => {
                    made += 1;
                    info!(
                        producer = self.index,
                        item = made,
                        queue_size = _queue_size,
                        "produced item"
                    );
                }
                Err(_err) => {
                    debug!(producer = self.index, reason = %_err.reason(), "producer stopping");
                    break;
                }
            }
        }

        info!(producer = self.index, made, "producer exiting");
        made
    }
}

struct Consumer {
    index: usize,
    queue: Arc<BoundedQueue<Item>>,
    cancel: CancelToken,
    pace: Pace,
    producers: usize,
}

impl Consumer {
    /// Packs items until the queue is closed and drained.
    fn run(self) -> Packed {
        info!(consumer = self.index, "consumer started");
        let mut packed = Packed::default();

        loop {
            // Packing time; cut short once shutdown has begun.
            self.cancel.sleep(self.pace.next());

            let taken = match self.queue.try_take_len() {
                Err(QueueError::Empty) => {
                    info!(consumer = self.index, "queue empty, waiting");
                    self.queue.take_len()
                }
                other => other,
            };

            let Ok((item, _queue_size)) = taken else {
                break;
            };

            debug_assert!(item.producer < self.producers);
            packed
                .latencies
                .push(item.produced_at.elapsed().as_secs_f64());
            packed.items.push((item.producer, item.seq));
            info!(
                consumer = self.index,
                producer = item.producer,
                item = item.seq,
                queue_size = _queue_size,
                "packed item"
            );
        }

        info!(consumer = self.index, packed = packed.items.len(), "consumer exiting");
        packed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast(producers: usize, consumers: usize, items: u64) -> SimConfig {
        SimConfig {
            capacity: 3,
            producers,
            consumers,
            items_per_producer: Some(items),
            produce_delay: Duration::ZERO,
            consume_delay: Duration::ZERO,
            jitter: 0.0,
        }
    }

    #[test]
    fn test_default_config_pacing() {
        let config = SimConfig::default();
        assert_eq!(config.capacity, 10);
        assert_eq!(config.produce_delay, Duration::from_secs(2));
        assert_eq!(config.consume_delay, Duration::from_secs(3));
        assert_eq!(config.items_per_producer, None);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let config = SimConfig {
            capacity: 0,
            ..fast(1, 1, 1)
        };
        assert!(matches!(
            Simulation::spawn(config),
            Err(SimError::InvalidCapacity(_))
        ));
    }

    #[test]
    fn test_rejects_missing_workers() {
        assert!(matches!(
            Simulation::spawn(fast(0, 1, 1)),
            Err(SimError::NoWorkers)
        ));
        assert!(matches!(
            Simulation::spawn(fast(1, 0, 1)),
            Err(SimError::NoWorkers)
        ));
    }

    #[test]
    fn test_single_pair_preserves_order() {
        let report = Simulation::spawn(fast(1, 1, 50)).unwrap().join();

        assert_eq!(report.produced, 50);
        assert_eq!(report.consumed, 50);
        assert_eq!(report.packed[0], (1..=50).collect::<Vec<_>>());
        assert_eq!(report.latency_summary().count, 50);
    }

    #[test]
    fn test_many_workers_deliver_everything_once() {
        let report = Simulation::spawn(fast(3, 2, 40)).unwrap().join();

        assert_eq!(report.produced, 120);
        assert_eq!(report.consumed, 120);
        for per_producer in &report.packed {
            let mut seqs = per_producer.clone();
            seqs.sort_unstable();
            assert_eq!(seqs, (1..=40).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_shutdown_unblocks_producer_on_full_queue() {
        let config = SimConfig {
            capacity: 2,
            items_per_producer: None,
            produce_delay: Duration::ZERO,
            consume_delay: Duration::from_secs(60),
            ..fast(1, 1, 0)
        };
        let sim = Simulation::spawn(config).unwrap();

        // The consumer is still in its first minute-long packing delay, so the
        // producer fills the queue and blocks in put.
        let start = std::time::Instant::now();
        while !sim.queue().is_full() {
            assert!(start.elapsed() < Duration::from_secs(10), "queue never filled");
            thread::sleep(Duration::from_millis(5));
        }

        let report = sim.shutdown();
        assert!(start.elapsed() < Duration::from_secs(30));
        assert_eq!(report.produced, report.consumed);
        assert!(report.produced >= 2);
    }

    #[test]
    fn test_pace_without_jitter_is_exact() {
        let pace = Pace::new(Duration::from_millis(7), 0.0);
        assert_eq!(pace.next(), Duration::from_millis(7));
    }

    #[test]
    fn test_pace_jitter_stays_in_range() {
        let pace = Pace::new(Duration::from_millis(100), 0.5);
        for _ in 0..100 {
            let d = pace.next();
            assert!(d >= Duration::from_millis(100));
            assert!(d <= Duration::from_millis(150));
        }
    }

    #[test]
    fn test_pace_huge_jitter_does_not_panic() {
        let pace = Pace::new(Duration::from_secs(2), 1e20);
        for _ in 0..100 {
            assert!(pace.next() >= Duration::from_secs(2));
        }
    }

    #[test]
    fn test_huge_jitter_run_shuts_down_cleanly() {
        let config = SimConfig {
            produce_delay: Duration::from_secs(2),
            jitter: 1e20,
            ..fast(1, 1, 3)
        };
        let sim = Simulation::spawn(config).unwrap();
        thread::sleep(Duration::from_millis(20));

        let report = sim.shutdown();
        assert!(report.is_clean());
        assert_eq!(report.produced, report.consumed);
    }

    #[test]
    fn test_panicked_workers_are_reported() {
        let mut sim = Simulation::spawn(fast(1, 1, 5)).unwrap();
        sim.producers
            .push(thread::spawn(|| -> u64 { panic!("producer failed") }));
        sim.consumers
            .push(thread::spawn(|| -> Packed { panic!("consumer failed") }));

        let report = sim.join();
        assert_eq!(report.panicked, 2);
        assert!(!report.is_clean());
        assert_eq!(report.produced, 5);
        assert_eq!(report.consumed, 5);
    }

    #[test]
    fn test_clean_run_reports_no_panics() {
        let report = Simulation::spawn(fast(2, 2, 10)).unwrap().join();
        assert_eq!(report.panicked, 0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_pace_ignores_invalid_jitter() {
        assert_eq!(Pace::new(Duration::from_millis(3), f64::NAN).jitter, 0.0);
        assert_eq!(Pace::new(Duration::from_millis(3), -1.0).jitter, 0.0);
    }
}
