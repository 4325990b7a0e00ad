//! Bounded blocking FIFO queue for coordinating producer and consumer threads.
//!
//! The crate is built around [`BoundedQueue`]: a fixed-capacity circular buffer
//! behind a single mutex with "not full" / "not empty" condition variables.
//! Producers block in [`put`](BoundedQueue::put) while it is full, consumers
//! block in [`take`](BoundedQueue::take) while it is empty, and
//! [`close`](BoundedQueue::close) gives both sides a way to observe shutdown.
//!
//! Alongside it:
//! - [`sim`] - a producer/consumer simulation driving the queue from named threads
//! - [`stats`] - summary statistics over `f64` samples
//!
//! Enable the `tracing` feature and call [`init_tracing`] to see queue waits,
//! wakeups and the simulation's per-item log.

mod error;
mod ring;
mod trace;

pub mod sim;
pub mod stats;
pub mod sync;

pub use error::{InvalidCapacity, PutError, QueueError};
pub use sync::bounded::{BoundedQueue, Iter};
pub use sync::cancel::CancelToken;
pub use sync::wait::Timeout;
pub use trace::init_tracing;
