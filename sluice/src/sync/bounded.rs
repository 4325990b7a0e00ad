//! Bounded blocking MPMC queue.
//!
//! A fixed-capacity FIFO guarded by one mutex and two condition variables
//! ("not full" and "not empty"). Any number of threads may `put` and `take`
//! concurrently; a `put` blocks only while the queue is full and a `take` only
//! while it is empty.
//!
//! # Overview
//!
//! - [`BoundedQueue::put`] / [`BoundedQueue::take`] - block until they can proceed
//! - `*_timeout` - give up with [`QueueError::Timeout`] after a [`Timeout`]
//! - `*_cancellable` - also give up with [`QueueError::Cancelled`] when a
//!   [`CancelToken`] fires
//! - `try_*` - never block
//! - [`BoundedQueue::close`] - refuse further puts and let takers drain what is left
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sluice::{BoundedQueue, QueueError};
//!
//! let queue = Arc::new(BoundedQueue::new(2).unwrap());
//!
//! let producer = {
//!     let queue = Arc::clone(&queue);
//!     std::thread::spawn(move || {
//!         for i in 0..5 {
//!             queue.put(i).unwrap();
//!         }
//!         queue.close();
//!     })
//! };
//!
//! let received: Vec<i32> = queue.iter().collect();
//! producer.join().unwrap();
//!
//! assert_eq!(received, vec![0, 1, 2, 3, 4]);
//! assert_eq!(queue.take(), Err(QueueError::Closed));
//! ```
//!
//! # Wait discipline
//!
//! Every blocked caller re-checks its condition in a loop after each wakeup, so
//! spurious wakeups and wakeups that another thread raced to first are harmless.
//! The condition is re-checked before cancellation or the deadline, which means a
//! waiter that is woken exactly as it times out still takes the slot or item it
//! was woken for instead of discarding the notification. Notifications are sent
//! while the lock is still held.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::{InvalidCapacity, PutError, QueueError};
use crate::ring::Ring;
use crate::sync::cancel::{CancelToken, Wake};
use crate::sync::wait::{Deadline, Timeout};
use crate::trace::{debug, trace};

/// Lock-protected queue state.
struct State<T> {
    ring: Ring<T>,
    closed: bool,
}

/// The lock and both wait conditions.
///
/// Kept behind an `Arc` so a [`CancelToken`] can hold a wake hook to it.
struct Monitor<T> {
    state: Mutex<State<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> Monitor<T> {
    /// Locks the state.
    ///
    /// No user code runs under this lock, so a poisoned lock still guards a
    /// consistent state and is recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks on `cond` until notified or `deadline` passes, whichever is first.
    ///
    /// The caller must have checked that `deadline` has not expired.
    fn wait<'a>(
        &self,
        cond: &Condvar,
        state: MutexGuard<'a, State<T>>,
        deadline: Deadline,
    ) -> MutexGuard<'a, State<T>> {
        match deadline.remaining() {
            Some(left) => {
                cond.wait_timeout(state, left)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => cond.wait(state).unwrap_or_else(PoisonError::into_inner),
        }
    }

    fn wake_all(&self) {
        let _state = self.lock();
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }
}

impl<T: Send> Wake for Monitor<T> {
    fn wake(&self) {
        self.wake_all();
    }
}

/// Checks cancellation and the deadline for a caller about to (re)enter a wait.
fn interrupted(deadline: &Deadline, cancel: Option<&CancelToken>) -> Option<QueueError> {
    if cancel.is_some_and(CancelToken::is_cancelled) {
        return Some(QueueError::Cancelled);
    }
    if deadline.remaining().is_some_and(|left| left.is_zero()) {
        return Some(QueueError::Timeout);
    }
    None
}

/// Fixed-capacity blocking FIFO queue.
///
/// Share it between threads by reference (e.g. `std::thread::scope`) or through
/// an `Arc`. Items handed out by `take` are owned by the caller; the queue keeps
/// no reference to them.
pub struct BoundedQueue<T> {
    monitor: Arc<Monitor<T>>,
}

impl<T> BoundedQueue<T> {
    /// Creates an empty, open queue with room for `capacity` items.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, InvalidCapacity> {
        let capacity = NonZeroUsize::new(capacity).ok_or(InvalidCapacity)?;
        Ok(Self {
            monitor: Arc::new(Monitor {
                state: Mutex::new(State {
                    ring: Ring::new(capacity),
                    closed: false,
                }),
                not_full: Condvar::new(),
                not_empty: Condvar::new(),
            }),
        })
    }

    /// Enqueues `item`, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// [`QueueError::Closed`] if the queue is or becomes closed before a slot
    /// frees up. The item is returned inside the error.
    pub fn put(&self, item: T) -> Result<(), PutError<T>> {
        self.put_inner(item, Deadline::after(Timeout::Infinite), None)
            .map(drop)
    }

    /// Enqueues `item`, blocking for at most `timeout` while the queue is full.
    ///
    /// # Errors
    ///
    /// [`QueueError::Timeout`] if no slot freed up in time, or
    /// [`QueueError::Closed`]. The queue is unchanged and the item is returned.
    pub fn put_timeout(&self, item: T, timeout: impl Into<Timeout>) -> Result<(), PutError<T>> {
        self.put_inner(item, Deadline::after(timeout.into()), None)
            .map(drop)
    }

    /// Enqueues `item` only if a slot is free right now.
    ///
    /// # Errors
    ///
    /// [`QueueError::Full`] or [`QueueError::Closed`], with the item returned.
    pub fn try_put(&self, item: T) -> Result<(), PutError<T>> {
        self.try_put_len(item).map(drop)
    }

    /// [`try_put`](Self::try_put) that also reports the length right after the
    /// push, read under the same lock.
    pub(crate) fn try_put_len(&self, item: T) -> Result<usize, PutError<T>> {
        let mut state = self.monitor.lock();
        if state.closed {
            return Err(PutError::new(item, QueueError::Closed));
        }
        match state.ring.push(item) {
            Ok(()) => {
                self.monitor.not_empty.notify_one();
                Ok(state.ring.len())
            }
            Err(item) => Err(PutError::new(item, QueueError::Full)),
        }
    }

    /// Dequeues the oldest item, blocking while the queue is empty.
    ///
    /// # Errors
    ///
    /// [`QueueError::Closed`] once the queue is closed and every buffered item
    /// has been taken.
    pub fn take(&self) -> Result<T, QueueError> {
        self.take_len().map(|(item, _)| item)
    }

    /// [`take`](Self::take) that also reports the length left behind.
    pub(crate) fn take_len(&self) -> Result<(T, usize), QueueError> {
        self.take_inner(Deadline::after(Timeout::Infinite), None)
    }

    /// Dequeues the oldest item, blocking for at most `timeout` while empty.
    ///
    /// # Errors
    ///
    /// [`QueueError::Timeout`] if nothing arrived in time, or
    /// [`QueueError::Closed`] once closed and drained.
    pub fn take_timeout(&self, timeout: impl Into<Timeout>) -> Result<T, QueueError> {
        self.take_inner(Deadline::after(timeout.into()), None)
            .map(|(item, _)| item)
    }

    /// Dequeues the oldest item only if one is buffered right now.
    ///
    /// # Errors
    ///
    /// [`QueueError::Empty`] while open, [`QueueError::Closed`] once closed and
    /// drained.
    pub fn try_take(&self) -> Result<T, QueueError> {
        self.try_take_len().map(|(item, _)| item)
    }

    pub(crate) fn try_take_len(&self) -> Result<(T, usize), QueueError> {
        let mut state = self.monitor.lock();
        match state.ring.pop() {
            Some(item) => {
                self.monitor.not_full.notify_one();
                Ok((item, state.ring.len()))
            }
            None if state.closed => Err(QueueError::Closed),
            None => Err(QueueError::Empty),
        }
    }

    /// Closes the queue.
    ///
    /// Blocked and future puts fail with [`QueueError::Closed`]. Takes keep
    /// returning buffered items in order and fail with `Closed` only once the
    /// queue is empty. Closing twice is a no-op.
    pub fn close(&self) {
        let mut state = self.monitor.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        debug!(buffered = state.ring.len(), "queue closed");
        self.monitor.not_full.notify_all();
        self.monitor.not_empty.notify_all();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.monitor.lock().closed
    }

    /// Number of buffered items at the moment of the call.
    #[must_use]
    pub fn len(&self) -> usize {
        self.monitor.lock().ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.monitor.lock().ring.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.monitor.lock().ring.is_full()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.monitor.lock().ring.capacity()
    }

    /// Blocking iterator over taken items.
    ///
    /// Each call to `next` is a [`take`](Self::take); iteration ends once the
    /// queue is closed and drained.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { queue: self }
    }

    fn put_inner(
        &self,
        item: T,
        deadline: Deadline,
        cancel: Option<&CancelToken>,
    ) -> Result<usize, PutError<T>> {
        let monitor = &*self.monitor;
        let mut state = monitor.lock();
        loop {
            if state.closed {
                return Err(PutError::new(item, QueueError::Closed));
            }
            if !state.ring.is_full() {
                break;
            }
            if let Some(reason) = interrupted(&deadline, cancel) {
                debug!(%reason, "put abandoned");
                return Err(PutError::new(item, reason));
            }
            trace!(len = state.ring.len(), "queue full, put waiting");
            state = monitor.wait(&monitor.not_full, state, deadline);
        }

        if let Err(item) = state.ring.push(item) {
            // Unreachable: fullness was checked under the same lock.
            return Err(PutError::new(item, QueueError::Full));
        }
        let len = state.ring.len();
        trace!(len, "item enqueued");
        monitor.not_empty.notify_one();
        drop(state);
        Ok(len)
    }

    fn take_inner(
        &self,
        deadline: Deadline,
        cancel: Option<&CancelToken>,
    ) -> Result<(T, usize), QueueError> {
        let monitor = &*self.monitor;
        let mut state = monitor.lock();
        loop {
            if let Some(item) = state.ring.pop() {
                let len = state.ring.len();
                trace!(len, "item dequeued");
                monitor.not_full.notify_one();
                drop(state);
                return Ok((item, len));
            }
            if state.closed {
                return Err(QueueError::Closed);
            }
            if let Some(reason) = interrupted(&deadline, cancel) {
                debug!(%reason, "take abandoned");
                return Err(reason);
            }
            trace!("queue empty, take waiting");
            state = monitor.wait(&monitor.not_empty, state, deadline);
        }
    }
}

impl<T: Send + 'static> BoundedQueue<T> {
    /// Like [`put_timeout`](Self::put_timeout), but also gives up when `cancel`
    /// fires while the queue is full.
    ///
    /// A token that is already cancelled still lets the put through if a slot is
    /// free: cancellation only interrupts waiting.
    ///
    /// # Errors
    ///
    /// [`QueueError::Cancelled`], [`QueueError::Timeout`] or
    /// [`QueueError::Closed`], with the item returned and the queue unchanged.
    pub fn put_cancellable(
        &self,
        item: T,
        timeout: impl Into<Timeout>,
        cancel: &CancelToken,
    ) -> Result<(), PutError<T>> {
        self.put_cancellable_len(item, timeout.into(), cancel)
            .map(drop)
    }

    /// [`put_cancellable`](Self::put_cancellable) that also reports the length
    /// right after the push.
    pub(crate) fn put_cancellable_len(
        &self,
        item: T,
        timeout: Timeout,
        cancel: &CancelToken,
    ) -> Result<usize, PutError<T>> {
        let deadline = Deadline::after(timeout);
        let _registration = cancel.register(self.wake_hook());
        self.put_inner(item, deadline, Some(cancel))
    }

    /// Like [`take_timeout`](Self::take_timeout), but also gives up when
    /// `cancel` fires while the queue is empty.
    ///
    /// # Errors
    ///
    /// [`QueueError::Cancelled`], [`QueueError::Timeout`] or
    /// [`QueueError::Closed`]; nothing is removed.
    pub fn take_cancellable(
        &self,
        timeout: impl Into<Timeout>,
        cancel: &CancelToken,
    ) -> Result<T, QueueError> {
        let deadline = Deadline::after(timeout.into());
        let _registration = cancel.register(self.wake_hook());
        self.take_inner(deadline, Some(cancel))
            .map(|(item, _)| item)
    }

    fn wake_hook(&self) -> Arc<dyn Wake> {
        Arc::clone(&self.monitor) as Arc<dyn Wake>
    }
}

impl<T: Clone> BoundedQueue<T> {
    /// Copies the buffered items, oldest first, without removing them.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.monitor.lock().ring.iter().cloned().collect()
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.monitor.lock();
        f.debug_struct("BoundedQueue")
            .field("capacity", &state.ring.capacity())
            .field("len", &state.ring.len())
            .field("closed", &state.closed)
            .finish()
    }
}

/// Iterator returned by [`BoundedQueue::iter`].
pub struct Iter<'a, T> {
    queue: &'a BoundedQueue<T>,
}

impl<T> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.queue.take().ok()
    }
}

impl<'a, T> IntoIterator for &'a BoundedQueue<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    /// Long enough for a spawned thread to reach its wait.
    const SETTLE: Duration = Duration::from_millis(50);

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(BoundedQueue::<u8>::new(0), Err(InvalidCapacity)));
    }

    #[test]
    fn test_basic_put_take() {
        let queue = BoundedQueue::new(8).unwrap();

        queue.put(42).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.take(), Ok(42));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_fifo_order() {
        let queue = BoundedQueue::new(4).unwrap();

        queue.put("a").unwrap();
        queue.put("b").unwrap();
        queue.put("c").unwrap();

        assert_eq!(queue.take(), Ok("a"));
        assert_eq!(queue.take(), Ok("b"));
        assert_eq!(queue.take(), Ok("c"));
    }

    #[test]
    fn test_try_put_full() {
        let queue = BoundedQueue::new(2).unwrap();

        queue.try_put(1).unwrap();
        queue.try_put(2).unwrap();
        let err = queue.try_put(3).unwrap_err();
        assert_eq!(err.reason(), QueueError::Full);
        assert_eq!(err.into_inner(), 3);
        assert_eq!(queue.snapshot(), vec![1, 2]);
    }

    #[test]
    fn test_try_take_empty_then_closed() {
        let queue = BoundedQueue::<u32>::new(2).unwrap();

        assert_eq!(queue.try_take(), Err(QueueError::Empty));
        queue.close();
        assert_eq!(queue.try_take(), Err(QueueError::Closed));
    }

    #[test]
    fn test_take_timeout_on_empty() {
        let queue = BoundedQueue::<u32>::new(1).unwrap();

        let start = Instant::now();
        assert_eq!(
            queue.take_timeout(Duration::from_millis(10)),
            Err(QueueError::Timeout)
        );
        assert!(start.elapsed() >= Duration::from_millis(10));
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_put_timeout_on_full_returns_item() {
        let queue = BoundedQueue::new(1).unwrap();
        queue.put(1).unwrap();

        let err = queue.put_timeout(2, Duration::from_millis(10)).unwrap_err();
        assert_eq!(err.into_parts(), (2, QueueError::Timeout));
        assert_eq!(queue.snapshot(), vec![1]);
    }

    #[test]
    fn test_zero_timeout_still_succeeds_when_ready() {
        let queue = BoundedQueue::new(1).unwrap();

        queue.put_timeout(5, Duration::ZERO).unwrap();
        assert_eq!(queue.take_timeout(Duration::ZERO), Ok(5));
    }

    #[test]
    fn test_close_rejects_put_and_drains_take() {
        let queue = BoundedQueue::new(4).unwrap();
        queue.put(1).unwrap();
        queue.put(2).unwrap();
        queue.close();

        let err = queue.put(3).unwrap_err();
        assert_eq!(err.reason(), QueueError::Closed);
        assert_eq!(queue.take(), Ok(1));
        assert_eq!(queue.take(), Ok(2));
        assert_eq!(queue.take(), Err(QueueError::Closed));
    }

    #[test]
    fn test_close_is_idempotent() {
        let queue = BoundedQueue::<u8>::new(1).unwrap();

        assert!(!queue.is_closed());
        queue.close();
        queue.close();
        assert!(queue.is_closed());
    }

    #[test]
    fn test_put_blocks_until_take() {
        let queue = BoundedQueue::new(1).unwrap();
        queue.put(1).unwrap();
        let done = AtomicBool::new(false);

        thread::scope(|s| {
            s.spawn(|| {
                queue.put(2).unwrap();
                done.store(true, Ordering::SeqCst);
            });

            thread::sleep(SETTLE);
            assert!(!done.load(Ordering::SeqCst), "put returned on a full queue");

            assert_eq!(queue.take(), Ok(1));
        });

        assert!(done.load(Ordering::SeqCst));
        assert_eq!(queue.snapshot(), vec![2]);
    }

    #[test]
    fn test_take_blocks_until_put() {
        let queue = BoundedQueue::new(1).unwrap();

        thread::scope(|s| {
            let taker = s.spawn(|| queue.take());

            thread::sleep(SETTLE);
            assert!(!taker.is_finished(), "take returned on an empty queue");

            queue.put(7).unwrap();
            assert_eq!(taker.join().unwrap(), Ok(7));
        });
    }

    #[test]
    fn test_close_wakes_blocked_put() {
        let queue = BoundedQueue::new(1).unwrap();
        queue.put(1).unwrap();

        thread::scope(|s| {
            let putter = s.spawn(|| queue.put(2));
            thread::sleep(SETTLE);
            queue.close();

            let err = putter.join().unwrap().unwrap_err();
            assert_eq!(err.into_parts(), (2, QueueError::Closed));
        });

        assert_eq!(queue.take(), Ok(1));
        assert_eq!(queue.take(), Err(QueueError::Closed));
    }

    #[test]
    fn test_close_wakes_all_blocked_takers() {
        let queue = BoundedQueue::<u32>::new(2).unwrap();

        thread::scope(|s| {
            let takers: Vec<_> = (0..4).map(|_| s.spawn(|| queue.take())).collect();
            thread::sleep(SETTLE);
            queue.close();

            for taker in takers {
                assert_eq!(taker.join().unwrap(), Err(QueueError::Closed));
            }
        });
    }

    #[test]
    fn test_cancel_blocked_take() {
        let queue = BoundedQueue::<u32>::new(1).unwrap();
        let token = CancelToken::new();

        thread::scope(|s| {
            let taker = s.spawn(|| queue.take_cancellable(Timeout::Infinite, &token));
            thread::sleep(SETTLE);
            token.cancel();
            assert_eq!(taker.join().unwrap(), Err(QueueError::Cancelled));
        });

        // The queue is still usable and unchanged.
        queue.put(3).unwrap();
        assert_eq!(queue.take(), Ok(3));
    }

    #[test]
    fn test_cancel_blocked_put_returns_item() {
        let queue = BoundedQueue::new(1).unwrap();
        queue.put(String::from("kept")).unwrap();
        let token = CancelToken::new();

        thread::scope(|s| {
            let putter = s.spawn(|| {
                queue.put_cancellable(String::from("dropped"), Timeout::Infinite, &token)
            });
            thread::sleep(SETTLE);
            token.cancel();

            let err = putter.join().unwrap().unwrap_err();
            assert_eq!(err.reason(), QueueError::Cancelled);
            assert_eq!(err.into_inner(), "dropped");
        });

        assert_eq!(queue.snapshot(), vec![String::from("kept")]);
    }

    #[test]
    fn test_cancelled_token_does_not_block_ready_operation() {
        let queue = BoundedQueue::new(1).unwrap();
        let token = CancelToken::new();
        token.cancel();

        queue.put_cancellable(9, Timeout::Infinite, &token).unwrap();
        assert_eq!(queue.take_cancellable(Timeout::Infinite, &token), Ok(9));
        assert_eq!(
            queue.take_cancellable(Timeout::Infinite, &token),
            Err(QueueError::Cancelled)
        );
    }

    #[test]
    fn test_one_token_cancels_waiters_on_many_queues() {
        let first = BoundedQueue::<u8>::new(1).unwrap();
        let second = BoundedQueue::<u8>::new(1).unwrap();
        let token = CancelToken::new();

        thread::scope(|s| {
            let a = s.spawn(|| first.take_cancellable(Timeout::Infinite, &token));
            let b = s.spawn(|| second.take_cancellable(Timeout::Infinite, &token));
            thread::sleep(SETTLE);
            token.cancel();

            assert_eq!(a.join().unwrap(), Err(QueueError::Cancelled));
            assert_eq!(b.join().unwrap(), Err(QueueError::Cancelled));
        });
    }

    #[test]
    fn test_iter_drains_until_closed() {
        let queue = BoundedQueue::new(3).unwrap();
        queue.put(1).unwrap();
        queue.put(2).unwrap();
        queue.close();

        let drained: Vec<_> = (&queue).into_iter().collect();
        assert_eq!(drained, vec![1, 2]);
    }

    #[test]
    fn test_wrapping_behavior() {
        let queue = BoundedQueue::new(4).unwrap();

        for round in 0..5u64 {
            for i in 0..4 {
                queue.put(round * 10 + i).unwrap();
            }
            assert!(queue.is_full());
            for i in 0..4 {
                assert_eq!(queue.take(), Ok(round * 10 + i));
            }
        }
    }

    #[test]
    fn test_mpmc_no_lost_or_duplicated_items() {
        let queue = BoundedQueue::new(8).unwrap();
        let producers = 4;
        let per_producer = 500usize;
        let taken = AtomicUsize::new(0);

        let mut received = thread::scope(|s| {
            for p in 0..producers {
                let queue = &queue;
                s.spawn(move || {
                    for i in 0..per_producer {
                        queue.put(p * per_producer + i).unwrap();
                    }
                });
            }

            let consumers: Vec<_> = (0..3)
                .map(|_| {
                    s.spawn(|| {
                        let mut mine = Vec::new();
                        while taken.fetch_add(1, Ordering::SeqCst) < producers * per_producer {
                            mine.push(queue.take().unwrap());
                        }
                        mine
                    })
                })
                .collect();

            consumers
                .into_iter()
                .flat_map(|c| c.join().unwrap())
                .collect::<Vec<_>>()
        });

        received.sort_unstable();
        assert_eq!(received, (0..producers * per_producer).collect::<Vec<_>>());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_reported_len_is_taken_under_the_lock() {
        let queue = BoundedQueue::new(3).unwrap();
        let token = CancelToken::new();

        assert_eq!(queue.try_put_len('a').unwrap(), 1);
        assert_eq!(queue.put_cancellable_len('b', Timeout::Infinite, &token).unwrap(), 2);
        assert_eq!(queue.try_take_len(), Ok(('a', 1)));
        assert_eq!(queue.take_len(), Ok(('b', 0)));
    }

    #[test]
    fn test_len_stays_consistent_while_others_contend() {
        let queue = BoundedQueue::new(4).unwrap();

        thread::scope(|s| {
            s.spawn(|| {
                for i in 0..2000u32 {
                    queue.put(i).unwrap();
                }
            });
            for _ in 0..2000 {
                let (_, left) = queue.take_len().unwrap();
                assert!(left < 4, "len after a take must leave a free slot");
            }
        });
    }

    #[test]
    fn test_debug_output() {
        let queue = BoundedQueue::new(3).unwrap();
        queue.put(1).unwrap();
        assert_eq!(
            format!("{queue:?}"),
            "BoundedQueue { capacity: 3, len: 1, closed: false }"
        );
    }
}
