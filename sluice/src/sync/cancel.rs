//! Cancellation for blocked queue operations.
//!
//! A [`CancelToken`] is shared between whoever decides to stop waiting and the
//! threads doing the waiting. Cancelling sets a flag and then wakes every queue a
//! waiter is currently parked on.
//!
//! # Wakeup protocol
//!
//! ```text
//! waiter                                  canceller
//! ──────                                  ─────────
//! register(queue hook)                    cancelled = true
//! lock queue                              snapshot registered hooks
//! loop:                                   for each hook:
//!   condition met?      -> proceed            lock queue
//!   cancelled?          -> Cancelled          notify_all
//!   wait (unlocks queue)                      unlock
//! unlock queue
//! unregister
//! ```
//!
//! The hook takes the queue's own lock before notifying, so the flag store is
//! either seen by the waiter's check or followed by a notify that reaches the
//! waiter's condvar wait.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::sync::wait::{Deadline, Timeout};

/// Something a cancelled token must wake: in practice a queue's condvars.
pub(crate) trait Wake: Send + Sync {
    fn wake(&self);
}

/// Shared flag that interrupts blocked `put`/`take` calls.
///
/// Clones share the same state. Cancellation is one-way.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use sluice::{BoundedQueue, CancelToken, QueueError, Timeout};
///
/// let queue = BoundedQueue::<u32>::new(1).unwrap();
/// let token = CancelToken::new();
///
/// std::thread::scope(|s| {
///     let waiter = s.spawn(|| queue.take_cancellable(Timeout::Infinite, &token));
///     std::thread::sleep(Duration::from_millis(20));
///     token.cancel();
///     assert_eq!(waiter.join().unwrap(), Err(QueueError::Cancelled));
/// });
/// ```
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    hooks: Mutex<Hooks>,
    /// Wakes [`CancelToken::sleep`]; paired with `hooks`.
    sleepers: Condvar,
}

#[derive(Default)]
struct Hooks {
    next_id: u64,
    entries: Vec<(u64, Arc<dyn Wake>)>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the token and wakes everything waiting on it.
    ///
    /// Calling this more than once has no further effect.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }

        let hooks: Vec<Arc<dyn Wake>> = {
            let hooks = self.lock_hooks();
            self.inner.sleepers.notify_all();
            hooks.entries.iter().map(|(_, hook)| Arc::clone(hook)).collect()
        };

        // The registry lock is released before taking any queue lock.
        for hook in hooks {
            hook.wake();
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Sleeps for `duration` or until the token is cancelled.
    ///
    /// Returns `true` if the token was (or already had been) cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Deadline::after(Timeout::Duration(duration));
        let mut hooks = self.lock_hooks();
        loop {
            if self.is_cancelled() {
                return true;
            }
            match deadline.remaining() {
                Some(left) if left.is_zero() => return false,
                Some(left) => {
                    hooks = self
                        .inner
                        .sleepers
                        .wait_timeout(hooks, left)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
                None => {
                    hooks = self
                        .inner
                        .sleepers
                        .wait(hooks)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Registers `hook` to be woken on cancellation until the guard is dropped.
    pub(crate) fn register(&self, hook: Arc<dyn Wake>) -> Registration<'_> {
        let mut hooks = self.lock_hooks();
        let id = hooks.next_id;
        hooks.next_id += 1;
        hooks.entries.push((id, hook));
        Registration { token: self, id }
    }

    fn lock_hooks(&self) -> MutexGuard<'_, Hooks> {
        self.inner
            .hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn registered(&self) -> usize {
        self.lock_hooks().entries.len()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Keeps a hook registered with a [`CancelToken`] for the length of one wait.
pub(crate) struct Registration<'a> {
    token: &'a CancelToken,
    id: u64,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        let mut hooks = self.token.lock_hooks();
        hooks.entries.retain(|(id, _)| *id != self.id);
    }
}
