//! Error types for queue construction and the blocking operations.

use thiserror::Error;

/// Returned by [`BoundedQueue::new`](crate::BoundedQueue::new) for a zero capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("queue capacity must be greater than 0")]
pub struct InvalidCapacity;

/// Why a `put` or `take` did not complete.
///
/// None of these leave the queue modified: an item that was not enqueued is
/// handed back through [`PutError`], and a failed `take` removes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue was closed. `take` only reports this once it is also drained.
    #[error("queue is closed")]
    Closed,

    /// A bounded wait expired before space or an item became available.
    #[error("timed out waiting on queue")]
    Timeout,

    /// The caller's [`CancelToken`](crate::CancelToken) fired while it was waiting.
    #[error("wait on queue was cancelled")]
    Cancelled,

    /// Non-blocking `try_put` found no free slot.
    #[error("queue is full")]
    Full,

    /// Non-blocking `try_take` found no buffered item.
    #[error("queue is empty")]
    Empty,
}

/// A rejected `put`, carrying the item back to the caller.
#[derive(Debug, Error)]
#[error("put rejected: {reason}")]
pub struct PutError<T> {
    item: T,
    reason: QueueError,
}

impl<T> PutError<T> {
    pub(crate) const fn new(item: T, reason: QueueError) -> Self {
        Self { item, reason }
    }

    /// Why the item was not enqueued.
    #[must_use]
    pub const fn reason(&self) -> QueueError {
        self.reason
    }

    /// Recovers the item that was not enqueued.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.item
    }

    /// Splits into the item and the reason it was rejected.
    #[must_use]
    pub fn into_parts(self) -> (T, QueueError) {
        (self.item, self.reason)
    }
}

impl<T> From<PutError<T>> for QueueError {
    fn from(err: PutError<T>) -> Self {
        err.reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_error_returns_item() {
        let err = PutError::new(String::from("payload"), QueueError::Closed);
        assert_eq!(err.reason(), QueueError::Closed);
        assert_eq!(err.into_inner(), "payload");
    }

    #[test]
    fn test_put_error_converts_to_reason() {
        fn forward() -> Result<(), QueueError> {
            let put: Result<(), PutError<u32>> = Err(PutError::new(7, QueueError::Timeout));
            put?;
            Ok(())
        }

        assert_eq!(forward(), Err(QueueError::Timeout));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            InvalidCapacity.to_string(),
            "queue capacity must be greater than 0"
        );
        assert_eq!(
            PutError::new(1u8, QueueError::Full).to_string(),
            "put rejected: queue is full"
        );
    }
}
