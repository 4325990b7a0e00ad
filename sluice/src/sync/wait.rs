//! Timeouts for blocking operations.

use std::time::Duration;

use minstant::Instant;

/// Timeout specification for blocking operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeout {
    /// Wait indefinitely.
    #[default]
    Infinite,
    /// Wait for at most the specified duration.
    Duration(Duration),
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(d: Option<Duration>) -> Self {
        d.map_or(Self::Infinite, Self::Duration)
    }
}

/// Absolute point at which a bounded wait gives up.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline(Option<Instant>);

impl Deadline {
    /// Starts the clock for `timeout`.
    ///
    /// A duration too large to represent as an instant waits forever.
    pub(crate) fn after(timeout: Timeout) -> Self {
        match timeout {
            Timeout::Infinite => Self(None),
            // minstant truncates nanoseconds to u64 before adding.
            Timeout::Duration(d) if u64::try_from(d.as_nanos()).is_err() => Self(None),
            Timeout::Duration(d) => Self(Instant::now().checked_add(d)),
        }
    }

    /// Time left before the deadline.
    ///
    /// `None` means unbounded; `Some(Duration::ZERO)` means expired.
    pub(crate) fn remaining(&self) -> Option<Duration> {
        self.0.map(|at| {
            at.checked_duration_since(Instant::now())
                .unwrap_or(Duration::ZERO)
        })
    }
}
