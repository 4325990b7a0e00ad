//! Logging for the queue and the simulation driver.
//!
//! What gets logged, by level:
//! - `trace`: a `put` or `take` starting to wait on a full or empty queue, and
//!   each enqueue/dequeue with the length left behind
//! - `debug`: `close`, and waits abandoned on timeout or cancellation
//! - `info`: simulation start and finish, each produced and packed item with the
//!   queue size seen under the lock, and producers/consumers stalling
//! - `warn`: worker threads that panicked or failed to spawn
//!
//! Enable with `--features tracing`. Without it the macros swallow their
//! arguments, so call them as statements only: in expression position the
//! disabled build has nothing to evaluate.

/// Installs a global subscriber with uptime timestamps and thread names.
///
/// The filter comes from `RUST_LOG` and falls back to `sluice=trace`.
/// Does nothing if the `tracing` feature is not enabled.
///
/// # Panics
///
/// Panics if a global subscriber was already installed. Call it once, from
/// `main` or behind a `std::sync::Once` in tests.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sluice=trace"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(false)
                .with_line_number(false)
                .with_timer(fmt::time::uptime()),
        )
        .with(filter)
        .init();
}

#[cfg(not(feature = "tracing"))]
pub const fn init_tracing() {}

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, info, trace, warn};

#[cfg(not(feature = "tracing"))]
macro_rules! trace_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! info_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use debug_noop as debug;
#[cfg(not(feature = "tracing"))]
pub(crate) use info_noop as info;
#[cfg(not(feature = "tracing"))]
pub(crate) use trace_noop as trace;
#[cfg(not(feature = "tracing"))]
pub(crate) use warn_noop as warn;
