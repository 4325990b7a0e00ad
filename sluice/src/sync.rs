//! Blocking synchronization primitives for in-process producer/consumer hand-off.
//!
//! - [`bounded`] - the fixed-capacity blocking FIFO
//! - [`cancel`] - tokens that interrupt a blocked `put`/`take`
//! - [`wait`] - timeouts shared by the blocking calls

pub mod bounded;
pub mod cancel;
pub mod wait;
