//! Play queue and history state machine.
//!
//! `QueueStore` owns a `QueueState` (current entry, pending queue, history,
//! shuffle flag and repeat mode) and exposes the transitions that change it.
//! It performs no I/O: persistence and media metadata hang off it as
//! `QueueObserver`s.

mod error;
mod state;
mod store;

pub use error::QueueError;
pub use state::*;
pub use store::{QueueLimits, QueueStore};

#[cfg(test)]
mod tests;
