use thiserror::Error;

/// A queue request that was refused. State is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("queue is full: {requested} more would exceed the limit of {max} ({len} pending)")]
    Overflow {
        requested: usize,
        len: usize,
        max: usize,
    },
    #[error("no pending entry at index {index} (queue holds {len})")]
    OutOfRange { index: usize, len: usize },
}
