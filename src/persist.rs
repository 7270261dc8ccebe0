//! Debounced persistence of the queue state.

mod debounce;
mod snapshot;
mod storage;
mod worker;

pub use debounce::Debounce;
pub use snapshot::{LoadOutcome, PersistError, SNAPSHOT_VERSION};
pub use storage::{FileStore, KeyValueStore, StorageError};
pub use worker::{PersistHandle, PersistObserver, Persister};

#[cfg(test)]
mod tests;
