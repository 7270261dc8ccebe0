use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::queue::QueueState;

use super::storage::StorageError;

/// Bumped whenever the stored layout changes incompatibly.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("stored queue is unreadable: {0}")]
    Corrupt(String),
    #[error("could not encode queue snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    state: &'a QueueState,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    state: QueueState,
}

pub fn encode(state: &QueueState) -> Result<Vec<u8>, PersistError> {
    serde_json::to_vec(&SnapshotRef {
        version: SNAPSHOT_VERSION,
        state,
    })
    .map_err(PersistError::Encode)
}

pub fn decode(bytes: &[u8]) -> Result<QueueState, PersistError> {
    let snapshot: Snapshot =
        serde_json::from_slice(bytes).map_err(|e| PersistError::Corrupt(e.to_string()))?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(PersistError::Corrupt(format!(
            "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
            snapshot.version
        )));
    }
    Ok(snapshot.state)
}

/// Result of looking for a saved queue.
#[derive(Debug)]
pub enum LoadOutcome {
    Found(QueueState),
    NotFound,
    Failed(PersistError),
}

impl LoadOutcome {
    /// The stored state, treating a failed load like "nothing saved".
    pub fn into_state(self) -> Option<QueueState> {
        match self {
            LoadOutcome::Found(state) => Some(state),
            LoadOutcome::NotFound => None,
            LoadOutcome::Failed(e) => {
                tracing::warn!(error = %e, "could not load saved queue; starting fresh");
                None
            }
        }
    }
}
