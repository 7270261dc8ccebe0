use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::queue::{QueueObserver, QueueState, Transition};

use super::debounce::Debounce;
use super::snapshot::{self, LoadOutcome, PersistError};
use super::storage::{KeyValueStore, StorageError};

enum PersistMsg {
    Save(QueueState),
    Clear(Sender<Result<(), StorageError>>),
    Shutdown,
}

/// Background writer for queue snapshots.
///
/// Saves are debounced on a worker thread so bursts of queue changes turn
/// into one write. Shutting down (or dropping) cancels a write that has not
/// fired yet.
pub struct Persister {
    tx: Sender<PersistMsg>,
    storage: Arc<dyn KeyValueStore>,
    key: String,
    worker: Option<JoinHandle<()>>,
}

impl Persister {
    pub fn spawn(storage: Arc<dyn KeyValueStore>, key: impl Into<String>, delay: Duration) -> Self {
        let key = key.into();
        let (tx, rx) = mpsc::channel();
        let worker = {
            let storage = Arc::clone(&storage);
            let key = key.clone();
            thread::Builder::new()
                .name("encore-persist".into())
                .spawn(move || run_worker(rx, storage, key, delay))
                .map_err(|e| tracing::error!(error = %e, "could not start persistence worker"))
                .ok()
        };
        Self {
            tx,
            storage,
            key,
            worker,
        }
    }

    /// A sender that can be handed to the queue as an observer.
    pub fn handle(&self) -> PersistHandle {
        PersistHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn schedule_persist(&self, state: QueueState) {
        self.handle().schedule_persist(state);
    }

    /// Read the stored snapshot synchronously.
    pub fn load_persisted(&self) -> LoadOutcome {
        match self.storage.get(&self.key) {
            Ok(None) => LoadOutcome::NotFound,
            Ok(Some(bytes)) => match snapshot::decode(&bytes) {
                Ok(state) => LoadOutcome::Found(state),
                Err(e) => LoadOutcome::Failed(e),
            },
            Err(e) => LoadOutcome::Failed(e.into()),
        }
    }

    /// Drop any pending write and delete the stored snapshot.
    pub fn clear_persisted(&self) -> Result<(), PersistError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        if self.tx.send(PersistMsg::Clear(reply_tx)).is_ok() {
            if let Ok(result) = reply_rx.recv() {
                return result.map_err(PersistError::from);
            }
        }
        // Worker is gone; nothing can race us.
        self.storage.remove(&self.key).map_err(PersistError::from)
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.tx.send(PersistMsg::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("persistence worker panicked");
            }
        }
    }
}

impl Drop for Persister {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(
    rx: Receiver<PersistMsg>,
    storage: Arc<dyn KeyValueStore>,
    key: String,
    delay: Duration,
) {
    let mut debounce = Debounce::new(delay);
    loop {
        let msg = match debounce.deadline() {
            Some(deadline) => {
                match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(msg) => Some(msg),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(msg) => Some(msg),
                Err(_) => break,
            },
        };

        match msg {
            Some(PersistMsg::Save(state)) => debounce.schedule(state, Instant::now()),
            Some(PersistMsg::Clear(reply)) => {
                debounce.cancel();
                let _ = reply.send(storage.remove(&key));
            }
            Some(PersistMsg::Shutdown) => {
                if debounce.cancel() {
                    tracing::debug!("discarding queue snapshot that had not been written");
                }
                break;
            }
            None => {}
        }

        if let Some(state) = debounce.poll(Instant::now()) {
            write_snapshot(storage.as_ref(), &key, &state);
        }
    }
}

fn write_snapshot(storage: &dyn KeyValueStore, key: &str, state: &QueueState) {
    let result = snapshot::encode(state)
        .and_then(|bytes| storage.set(key, &bytes).map(|()| bytes.len()).map_err(Into::into));
    match result {
        Ok(bytes) => tracing::debug!(key, bytes, "queue snapshot written"),
        Err(e) => tracing::warn!(key, error = %e, "could not persist queue"),
    }
}

/// Cloneable sender side of a [`Persister`].
#[derive(Clone)]
pub struct PersistHandle {
    tx: Sender<PersistMsg>,
}

impl PersistHandle {
    pub fn schedule_persist(&self, state: QueueState) {
        if self.tx.send(PersistMsg::Save(state)).is_err() {
            tracing::debug!("persistence worker stopped; snapshot dropped");
        }
    }
}

/// Queue observer that schedules a save after each meaningful transition.
///
/// Position updates only count once playback has moved `position_interval`
/// past the last saved position, so steady playback does not keep pushing
/// the debounce deadline out.
pub struct PersistObserver {
    handle: PersistHandle,
    position_interval: f64,
    saved_position: f64,
}

impl PersistObserver {
    pub fn new(handle: PersistHandle, position_interval: Duration) -> Self {
        Self {
            handle,
            position_interval: position_interval.as_secs_f64(),
            saved_position: 0.0,
        }
    }
}

impl QueueObserver for PersistObserver {
    fn on_transition(&mut self, transition: &Transition, state: &QueueState) {
        match transition {
            Transition::Replay | Transition::Restored => {
                self.saved_position = state.position_secs;
                return;
            }
            Transition::PositionChanged => {
                if (state.position_secs - self.saved_position).abs() < self.position_interval {
                    return;
                }
            }
            _ => {}
        }
        self.saved_position = state.position_secs;
        self.handle.schedule_persist(state.clone());
    }
}
