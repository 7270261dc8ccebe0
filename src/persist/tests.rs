use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::*;
use crate::library::Track;
use crate::queue::{QueueLimits, QueueObserver, QueueState, QueueStore, Transition};

fn t(name: &str) -> Track {
    Track::from_path(Path::new(&format!("/music/{name}.flac")))
}

fn sample_state() -> QueueState {
    let mut store = QueueStore::with_seed(
        QueueLimits {
            max_pending: 20,
            max_history: 20,
        },
        1,
    );
    store.load_track(t("one"));
    store.enqueue([t("two"), t("three")]).unwrap();
    store.advance();
    store.cycle_repeat_mode();
    store.record_position(42.5);
    store.state().clone()
}

/// In-memory store that records every write.
#[derive(Default)]
struct MemoryStore {
    data: Mutex<HashMap<String, Vec<u8>>>,
    writes: Mutex<Vec<Vec<u8>>>,
}

impl MemoryStore {
    fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    fn last_write(&self) -> Option<Vec<u8>> {
        self.writes.lock().unwrap().last().cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.data.lock().unwrap().insert(key.to_string(), bytes.to_vec());
        self.writes.lock().unwrap().push(bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.data.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Memory-backed store whose operations can be made to fail one by one.
#[derive(Default)]
struct FailingStore {
    inner: MemoryStore,
    fail_get: AtomicBool,
    fail_set: AtomicBool,
    fail_remove: AtomicBool,
    set_attempts: AtomicUsize,
}

fn unavailable(key: &str) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        source: io::Error::other("device unavailable"),
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(unavailable(key));
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.set_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(unavailable(key));
        }
        self.inner.set(key, bytes)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(unavailable(key));
        }
        self.inner.remove(key)
    }
}

fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(2) {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn debounce_coalesces_a_burst_into_one_value() {
    let t0 = Instant::now();
    let ms = Duration::from_millis;
    let mut d = Debounce::new(ms(500));

    d.schedule("first", t0);
    d.schedule("second", t0 + ms(50));
    d.schedule("third", t0 + ms(80));

    assert_eq!(d.poll(t0 + ms(500)), None);
    assert_eq!(d.poll(t0 + ms(579)), None);
    assert_eq!(d.deadline(), Some(t0 + ms(580)));
    assert_eq!(d.poll(t0 + ms(580)), Some("third"));
    assert_eq!(d.poll(t0 + ms(2000)), None);
    assert!(!d.is_pending());
}

#[test]
fn debounce_cancel_discards_pending_value() {
    let t0 = Instant::now();
    let mut d = Debounce::new(Duration::from_millis(100));
    assert!(!d.cancel());

    d.schedule(1, t0);
    assert!(d.cancel());
    assert_eq!(d.poll(t0 + Duration::from_secs(1)), None);
}

#[test]
fn file_store_round_trips_and_removes() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("nested"));

    assert!(store.get("queue").unwrap().is_none());
    store.set("queue", b"{}").unwrap();
    assert_eq!(store.get("queue").unwrap().as_deref(), Some(&b"{}"[..]));
    assert!(dir.path().join("nested/queue.json").exists());
    assert!(!dir.path().join("nested/queue.json.tmp").exists());

    store.remove("queue").unwrap();
    assert!(store.get("queue").unwrap().is_none());
    // Removing again is not an error.
    store.remove("queue").unwrap();
}

#[test]
fn file_store_rejects_path_like_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    for key in ["", "../escape", "a/b", ".hidden"] {
        assert!(
            matches!(store.get(key), Err(StorageError::InvalidKey(_))),
            "key {key:?} accepted"
        );
    }
}

#[test]
fn snapshot_carries_version_and_full_state() {
    let state = sample_state();
    let bytes = snapshot::encode(&state).unwrap();

    let raw: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(raw["version"], SNAPSHOT_VERSION);
    assert_eq!(raw["state"]["repeat_mode"], "all");

    assert_eq!(snapshot::decode(&bytes).unwrap(), state);
}

#[test]
fn snapshot_rejects_unknown_version_and_garbage() {
    let future = br#"{"version": 99, "state": {}}"#;
    assert!(matches!(snapshot::decode(future), Err(PersistError::Corrupt(_))));
    assert!(matches!(snapshot::decode(b"not json"), Err(PersistError::Corrupt(_))));
}

#[test]
fn persister_writes_once_for_a_burst() {
    let storage = Arc::new(MemoryStore::default());
    let persister = Persister::spawn(storage.clone(), "queue", Duration::from_millis(40));

    let mut state = sample_state();
    for pos in [1.0, 2.0, 3.0] {
        state.position_secs = pos;
        persister.schedule_persist(state.clone());
    }

    assert!(wait_for(|| storage.write_count() > 0));
    thread::sleep(Duration::from_millis(150));
    assert_eq!(storage.write_count(), 1);

    let written = snapshot::decode(&storage.last_write().unwrap()).unwrap();
    assert_eq!(written.position_secs, 3.0);

    match persister.load_persisted() {
        LoadOutcome::Found(loaded) => assert_eq!(loaded, state),
        other => panic!("expected a stored queue, got {other:?}"),
    }
    persister.shutdown();
}

#[test]
fn shutdown_cancels_a_pending_write() {
    let storage = Arc::new(MemoryStore::default());
    let persister = Persister::spawn(storage.clone(), "queue", Duration::from_millis(300));

    persister.schedule_persist(sample_state());
    persister.shutdown();

    thread::sleep(Duration::from_millis(400));
    assert_eq!(storage.write_count(), 0);
}

#[test]
fn dropping_the_persister_cancels_too() {
    let storage = Arc::new(MemoryStore::default());
    {
        let persister = Persister::spawn(storage.clone(), "queue", Duration::from_millis(300));
        persister.schedule_persist(sample_state());
    }
    thread::sleep(Duration::from_millis(400));
    assert_eq!(storage.write_count(), 0);
}

#[test]
fn clear_removes_stored_state_and_pending_write() {
    let storage = Arc::new(MemoryStore::default());
    storage
        .set("queue", &snapshot::encode(&sample_state()).unwrap())
        .unwrap();
    let persister = Persister::spawn(storage.clone(), "queue", Duration::from_millis(100));

    persister.schedule_persist(sample_state());
    persister.clear_persisted().unwrap();
    thread::sleep(Duration::from_millis(200));

    // Only the seeded write above.
    assert_eq!(storage.write_count(), 1);
    assert!(matches!(persister.load_persisted(), LoadOutcome::NotFound));
}

#[test]
fn load_reports_corrupt_data_as_failure() {
    let storage = Arc::new(MemoryStore::default());
    storage.set("queue", b"{broken").unwrap();
    let persister = Persister::spawn(storage, "queue", Duration::from_millis(10));

    let outcome = persister.load_persisted();
    assert!(matches!(outcome, LoadOutcome::Failed(PersistError::Corrupt(_))));
    assert!(outcome.into_state().is_none());
}

#[test]
fn observer_skips_replay_and_small_position_moves() {
    let storage = Arc::new(MemoryStore::default());
    let persister = Persister::spawn(storage.clone(), "queue", Duration::from_millis(10));
    let mut observer = PersistObserver::new(persister.handle(), Duration::from_secs(5));
    let mut state = sample_state();

    observer.on_transition(&Transition::Replay, &state);
    state.position_secs = 44.0;
    observer.on_transition(&Transition::PositionChanged, &state);
    thread::sleep(Duration::from_millis(100));
    assert_eq!(storage.write_count(), 0);

    state.position_secs = 48.0;
    observer.on_transition(&Transition::PositionChanged, &state);
    assert!(wait_for(|| storage.write_count() == 1));

    observer.on_transition(&Transition::Enqueued(1), &state);
    assert!(wait_for(|| storage.write_count() == 2));
    persister.shutdown();
}

#[test]
fn read_failure_is_reported_and_treated_as_nothing_saved() {
    let storage = Arc::new(FailingStore::default());
    storage
        .inner
        .set("queue", &snapshot::encode(&sample_state()).unwrap())
        .unwrap();
    storage.fail_get.store(true, Ordering::SeqCst);
    let persister = Persister::spawn(storage.clone(), "queue", Duration::from_millis(10));

    let outcome = persister.load_persisted();
    assert!(matches!(outcome, LoadOutcome::Failed(PersistError::Storage(_))));
    assert!(outcome.into_state().is_none());

    storage.fail_get.store(false, Ordering::SeqCst);
    assert!(matches!(persister.load_persisted(), LoadOutcome::Found(_)));
}

#[test]
fn failed_write_does_not_stop_later_writes() {
    let storage = Arc::new(FailingStore::default());
    storage.fail_set.store(true, Ordering::SeqCst);
    let persister = Persister::spawn(storage.clone(), "queue", Duration::from_millis(20));

    let mut state = sample_state();
    state.position_secs = 1.0;
    persister.schedule_persist(state.clone());
    assert!(wait_for(|| storage.set_attempts.load(Ordering::SeqCst) == 1));
    assert_eq!(storage.inner.write_count(), 0);

    storage.fail_set.store(false, Ordering::SeqCst);
    state.position_secs = 7.0;
    persister.schedule_persist(state.clone());
    assert!(wait_for(|| storage.inner.write_count() == 1));

    match persister.load_persisted() {
        LoadOutcome::Found(loaded) => assert_eq!(loaded.position_secs, 7.0),
        other => panic!("expected the second snapshot, got {other:?}"),
    }
    persister.shutdown();
}

#[test]
fn clear_reports_a_failed_remove() {
    let storage = Arc::new(FailingStore::default());
    storage
        .inner
        .set("queue", &snapshot::encode(&sample_state()).unwrap())
        .unwrap();
    storage.fail_remove.store(true, Ordering::SeqCst);
    let persister = Persister::spawn(storage.clone(), "queue", Duration::from_millis(10));

    assert!(matches!(persister.clear_persisted(), Err(PersistError::Storage(_))));
    assert!(matches!(persister.load_persisted(), LoadOutcome::Found(_)));

    storage.fail_remove.store(false, Ordering::SeqCst);
    persister.clear_persisted().unwrap();
    persister.clear_persisted().unwrap();
    assert!(matches!(persister.load_persisted(), LoadOutcome::NotFound));
}
