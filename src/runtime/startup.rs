use std::sync::Arc;
use std::time::Duration;

use crate::config;
use crate::persist::{FileStore, Persister};
use crate::queue::{QueueStore, RepeatMode};

/// Start the snapshot writer when persistence is enabled and a state
/// directory can be resolved.
pub fn open_persister(settings: &config::Settings) -> Option<Persister> {
    if !settings.persistence.enabled {
        tracing::info!("queue persistence disabled");
        return None;
    }
    let Some(dir) = settings.state_dir() else {
        tracing::warn!("no state directory (HOME unset?); queue will not be saved");
        return None;
    };
    tracing::debug!(dir = %dir.display(), "queue snapshots stored here");
    Some(Persister::spawn(
        Arc::new(FileStore::new(dir)),
        settings.persistence.key.clone(),
        Duration::from_millis(settings.persistence.debounce_ms),
    ))
}

/// Rehydrate the saved queue. Returns true when a session was restored.
/// A failed load is treated the same as nothing saved.
pub fn restore_session(store: &mut QueueStore, persister: Option<&Persister>) -> bool {
    let Some(persister) = persister else {
        return false;
    };
    let Some(state) = persister.load_persisted().into_state() else {
        tracing::debug!("no saved queue");
        return false;
    };
    tracing::info!(
        pending = state.pending.len(),
        history = state.history.len(),
        "restoring saved queue"
    );
    store.restore(state);
    true
}

/// Bring shuffle and repeat mode in line with the configured defaults.
pub fn apply_playback_defaults(store: &mut QueueStore, settings: &config::Settings) {
    if store.state().shuffled != settings.playback.shuffle {
        store.toggle_shuffle();
    }
    let wanted = RepeatMode::from(settings.playback.repeat_mode);
    // Three modes; the cycle reaches any of them within two steps.
    for _ in 0..2 {
        if store.state().repeat_mode == wanted {
            break;
        }
        store.cycle_repeat_mode();
    }
}
