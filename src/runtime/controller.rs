//! Single owner of the queue store. Every playback decision goes through
//! here so that queue transitions and audio commands stay in step.

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::app::PlaybackState;
use crate::audio::{AudioCmd, AudioPlayer};
use crate::config::AutoQueueSettings;
use crate::library::Track;
use crate::queue::{Advance, QueueEntry, QueueError, QueueStore};

/// Where playback commands go.
pub trait Transport {
    fn dispatch(&self, cmd: AudioCmd);
}

impl Transport for AudioPlayer {
    fn dispatch(&self, cmd: AudioCmd) {
        if self.send(cmd).is_err() {
            tracing::warn!("audio thread is gone; command dropped");
        }
    }
}

pub struct Controller<T: Transport> {
    pub store: QueueStore,
    pub transport: T,
    playback: PlaybackState,
    auto_queue: AutoQueueSettings,
    rng: StdRng,
}

impl<T: Transport> Controller<T> {
    pub fn new(store: QueueStore, transport: T, auto_queue: AutoQueueSettings) -> Self {
        Self::with_seed(store, transport, auto_queue, rand::random())
    }

    pub fn with_seed(
        store: QueueStore,
        transport: T,
        auto_queue: AutoQueueSettings,
        seed: u64,
    ) -> Self {
        Self {
            store,
            transport,
            playback: PlaybackState::Stopped,
            auto_queue,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    /// Start `track` now; whatever was playing moves to history.
    pub fn play_track(&mut self, track: Track) {
        self.store.load_track(track.clone());
        self.start(track, Duration::ZERO);
    }

    /// Cue the restored current track, paused at its saved position.
    pub fn cue_restored(&mut self) {
        let state = self.store.state();
        let Some(track) = state.current_track().cloned() else {
            return;
        };
        let start_at = Duration::from_secs_f64(state.position_secs.max(0.0));
        tracing::info!(track = %track.title, ?start_at, "resuming saved session");
        self.transport.dispatch(AudioCmd::Load {
            track,
            start_at,
            autoplay: false,
        });
        self.playback = PlaybackState::Paused;
    }

    /// Explicit skip. Same policy as a track ending on its own.
    pub fn next(&mut self, library: &[Track]) {
        self.advance(library);
    }

    /// The audio thread finished `track_id`. Ignored unless that is still
    /// the current track, so an end queued behind a skip cannot advance twice.
    pub fn track_ended(&mut self, track_id: &str, library: &[Track]) {
        if !self.is_current(Some(track_id)) {
            tracing::debug!(track_id, "stale track end ignored");
            return;
        }
        self.advance(library);
    }

    fn advance(&mut self, library: &[Track]) {
        let outcome = match self.store.advance() {
            Advance::Exhausted if self.refill(library) > 0 => self.store.advance(),
            outcome => outcome,
        };
        match outcome {
            Advance::Replay(_) => {
                self.transport.dispatch(AudioCmd::Replay);
                self.playback = PlaybackState::Playing;
            }
            Advance::Next(entry) => self.start_entry(&entry),
            Advance::Exhausted => {
                tracing::info!("queue exhausted");
                self.transport.dispatch(AudioCmd::Stop);
                self.playback = PlaybackState::Stopped;
            }
        }
        self.refill(library);
    }

    /// Step back through history; without history the current track
    /// restarts.
    pub fn previous(&mut self) {
        match self.store.retreat() {
            Some(entry) => self.start_entry(&entry),
            None => {
                if self.store.state().current.is_some() {
                    self.transport.dispatch(AudioCmd::Replay);
                    self.playback = PlaybackState::Playing;
                }
            }
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.playback {
            PlaybackState::Stopped => {
                let state = self.store.state();
                if let Some(track) = state.current_track().cloned() {
                    let start_at = Duration::from_secs_f64(state.position_secs.max(0.0));
                    self.start(track, start_at);
                }
            }
            PlaybackState::Playing => {
                self.transport.dispatch(AudioCmd::TogglePause);
                self.playback = PlaybackState::Paused;
            }
            PlaybackState::Paused => {
                self.transport.dispatch(AudioCmd::TogglePause);
                self.playback = PlaybackState::Playing;
            }
        }
    }

    pub fn play(&mut self) {
        if self.playback != PlaybackState::Playing {
            self.toggle_pause();
        }
    }

    pub fn pause(&mut self) {
        if self.playback == PlaybackState::Playing {
            self.toggle_pause();
        }
    }

    /// Stop the audio. The queue keeps its current entry and position.
    pub fn stop(&mut self) {
        self.transport.dispatch(AudioCmd::Stop);
        self.playback = PlaybackState::Stopped;
    }

    pub fn seek_by(&mut self, secs: i32) {
        if self.playback != PlaybackState::Stopped {
            self.transport.dispatch(AudioCmd::SeekBy(secs));
        }
    }

    /// The audio thread could not play `track_id` and has stopped. Returns
    /// false when the failure concerns a track that is no longer current.
    pub fn load_failed(&mut self, track_id: &str) -> bool {
        if !self.is_current(Some(track_id)) {
            return false;
        }
        self.playback = PlaybackState::Stopped;
        true
    }

    /// The output device is gone; nothing can play.
    pub fn output_lost(&mut self) {
        self.playback = PlaybackState::Stopped;
    }

    pub fn enqueue(&mut self, tracks: Vec<Track>) -> Result<usize, QueueError> {
        let count = tracks.len();
        let result = self.store.enqueue(tracks);
        match &result {
            Ok(added) => tracing::debug!(added, "tracks queued"),
            Err(e) => tracing::warn!(requested = count, error = %e, "enqueue refused"),
        }
        result
    }

    /// Mirror the audio clock into the queue, in whole seconds.
    pub fn sync_position(&mut self, track_id: Option<&str>, elapsed: Duration) {
        if self.is_current(track_id) {
            self.store.record_position(elapsed.as_secs() as f64);
        }
    }

    fn is_current(&self, track_id: Option<&str>) -> bool {
        self.store
            .state()
            .current_track()
            .is_some_and(|t| Some(t.id.as_str()) == track_id)
    }

    /// Top up `pending` from `library` when auto-queue is on and the queue
    /// runs low. Returns how many tracks were added.
    pub fn refill(&mut self, library: &[Track]) -> usize {
        if !self.auto_queue.enabled || !self.store.needs_refill(self.auto_queue.threshold) {
            return 0;
        }
        let state = self.store.state();
        let mut candidates: Vec<Track> = library
            .iter()
            .filter(|t| !state.is_pending(t) && state.current_track() != Some(*t))
            .cloned()
            .collect();
        candidates.shuffle(&mut self.rng);
        candidates.truncate(self.auto_queue.count.min(self.store.remaining_capacity()));
        if candidates.is_empty() {
            return 0;
        }

        match self.store.enqueue(candidates) {
            Ok(added) => {
                tracing::info!(added, "auto-queue refilled the queue");
                added
            }
            Err(e) => {
                tracing::warn!(error = %e, "auto-queue refill refused");
                0
            }
        }
    }

    fn start_entry(&mut self, entry: &QueueEntry) {
        self.start(entry.track.clone(), Duration::ZERO);
    }

    fn start(&mut self, track: Track, start_at: Duration) {
        self.transport.dispatch(AudioCmd::Load {
            track,
            start_at,
            autoplay: true,
        });
        self.playback = PlaybackState::Playing;
    }
}
