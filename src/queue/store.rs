use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::config::QueueSettings;
use crate::library::Track;

use super::error::QueueError;
use super::state::{Advance, QueueEntry, QueueObserver, QueueState, RepeatMode, Transition};

/// Size limits enforced by the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QueueLimits {
    pub max_pending: usize,
    pub max_history: usize,
}

impl From<&QueueSettings> for QueueLimits {
    fn from(settings: &QueueSettings) -> Self {
        Self {
            max_pending: settings.max_pending,
            max_history: settings.max_history,
        }
    }
}

/// Owner of the playback queue. Its methods are the only way the queue
/// changes; observers hear about each committed transition afterwards.
pub struct QueueStore {
    state: QueueState,
    limits: QueueLimits,
    next_uid: u64,
    rng: StdRng,
    observers: Vec<Box<dyn QueueObserver>>,
}

impl QueueStore {
    pub fn new(limits: QueueLimits) -> Self {
        Self::with_seed(limits, rand::random())
    }

    /// Store with a fixed shuffle seed.
    pub fn with_seed(limits: QueueLimits, seed: u64) -> Self {
        Self {
            state: QueueState::default(),
            limits,
            next_uid: 1,
            rng: StdRng::seed_from_u64(seed),
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn QueueObserver>) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> &QueueState {
        &self.state
    }

    pub fn limits(&self) -> QueueLimits {
        self.limits
    }

    /// Replace the state with a rehydrated one, repairing anything that
    /// breaks the store's invariants.
    pub fn restore(&mut self, mut state: QueueState) {
        let mut seen: HashSet<u64> = HashSet::new();
        if let Some(current) = &state.current {
            seen.insert(current.uid);
        }
        state.pending.retain(|e| seen.insert(e.uid));
        state.history.retain(|e| seen.insert(e.uid));

        if state.pending.len() > self.limits.max_pending {
            tracing::warn!(
                stored = state.pending.len(),
                max = self.limits.max_pending,
                "restored queue exceeds the pending limit; dropping the tail"
            );
            state.pending.truncate(self.limits.max_pending);
        }
        let excess = state.history.len().saturating_sub(self.limits.max_history);
        state.history.drain(..excess);

        if state.current.is_none() || !state.position_secs.is_finite() || state.position_secs < 0.0 {
            state.position_secs = 0.0;
        }

        self.next_uid = state.max_uid().map_or(1, |uid| uid + 1);
        self.state = state;
        self.publish(Transition::Restored);
    }

    /// Make `track` the current entry. The previous current entry moves to
    /// history.
    pub fn load_track(&mut self, track: Track) {
        let entry = self.mint(track);
        if let Some(previous) = self.state.current.replace(entry) {
            self.push_history(previous);
        }
        self.state.position_secs = 0.0;
        self.publish(Transition::Loaded);
    }

    /// Move to the next entry on track end or an explicit skip.
    pub fn advance(&mut self) -> Advance {
        if self.state.repeat_mode == RepeatMode::One {
            if let Some(current) = self.state.current.clone() {
                self.publish(Transition::Replay);
                return Advance::Replay(current);
            }
        }

        if self.state.pending.is_empty()
            && self.state.repeat_mode == RepeatMode::All
            && !self.state.history.is_empty()
        {
            // Only the most recent `max_pending` entries fit; older ones
            // stay in history for the next round.
            let keep = self.state.history.len().saturating_sub(self.limits.max_pending);
            let mut recent = self.state.history.split_off(keep);
            recent.reverse();
            self.state.pending = recent.into();
            tracing::debug!(
                refilled = self.state.pending.len(),
                left_in_history = self.state.history.len(),
                "repeat-all refill from history"
            );
        }

        match self.state.pending.pop_front() {
            Some(next) => {
                if let Some(previous) = self.state.current.replace(next.clone()) {
                    self.push_history(previous);
                }
                self.state.position_secs = 0.0;
                self.publish(Transition::Advanced);
                Advance::Next(next)
            }
            None => {
                if let Some(previous) = self.state.current.take() {
                    self.push_history(previous);
                }
                self.state.position_secs = 0.0;
                self.publish(Transition::Exhausted);
                Advance::Exhausted
            }
        }
    }

    /// Step back to the most recently played entry. Repeat mode is not
    /// consulted.
    pub fn retreat(&mut self) -> Option<QueueEntry> {
        if self.state.history.is_empty() {
            return None;
        }
        if self.state.current.is_some() && self.state.pending.len() >= self.limits.max_pending {
            tracing::warn!(
                max = self.limits.max_pending,
                "previous refused: the pending queue has no room for the current track"
            );
            return None;
        }

        let previous = self.state.history.pop()?;
        if let Some(current) = self.state.current.replace(previous.clone()) {
            self.state.pending.push_front(current);
        }
        self.state.position_secs = 0.0;
        self.publish(Transition::Retreated);
        Some(previous)
    }

    /// Append tracks to the tail of `pending`. All or nothing: when the
    /// result would exceed the limit nothing is added.
    pub fn enqueue<I>(&mut self, tracks: I) -> Result<usize, QueueError>
    where
        I: IntoIterator<Item = Track>,
    {
        let tracks: Vec<Track> = tracks.into_iter().collect();
        let len = self.state.pending.len();
        if len + tracks.len() > self.limits.max_pending {
            return Err(QueueError::Overflow {
                requested: tracks.len(),
                len,
                max: self.limits.max_pending,
            });
        }
        if tracks.is_empty() {
            return Ok(0);
        }

        let count = tracks.len();
        for track in tracks {
            let entry = self.mint(track);
            self.state.pending.push_back(entry);
        }
        self.publish(Transition::Enqueued(count));
        Ok(count)
    }

    pub fn dequeue(&mut self, index: usize) -> Result<QueueEntry, QueueError> {
        let len = self.state.pending.len();
        let removed = self
            .state
            .pending
            .remove(index)
            .ok_or(QueueError::OutOfRange { index, len })?;
        self.publish(Transition::Dequeued(index));
        Ok(removed)
    }

    /// Empty `pending`; `current` and `history` are kept. Returns how many
    /// entries were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.state.pending.len();
        self.state.pending.clear();
        self.publish(Transition::Cleared(dropped));
        dropped
    }

    /// Flip shuffle. Turning it on permutes `pending` uniformly at random;
    /// turning it off leaves the order as it is.
    pub fn toggle_shuffle(&mut self) -> bool {
        self.state.shuffled = !self.state.shuffled;
        if self.state.shuffled {
            self.state.pending.make_contiguous().shuffle(&mut self.rng);
        }
        let shuffled = self.state.shuffled;
        self.publish(Transition::ShuffleToggled(shuffled));
        shuffled
    }

    pub fn cycle_repeat_mode(&mut self) -> RepeatMode {
        let mode = self.state.repeat_mode.cycled();
        self.state.repeat_mode = mode;
        self.publish(Transition::RepeatModeChanged(mode));
        mode
    }

    /// Record playback progress of the current entry.
    pub fn record_position(&mut self, secs: f64) {
        if self.state.current.is_none() {
            return;
        }
        let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
        if (secs - self.state.position_secs).abs() < f64::EPSILON {
            return;
        }
        self.state.position_secs = secs;
        self.publish(Transition::PositionChanged);
    }

    /// True when `pending` holds fewer than `threshold` entries.
    pub fn needs_refill(&self, threshold: usize) -> bool {
        self.state.pending.len() < threshold
    }

    /// Room left in `pending`.
    pub fn remaining_capacity(&self) -> usize {
        self.limits.max_pending.saturating_sub(self.state.pending.len())
    }

    fn mint(&mut self, track: Track) -> QueueEntry {
        let uid = self.next_uid;
        self.next_uid += 1;
        QueueEntry { uid, track }
    }

    fn push_history(&mut self, entry: QueueEntry) {
        self.state.history.push(entry);
        let excess = self.state.history.len().saturating_sub(self.limits.max_history);
        if excess > 0 {
            self.state.history.drain(..excess);
        }
    }

    fn publish(&mut self, transition: Transition) {
        tracing::debug!(
            ?transition,
            pending = self.state.pending.len(),
            history = self.state.history.len(),
            current = self.state.current.as_ref().map(|e| e.track.title.as_str()),
            "queue transition"
        );
        for observer in &mut self.observers {
            observer.on_transition(&transition, &self.state);
        }
    }
}
