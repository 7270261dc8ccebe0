//! Queue state types shared by the store, its observers and persistence.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::RepeatModeSetting;
use crate::library::Track;

/// Playback-continuation policy applied when a track ends.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatMode {
    /// Stop once the queue runs dry.
    #[default]
    None,
    /// Cycle history back into the queue.
    All,
    /// Replay the current track indefinitely.
    One,
}

impl RepeatMode {
    /// `None -> All -> One -> None`.
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::None => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RepeatMode::None => "Off",
            RepeatMode::All => "All",
            RepeatMode::One => "One",
        }
    }
}

impl From<RepeatModeSetting> for RepeatMode {
    fn from(setting: RepeatModeSetting) -> Self {
        match setting {
            RepeatModeSetting::None => RepeatMode::None,
            RepeatModeSetting::All => RepeatMode::All,
            RepeatModeSetting::One => RepeatMode::One,
        }
    }
}

/// One slot in `current`, `pending` or `history`.
///
/// The same track may occupy several slots; `uid` tells the slots apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub uid: u64,
    pub track: Track,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueState {
    pub current: Option<QueueEntry>,
    /// Play order; the head plays next.
    pub pending: VecDeque<QueueEntry>,
    /// Oldest first; the last element is the most recently played.
    pub history: Vec<QueueEntry>,
    pub shuffled: bool,
    pub repeat_mode: RepeatMode,
    /// Position inside `current`, in seconds.
    pub position_secs: f64,
}

impl QueueState {
    pub fn current_track(&self) -> Option<&Track> {
        self.current.as_ref().map(|e| &e.track)
    }

    /// Every entry across the three collections.
    pub fn entries(&self) -> impl Iterator<Item = &QueueEntry> {
        self.current
            .iter()
            .chain(self.pending.iter())
            .chain(self.history.iter())
    }

    pub fn max_uid(&self) -> Option<u64> {
        self.entries().map(|e| e.uid).max()
    }

    pub fn is_pending(&self, track: &Track) -> bool {
        self.pending.iter().any(|e| &e.track == track)
    }
}

/// What a committed transition did. Published to every [`QueueObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Loaded,
    Advanced,
    /// Repeat-one kept the current track; nothing moved.
    Replay,
    Exhausted,
    Retreated,
    Enqueued(usize),
    Dequeued(usize),
    Cleared(usize),
    ShuffleToggled(bool),
    RepeatModeChanged(RepeatMode),
    PositionChanged,
    /// A persisted state was rehydrated.
    Restored,
}

impl Transition {
    /// True when the now-playing entry may have changed.
    pub fn changes_current(&self) -> bool {
        matches!(
            self,
            Transition::Loaded
                | Transition::Advanced
                | Transition::Exhausted
                | Transition::Retreated
                | Transition::Restored
        )
    }
}

/// Subscriber notified after each committed queue transition.
pub trait QueueObserver {
    fn on_transition(&mut self, transition: &Transition, state: &QueueState);
}

/// Outcome of [`QueueStore::advance`](super::QueueStore::advance).
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Repeat-one: play the current entry again.
    Replay(QueueEntry),
    /// A new current entry.
    Next(QueueEntry),
    /// Nothing left to play; `current` is now empty.
    Exhausted,
}
