//! Audio-related small types and handles.
//!
//! Commands flow from the runtime to the audio thread; events flow back.
//! The audio thread plays exactly one track at a time and never decides
//! what comes next: it reports `TrackEnded` and waits to be told.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

use crate::library::Track;

#[derive(Debug)]
pub enum AudioCmd {
    /// Replace the playing track, crossfading if something is audible.
    Load {
        track: Track,
        start_at: Duration,
        /// Start paused when false (used when resuming a saved session).
        autoplay: bool,
    },
    /// Restart the loaded track from the beginning.
    Replay,
    /// Stop playback and forget the loaded track.
    Stop,
    /// Toggle pause/resume.
    TogglePause,
    /// Seek by the specified number of seconds (positive or negative).
    SeekBy(i32),
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    /// The loaded track played to its end.
    TrackEnded { track_id: String },
    /// A track could not be opened or decoded.
    LoadFailed { track_id: String, reason: String },
    /// No output device; the thread has exited.
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },
}

/// Runtime playback information shared with the UI.
#[derive(Debug, Clone, Default)]
pub struct PlaybackInfo {
    /// Id of the loaded track, if any.
    pub track_id: Option<String>,
    /// Elapsed playback time for the loaded track.
    pub elapsed: Duration,
    /// Whether playback is currently audible.
    pub playing: bool,
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;
