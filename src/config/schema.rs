use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::visualizer::RendererKind;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/encore/config.toml` or `~/.config/encore/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `ENCORE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub ui: UiSettings,
    pub controls: ControlsSettings,
    pub playback: PlaybackSettings,
    pub queue: QueueSettings,
    pub persistence: PersistenceSettings,
    pub visualizer: VisualizerSettings,
    pub library: LibrarySettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Crossfade duration when switching tracks (milliseconds).
    /// Set to 0 to disable crossfade.
    pub crossfade_ms: u64,
    /// Number of steps used to fade volumes (higher = smoother, more CPU).
    pub crossfade_steps: u64,
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            crossfade_ms: 250,
            crossfade_steps: 10,
            quit_fade_out_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,

    /// Which track fields to show in the status "Song:" line, and in what order.
    ///
    /// Example: ["artist", "title", "album"]
    pub now_playing_track_fields: Vec<TrackDisplayField>,

    /// Separator used to join `now_playing_track_fields`.
    pub now_playing_track_separator: String,

    /// Which time fields to show for the status line, and in what order.
    ///
    /// Example: ["elapsed", "total", "remaining"]
    pub now_playing_time_fields: Vec<TimeField>,

    /// Separator used to join `now_playing_time_fields`.
    pub now_playing_time_separator: String,

    /// Height of the visualizer panel in terminal rows.
    pub visualizer_rows: u16,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ encore ~ ".to_string(),
            now_playing_track_fields: vec![TrackDisplayField::Display],
            now_playing_track_separator: " - ".to_string(),
            now_playing_time_fields: vec![TimeField::Elapsed, TimeField::Total, TimeField::Remaining],
            now_playing_time_separator: " / ".to_string(),
            visualizer_rows: 12,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self { scrub_seconds: 5 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Whether shuffle starts enabled (only applies when no session is restored).
    pub shuffle: bool,
    /// Default repeat mode (only applies when no session is restored).
    pub repeat_mode: RepeatModeSetting,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            shuffle: false,
            repeat_mode: RepeatModeSetting::None,
        }
    }
}

#[derive(Debug, Copy, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatModeSetting {
    #[serde(alias = "off", alias = "no-loop", alias = "no_loop")]
    None,
    #[serde(alias = "loop-all", alias = "loop_all", alias = "repeat-all")]
    All,
    #[serde(
        alias = "loop-one",
        alias = "loop_one",
        alias = "repeat-one",
        alias = "single"
    )]
    One,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueSettings {
    /// Maximum number of pending entries; larger enqueues are rejected.
    pub max_pending: usize,
    /// History entries kept before the oldest are dropped.
    pub max_history: usize,
    pub auto_queue: AutoQueueSettings,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_pending: 500,
            max_history: 200,
            auto_queue: AutoQueueSettings::default(),
        }
    }
}

/// Top up the pending queue from the library when it runs low.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AutoQueueSettings {
    pub enabled: bool,
    /// Refill once `pending` holds fewer entries than this.
    pub threshold: usize,
    /// How many tracks a refill adds.
    pub count: usize,
}

impl Default for AutoQueueSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 2,
            count: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PersistenceSettings {
    /// Save and restore the queue across runs.
    pub enabled: bool,
    /// Quiet period before a queue snapshot is written (milliseconds).
    pub debounce_ms: u64,
    /// Directory holding saved state. Defaults to `$XDG_STATE_HOME/encore`.
    pub directory: Option<PathBuf>,
    /// Storage key the queue snapshot is written under.
    pub key: String,
    /// Playback progress (seconds) that triggers another snapshot.
    pub position_interval_secs: u64,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 500,
            directory: None,
            key: "queue".to_string(),
            position_interval_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VisualizerSettings {
    /// Whether the visualizer panel starts visible.
    pub enabled: bool,
    pub renderer: RendererKind,
    /// Number of bars/elements drawn per frame.
    pub elements: usize,
    /// Target frames per second.
    pub fps: u32,
    /// FFT window length; must be a power of two.
    pub fft_size: usize,
    pub min_db: f32,
    pub max_db: f32,
    /// Temporal smoothing of FFT magnitudes (0.0 ..= 1.0).
    pub smoothing: f32,
}

impl Default for VisualizerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            renderer: RendererKind::Bars,
            elements: 64,
            fps: 60,
            fft_size: 2048,
            min_db: -100.0,
            max_db: -30.0,
            smoothing: 0.8,
        }
    }
}

#[derive(Debug, Copy, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeField {
    Elapsed,
    Total,
    Remaining,
}

#[derive(Debug, Copy, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    /// Artist and title, the default rendering.
    Display,
    Title,
    Artist,
    Album,
    Filename,
    Path,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,

    /// Which fields to use to build `Track.display` and its ordering.
    ///
    /// Example: ["artist", "title"] -> "Artist - Title"
    pub display_fields: Vec<TrackDisplayField>,
    /// Separator used to join `display_fields`.
    pub display_separator: String,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
            display_fields: vec![TrackDisplayField::Artist, TrackDisplayField::Title],
            display_separator: " - ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log directory. Defaults to `<state dir>/logs`.
    pub directory: Option<PathBuf>,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: None,
            filter: "encore=info,warn".to_string(),
        }
    }
}
