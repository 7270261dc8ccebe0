//! Playback on a dedicated `rodio` thread plus the spectrum tap that feeds
//! the visualizer.

mod player;
mod sink;
mod spectrum;
mod tap;
mod thread;
mod types;

pub use player::AudioPlayer;
pub use spectrum::{SpectrumAnalyzer, TapSpectrum};
pub use tap::SampleTap;
pub use types::{AudioCmd, AudioEvent, PlaybackHandle, PlaybackInfo};
