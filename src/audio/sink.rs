//! Utilities for creating `rodio` sinks from `Track` values.
//!
//! The helper here encapsulates opening/decoding a file and preparing a
//! paused `Sink` at the requested start position, with the spectrum tap
//! spliced in front of the mixer.

use std::fs::File;
use std::io::BufReader;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use crate::library::Track;

use super::tap::SampleTap;
use super::types::AudioError;

/// Create a paused `Sink` for `track` that starts playback at `start_at`.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    track: &Track,
    start_at: Duration,
    tap: &SampleTap,
) -> Result<Sink, AudioError> {
    let file = File::open(&track.source).map_err(|source| AudioError::Open {
        path: track.source.clone(),
        source,
    })?;

    let source = Decoder::new(BufReader::new(file))
        .map_err(|source| AudioError::Decode {
            path: track.source.clone(),
            source,
        })?
        // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
        .skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.append(tap.wrap(source));
    sink.pause();
    Ok(sink)
}
