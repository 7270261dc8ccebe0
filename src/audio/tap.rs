//! A pass-through `Source` that copies the decoded signal into a shared
//! buffer for spectrum analysis.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rodio::source::SeekError;
use rodio::{ChannelCount, Sample, SampleRate, Source};

/// Mono frames collected before taking the lock.
const FLUSH_LEN: usize = 512;

#[derive(Debug, Default)]
struct TapBuffer {
    frames: VecDeque<f32>,
    capacity: usize,
    /// Bumped on every flush or reset so readers can tell new data apart.
    generation: u64,
}

/// Shared mono copy of whatever the audio thread is playing.
#[derive(Debug, Clone)]
pub struct SampleTap {
    shared: Arc<Mutex<TapBuffer>>,
}

impl SampleTap {
    /// Keep the most recent `capacity` mono frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Mutex::new(TapBuffer {
                frames: VecDeque::with_capacity(capacity),
                capacity,
                generation: 0,
            })),
        }
    }

    pub fn wrap<S: Source>(&self, inner: S) -> SpectrumTap<S> {
        SpectrumTap {
            inner,
            tap: self.clone(),
            pending: Vec::with_capacity(FLUSH_LEN),
            frame_sum: 0.0,
            channel: 0,
        }
    }

    fn push(&self, chunk: &[f32]) {
        let Ok(mut buf) = self.shared.lock() else {
            return;
        };
        buf.frames.extend(chunk.iter().copied());
        let excess = buf.frames.len().saturating_sub(buf.capacity);
        buf.frames.drain(..excess);
        buf.generation += 1;
    }

    /// Drop buffered audio, e.g. when playback stops.
    pub fn reset(&self) {
        if let Ok(mut buf) = self.shared.lock() {
            buf.frames.clear();
            buf.generation += 1;
        }
    }

    /// Copy the newest `len` frames into `out`, zero-padded at the front.
    /// Returns the buffer generation the copy reflects.
    pub fn latest(&self, out: &mut Vec<f32>, len: usize) -> Option<u64> {
        let buf = self.shared.lock().ok()?;
        out.clear();
        let available = buf.frames.len().min(len);
        out.resize(len - available, 0.0);
        out.extend(buf.frames.iter().skip(buf.frames.len() - available).copied());
        Some(buf.generation)
    }
}

/// Wraps a `Source`, forwarding every sample unchanged while feeding a
/// downmixed copy to a [`SampleTap`].
pub struct SpectrumTap<S> {
    inner: S,
    tap: SampleTap,
    pending: Vec<f32>,
    frame_sum: f32,
    channel: usize,
}

impl<S: Source> Iterator for SpectrumTap<S> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        let sample = self.inner.next()?;
        let channels = usize::from(self.inner.channels().max(1));

        self.frame_sum += sample;
        self.channel += 1;
        if self.channel >= channels {
            self.pending.push(self.frame_sum / channels as f32);
            self.frame_sum = 0.0;
            self.channel = 0;
            if self.pending.len() >= FLUSH_LEN {
                self.tap.push(&self.pending);
                self.pending.clear();
            }
        }
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S: Source> Source for SpectrumTap<S> {
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> ChannelCount {
        self.inner.channels()
    }

    fn sample_rate(&self) -> SampleRate {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        self.pending.clear();
        self.frame_sum = 0.0;
        self.channel = 0;
        self.inner.try_seek(pos)
    }
}
