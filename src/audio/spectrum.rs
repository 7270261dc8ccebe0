//! FFT magnitude analysis producing byte-scaled frequency data.
//!
//! The mapping follows the usual analyser-node convention: Blackman window,
//! magnitudes normalised by the FFT size, exponential smoothing over time,
//! then decibels mapped linearly from `min_db..max_db` onto `0..=255`.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex};

use crate::config::VisualizerSettings;
use crate::render_loop::SampleSource;

use super::tap::SampleTap;

pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    size: usize,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    bytes: Vec<u8>,
    min_db: f32,
    max_db: f32,
    smoothing: f32,
}

fn blackman(size: usize) -> Vec<f32> {
    const ALPHA: f32 = 0.16;
    let a0 = (1.0 - ALPHA) / 2.0;
    let a1 = 0.5;
    let a2 = ALPHA / 2.0;
    (0..size)
        .map(|n| {
            let x = n as f32 / size as f32;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}

impl SpectrumAnalyzer {
    pub fn new(size: usize, min_db: f32, max_db: f32, smoothing: f32) -> Self {
        let size = size.max(2);
        let fft = FftPlanner::new().plan_fft_forward(size);
        Self {
            fft,
            size,
            window: blackman(size),
            buffer: vec![Complex::new(0.0, 0.0); size],
            smoothed: vec![0.0; size / 2],
            bytes: vec![0; size / 2],
            min_db,
            max_db,
            smoothing: smoothing.clamp(0.0, 1.0),
        }
    }

    pub fn from_settings(settings: &VisualizerSettings) -> Self {
        Self::new(
            settings.fft_size,
            settings.min_db,
            settings.max_db,
            settings.smoothing,
        )
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Analyse the newest `size` samples (older ones are ignored, missing
    /// ones count as silence). Returns `size / 2` bins.
    pub fn analyze(&mut self, samples: &[f32]) -> &[u8] {
        let tail = &samples[samples.len().saturating_sub(self.size)..];
        let pad = self.size - tail.len();
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let s = if i < pad { 0.0 } else { tail[i - pad] };
            *slot = Complex::new(s * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buffer);

        let scale = 255.0 / (self.max_db - self.min_db);
        let norm = 1.0 / self.size as f32;
        for (k, byte) in self.bytes.iter_mut().enumerate() {
            let magnitude = self.buffer[k].norm() * norm;
            let smoothed = self.smoothing * self.smoothed[k] + (1.0 - self.smoothing) * magnitude;
            self.smoothed[k] = smoothed;

            *byte = if smoothed > 0.0 {
                let db = 20.0 * smoothed.log10();
                ((db - self.min_db) * scale).clamp(0.0, 255.0) as u8
            } else {
                0
            };
        }
        &self.bytes
    }
}

/// [`SampleSource`] backed by the playback tap.
pub struct TapSpectrum {
    tap: SampleTap,
    analyzer: SpectrumAnalyzer,
    frames: Vec<f32>,
    seen: Option<u64>,
}

impl TapSpectrum {
    pub fn new(tap: SampleTap, analyzer: SpectrumAnalyzer) -> Self {
        Self {
            tap,
            analyzer,
            frames: Vec::new(),
            seen: None,
        }
    }
}

impl SampleSource for TapSpectrum {
    fn poll_frequency_data(&mut self) -> Option<&[u8]> {
        let generation = self.tap.latest(&mut self.frames, self.analyzer.size())?;
        if self.seen == Some(generation) {
            return None;
        }
        self.seen = Some(generation);
        Some(self.analyzer.analyze(&self.frames))
    }
}
