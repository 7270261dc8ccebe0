//! Per-bucket spring and peak-hold animation shared by every renderer.

/// Fraction of the distance to the target added to velocity each frame.
pub const SPRING_GAIN: f32 = 0.3;
/// Velocity retained from one frame to the next.
pub const DAMPING: f32 = 0.85;
/// Full-scale samples reach this fraction of the available height.
pub const TARGET_SCALE: f32 = 0.9;
/// Peak-hold decay per frame, as a fraction of full scale.
pub const PEAK_DECAY: f32 = 0.01;

/// Nearest-neighbour decimation to exactly `n` buckets.
///
/// Takes every `len / n`-th sample (at least every sample). Indices past the
/// end of `samples` read as 0.
pub fn decimate(samples: &[u8], n: usize) -> Vec<u8> {
    let step = (samples.len() / n.max(1)).max(1);
    (0..n)
        .map(|i| samples.get(i * step).copied().unwrap_or(0))
        .collect()
}

/// `sample` in `0.0..=1.0`.
pub fn normalized(sample: u8) -> f32 {
    f32::from(sample) / 255.0
}

/// Animation arrays for one renderer instance, one slot per bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationState {
    pub heights: Vec<f32>,
    pub velocities: Vec<f32>,
    /// Normalized peak-hold values.
    pub peaks: Vec<f32>,
    pub peak_decay: Vec<f32>,
}

impl AnimationState {
    pub fn new(elements: usize) -> Self {
        Self {
            heights: vec![0.0; elements],
            velocities: vec![0.0; elements],
            peaks: vec![0.0; elements],
            peak_decay: vec![PEAK_DECAY; elements],
        }
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Reset to zeroed arrays of `elements` slots if the count differs.
    /// Returns whether a reset happened.
    pub fn ensure_len(&mut self, elements: usize) -> bool {
        if self.len() == elements {
            return false;
        }
        *self = Self::new(elements);
        true
    }

    /// Advance one frame towards `buckets`. Heights are in the same unit as
    /// `max_height`.
    pub fn step(&mut self, buckets: &[u8], max_height: f32) {
        self.ensure_len(buckets.len());
        for (i, &sample) in buckets.iter().enumerate() {
            let norm = normalized(sample);
            let target = norm * max_height * TARGET_SCALE;

            let acceleration = (target - self.heights[i]) * SPRING_GAIN;
            self.velocities[i] = (self.velocities[i] + acceleration) * DAMPING;
            self.heights[i] = (self.heights[i] + self.velocities[i]).max(0.0);

            if norm > self.peaks[i] {
                self.peaks[i] = norm;
            } else {
                self.peaks[i] = (self.peaks[i] - self.peak_decay[i]).max(0.0);
            }
        }
    }

    /// True when every height and peak is within `epsilon` of zero.
    pub fn is_settled(&self, epsilon: f32) -> bool {
        self.heights.iter().chain(&self.peaks).all(|v| v.abs() <= epsilon)
    }
}
