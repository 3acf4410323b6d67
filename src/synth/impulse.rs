// Synthetic reverb impulse response
//
// Stereo decaying noise: every sample is uniform noise in [-1, 1] scaled by
// (1 - i / frame_count)^decay. Channels draw independent noise so the tail is
// decorrelated between left and right.

use rand::Rng;

/// Default reverb tail length in seconds
pub const DEFAULT_IMPULSE_SECONDS: f32 = 2.0;
/// Default curvature of the tail envelope
pub const DEFAULT_IMPULSE_DECAY: f32 = 2.0;

/// Two-channel impulse response
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponse {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    pub sample_rate: f32,
}

impl ImpulseResponse {
    /// Frames per channel
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn channels(&self) -> [&[f32]; 2] {
        [&self.left, &self.right]
    }

    /// Single-sample unit impulse on both channels, a transparent response
    pub fn unit(sample_rate: f32) -> Self {
        Self {
            left: vec![1.0],
            right: vec![1.0],
            sample_rate,
        }
    }
}

/// Envelope multiplier for frame `index` of a `frame_count` long response.
///
/// 1.0 at index 0, falling monotonically to 0.0 at `frame_count`.
pub fn envelope_at(index: usize, frame_count: usize, decay: f32) -> f32 {
    if frame_count == 0 || index >= frame_count {
        return 0.0;
    }
    (1.0 - index as f32 / frame_count as f32).powf(decay)
}

/// Generate a decaying-noise impulse response.
///
/// The random source is a parameter so callers can seed it; the engine passes
/// the thread RNG.
pub fn generate_impulse<R: Rng>(
    duration_seconds: f32,
    decay: f32,
    sample_rate: f32,
    rng: &mut R,
) -> ImpulseResponse {
    let frame_count = (duration_seconds * sample_rate).max(0.0) as usize;

    let mut channel = || -> Vec<f32> {
        (0..frame_count)
            .map(|i| rng.gen_range(-1.0_f32..=1.0) * envelope_at(i, frame_count, decay))
            .collect()
    };
    let left = channel();
    let right = channel();

    ImpulseResponse {
        left,
        right,
        sample_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_length_matches_duration() {
        let mut rng = StdRng::seed_from_u64(7);
        let ir = generate_impulse(2.0, 2.0, 44100.0, &mut rng);
        assert_eq!(ir.len(), 88200);
        assert_eq!(ir.right.len(), 88200);
        assert_eq!(ir.sample_rate, 44100.0);

        let empty = generate_impulse(0.0, 2.0, 44100.0, &mut rng);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_envelope_contract() {
        let frames = 1000;
        assert_eq!(envelope_at(0, frames, 2.0), 1.0);
        assert_eq!(envelope_at(frames, frames, 2.0), 0.0);
        assert!((envelope_at(500, frames, 2.0) - 0.25).abs() < 1e-6);
        assert!((envelope_at(500, frames, 1.0) - 0.5).abs() < 1e-6);

        let mut previous = f32::INFINITY;
        for i in 0..=frames {
            let value = envelope_at(i, frames, 3.0);
            assert!(value <= previous);
            assert!((0.0..=1.0).contains(&value));
            previous = value;
        }
    }

    #[test]
    fn test_noise_is_bounded_by_envelope() {
        let mut rng = StdRng::seed_from_u64(42);
        let ir = generate_impulse(0.5, 2.0, 8000.0, &mut rng);
        for channel in ir.channels() {
            for (i, sample) in channel.iter().enumerate() {
                assert!(sample.abs() <= envelope_at(i, ir.len(), 2.0) + 1e-6);
            }
        }
    }

    #[test]
    fn test_channels_are_decorrelated() {
        let mut rng = StdRng::seed_from_u64(1);
        let ir = generate_impulse(0.25, 2.0, 8000.0, &mut rng);
        assert_ne!(ir.left, ir.right);
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = generate_impulse(0.1, 2.0, 8000.0, &mut StdRng::seed_from_u64(99));
        let b = generate_impulse(0.1, 2.0, 8000.0, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }
}
