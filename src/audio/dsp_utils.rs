// DSP utilities - Output hygiene for the real-time path
//
// Called per sample in the audio callback and in offline rendering, so
// everything here is branch-light and allocation-free.

/// Flush denormals to zero
///
/// Reverb tails and exponential release curves decay into the denormal range,
/// which is very slow on some CPUs. Anything below 1e-15 becomes 0.0.
#[inline]
pub fn flush_denormals_to_zero(x: f32) -> f32 {
    if x.abs() < 1e-15 { 0.0 } else { x }
}

/// Stereo variant of [`flush_denormals_to_zero`]
#[inline]
pub fn flush_frame((left, right): (f32, f32)) -> (f32, f32) {
    (flush_denormals_to_zero(left), flush_denormals_to_zero(right))
}

/// Soft clipping with tanh
///
/// Near-linear around zero, saturating smoothly toward ±1. Applied only where
/// samples leave the graph (device buffer, WAV file), never inside the mix.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

#[inline]
pub fn soft_clip_frame((left, right): (f32, f32)) -> (f32, f32) {
    (soft_clip(left), soft_clip(right))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_denormals() {
        assert_eq!(flush_denormals_to_zero(1e-20), 0.0);
        assert_eq!(flush_denormals_to_zero(0.1), 0.1);
        assert_eq!(flush_denormals_to_zero(-0.1), -0.1);
        assert_eq!(flush_frame((1e-30, 0.5)), (0.0, 0.5));
    }

    #[test]
    fn test_soft_clip() {
        assert!((soft_clip(0.0) - 0.0).abs() < 0.001);
        assert!((soft_clip(0.5) - 0.462).abs() < 0.01);

        // tanh approaches ±1 asymptotically
        assert!(soft_clip(10.0) <= 1.0);
        assert!(soft_clip(10.0) > 0.99);
        assert!(soft_clip(-10.0) >= -1.0);
        assert!(soft_clip(-10.0) < -0.99);

        let (l, r) = soft_clip_frame((4.0, -4.0));
        assert!(l < 1.0 && r > -1.0);
        assert_eq!(l, -r);
    }
}
