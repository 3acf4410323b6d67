// Format conversion - f32 graph output to device and file sample formats
//
// The graph always renders f32 stereo. Device buffers may be f32, i16 or u16
// with any channel count; WAV export writes 16-bit signed integers.
// All conversions are allocation-free.

use cpal::{FromSample, Sample};

/// Convert an f32 sample to i16
///
/// Maps [-1.0, 1.0] to [i16::MIN, i16::MAX], clamping anything outside
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped >= 0.0 {
        (clamped * i16::MAX as f32) as i16
    } else {
        (clamped * -(i16::MIN as f32)) as i16
    }
}

/// Write one stereo frame into an interleaved device frame
///
/// Channels beyond the second are silenced; a mono device gets the average.
#[inline]
pub fn write_stereo_to_interleaved_frame<T>((left, right): (f32, f32), output_frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    if output_frame.len() >= 2 {
        output_frame[0] = Sample::from_sample::<f32>(left);
        output_frame[1] = Sample::from_sample::<f32>(right);
        for channel_sample in output_frame.iter_mut().skip(2) {
            *channel_sample = Sample::from_sample::<f32>(0.0);
        }
    } else if let Some(channel_sample) = output_frame.first_mut() {
        *channel_sample = Sample::from_sample::<f32>((left + right) * 0.5);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_to_i16_conversion() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(1.0), i16::MAX);
        assert_eq!(f32_to_i16(-1.0), i16::MIN);

        let mid = f32_to_i16(0.5);
        assert!(mid > 0 && mid < i16::MAX);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(f32_to_i16(2.0), i16::MAX);
        assert_eq!(f32_to_i16(-2.0), i16::MIN);
    }

    #[test]
    fn test_stereo_frame_layouts() {
        let mut stereo = [0.0f32; 2];
        write_stereo_to_interleaved_frame((0.25, -0.5), &mut stereo);
        assert_eq!(stereo, [0.25, -0.5]);

        let mut surround = [1.0f32; 4];
        write_stereo_to_interleaved_frame((0.25, -0.5), &mut surround);
        assert_eq!(surround, [0.25, -0.5, 0.0, 0.0]);

        let mut mono = [0.0f32; 1];
        write_stereo_to_interleaved_frame((0.5, 0.25), &mut mono);
        assert_eq!(mono, [0.375]);

        let mut ints = [0i16; 2];
        write_stereo_to_interleaved_frame((0.5, -0.5), &mut ints);
        assert!(ints[0] > 0 && ints[1] < 0);
    }
}
