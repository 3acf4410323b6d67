// Convolution reverb - uniformly partitioned overlap-save
//
// The impulse response is cut into blocks of `block_size` frames and each
// block is transformed once at construction. At run time every completed input
// block is transformed, pushed into a frequency-domain delay line, and
// multiplied against the matching partitions. One inverse FFT per channel
// then yields the next `block_size` output frames.
//
// Input is mono (the reverb send), output is stereo (one impulse channel per
// side). Output lags input by exactly one block.
//
// `process` never allocates: all buffers are sized in `new`.

use rustfft::{Fft, FftPlanner, num_complex::Complex};
use std::sync::Arc;

use super::impulse::ImpulseResponse;

/// Default partition size in frames
pub const BLOCK_SIZE: usize = 512;

/// Level trim applied by normalization, in dB
const GAIN_CALIBRATION_DB: f32 = -58.0;
/// Rate at which the calibration was measured
const GAIN_CALIBRATION_SAMPLE_RATE: f32 = 44100.0;
/// Lowest RMS accepted when normalizing (keeps near-silent responses finite)
const MIN_POWER: f32 = 0.000125;

/// Scale factor that brings an impulse response to a consistent loudness.
///
/// Inverse RMS over all channels and frames, trimmed by a fixed calibration
/// and compensated for sample rate, like the Web Audio convolver node.
pub fn normalization_scale(ir: &ImpulseResponse) -> f32 {
    let frames = ir.len() * 2;
    let energy: f32 = ir
        .channels()
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|s| s * s)
        .sum();

    let mut power = (energy / frames as f32).sqrt();
    if !power.is_finite() || power < MIN_POWER {
        power = MIN_POWER;
    }

    let mut scale = 1.0 / power;
    scale *= 10.0_f32.powf(GAIN_CALIBRATION_DB * 0.05);
    scale *= GAIN_CALIBRATION_SAMPLE_RATE / ir.sample_rate;
    scale
}

pub struct Convolver {
    block_size: usize,
    fft_size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,

    /// Impulse partition spectra, `[channel][partition][bin]`
    partitions: [Vec<Vec<Complex<f32>>>; 2],
    /// Ring of the most recent input block spectra, newest at `history_head`
    history: Vec<Vec<Complex<f32>>>,
    history_head: usize,

    /// Previous input block followed by the block being filled
    input: Vec<f32>,
    /// Output frames for the block being filled, per channel
    output: [Vec<f32>; 2],
    position: usize,

    spectrum: Vec<Complex<f32>>,
    accumulator: Vec<Complex<f32>>,
    fft_scratch: Vec<Complex<f32>>,
}

impl Convolver {
    pub fn new(ir: &ImpulseResponse, normalize: bool) -> Self {
        Self::with_block_size(ir, BLOCK_SIZE, normalize)
    }

    pub fn with_block_size(ir: &ImpulseResponse, block_size: usize, normalize: bool) -> Self {
        let block_size = block_size.max(1);
        let fft_size = block_size * 2;

        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(fft_size);
        let inverse = planner.plan_fft_inverse(fft_size);

        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        let mut fft_scratch = vec![Complex::new(0.0, 0.0); scratch_len];

        let scale = if normalize && !ir.is_empty() {
            normalization_scale(ir)
        } else {
            1.0
        };

        let partition_count = ir.len().div_ceil(block_size).max(1);
        let mut transform = |taps: &[f32]| -> Vec<Vec<Complex<f32>>> {
            (0..partition_count)
                .map(|p| {
                    let mut bins = vec![Complex::new(0.0, 0.0); fft_size];
                    let start = (p * block_size).min(taps.len());
                    let end = (start + block_size).min(taps.len());
                    for (bin, &tap) in bins.iter_mut().zip(&taps[start..end]) {
                        bin.re = tap * scale;
                    }
                    forward.process_with_scratch(&mut bins, &mut fft_scratch);
                    bins
                })
                .collect()
        };
        let partitions = [transform(&ir.left), transform(&ir.right)];

        Self {
            block_size,
            fft_size,
            forward,
            inverse,
            partitions,
            history: vec![vec![Complex::new(0.0, 0.0); fft_size]; partition_count],
            history_head: 0,
            input: vec![0.0; fft_size],
            output: [vec![0.0; block_size], vec![0.0; block_size]],
            position: 0,
            spectrum: vec![Complex::new(0.0, 0.0); fft_size],
            accumulator: vec![Complex::new(0.0, 0.0); fft_size],
            fft_scratch,
        }
    }

    /// Latency of the wet signal in frames
    pub fn latency(&self) -> usize {
        self.block_size
    }

    pub fn partition_count(&self) -> usize {
        self.history.len()
    }

    /// Feed one input frame, get one stereo output frame
    #[inline]
    pub fn process(&mut self, input: f32) -> (f32, f32) {
        self.input[self.block_size + self.position] = input;
        let out = (self.output[0][self.position], self.output[1][self.position]);

        self.position += 1;
        if self.position == self.block_size {
            self.process_block();
            self.position = 0;
        }
        out
    }

    fn process_block(&mut self) {
        let partition_count = self.history.len();

        for (bin, &sample) in self.spectrum.iter_mut().zip(&self.input) {
            *bin = Complex::new(sample, 0.0);
        }
        self.forward
            .process_with_scratch(&mut self.spectrum, &mut self.fft_scratch);

        self.history_head = (self.history_head + 1) % partition_count;
        self.history[self.history_head].copy_from_slice(&self.spectrum);

        let norm = 1.0 / self.fft_size as f32;
        for channel in 0..2 {
            self.accumulator.fill(Complex::new(0.0, 0.0));
            for (p, partition) in self.partitions[channel].iter().enumerate() {
                let delayed = &self.history[(self.history_head + partition_count - p) % partition_count];
                for ((acc, x), h) in self.accumulator.iter_mut().zip(delayed).zip(partition) {
                    *acc += x * h;
                }
            }
            self.inverse
                .process_with_scratch(&mut self.accumulator, &mut self.fft_scratch);

            // Overlap-save: only the second half is free of circular wrap
            for (out, bin) in self.output[channel]
                .iter_mut()
                .zip(&self.accumulator[self.block_size..])
            {
                *out = bin.re * norm;
            }
        }

        self.input.copy_within(self.block_size.., 0);
    }
}
