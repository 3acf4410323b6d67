// Oscillators - Phase-accumulator tone generators

use std::f32::consts::PI;

pub trait Oscillator {
    fn next_sample(&mut self) -> f32;
    fn set_frequency(&mut self, freq: f32);
    fn frequency(&self) -> f32;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveformType {
    Sine,
    /// Odd harmonics falling at 1/n², the voice's string body
    Triangle,
}

/// Naive (non band-limited) oscillator. Both waveforms start at zero and rise,
/// so a voice never begins with a step.
#[derive(Clone, Debug)]
pub struct SimpleOscillator {
    waveform: WaveformType,
    phase: f32,
    phase_increment: f32,
    frequency: f32,
    sample_rate: f32,
}

impl SimpleOscillator {
    pub fn new(waveform: WaveformType, sample_rate: f32) -> Self {
        Self {
            waveform,
            phase: 0.0,
            phase_increment: 0.0,
            frequency: 0.0,
            sample_rate,
        }
    }

    pub fn with_frequency(waveform: WaveformType, frequency: f32, sample_rate: f32) -> Self {
        let mut osc = Self::new(waveform, sample_rate);
        osc.set_frequency(frequency);
        osc
    }
}

impl Oscillator for SimpleOscillator {
    fn next_sample(&mut self) -> f32 {
        let p = self.phase;
        let sample = match self.waveform {
            WaveformType::Sine => (p * 2.0 * PI).sin(),
            WaveformType::Triangle => {
                if p < 0.25 {
                    4.0 * p
                } else if p < 0.75 {
                    2.0 - 4.0 * p
                } else {
                    4.0 * p - 4.0
                }
            }
        };

        self.phase += self.phase_increment;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        sample
    }

    fn set_frequency(&mut self, freq: f32) {
        self.frequency = freq;
        self.phase_increment = freq / self.sample_rate;
    }

    fn frequency(&self) -> f32 {
        self.frequency
    }
}
