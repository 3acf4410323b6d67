// Voice - One struck string
//
// A voice is built per note-on and thrown away once its envelope ends. It is
// never retriggered or reused, so overlapping voices cannot disturb each other.

use super::envelope::{EnvelopeParams, PercussiveEnvelope};
use super::oscillator::{Oscillator, SimpleOscillator, WaveformType};

/// Level of the octave overtone relative to the fundamental
pub const OVERTONE_LEVEL: f32 = 0.3;

#[derive(Debug, Clone)]
pub struct Voice {
    fundamental: SimpleOscillator,
    overtone: SimpleOscillator,
    envelope: PercussiveEnvelope,
}

impl Voice {
    pub fn new(frequency: f32, sample_rate: f32) -> Self {
        Self::with_envelope(frequency, EnvelopeParams::default(), sample_rate)
    }

    pub fn with_envelope(frequency: f32, params: EnvelopeParams, sample_rate: f32) -> Self {
        Self {
            fundamental: SimpleOscillator::with_frequency(
                WaveformType::Triangle,
                frequency,
                sample_rate,
            ),
            overtone: SimpleOscillator::with_frequency(
                WaveformType::Sine,
                frequency * 2.0,
                sample_rate,
            ),
            envelope: PercussiveEnvelope::new(params, sample_rate),
        }
    }

    /// Frequency of the fundamental in Hz
    pub fn frequency(&self) -> f32 {
        self.fundamental.frequency()
    }

    /// True once the envelope has run out; the mixer drops the voice then
    pub fn is_finished(&self) -> bool {
        self.envelope.is_finished()
    }

    pub fn lifetime_samples(&self) -> u32 {
        self.envelope.lifetime_samples()
    }

    pub fn next_sample(&mut self) -> f32 {
        if self.envelope.is_finished() {
            return 0.0;
        }
        let gain = self.envelope.process();
        let tone = self.fundamental.next_sample() + self.overtone.next_sample() * OVERTONE_LEVEL;
        tone * gain
    }
}
