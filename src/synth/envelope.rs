// Percussive envelope - struck-string amplitude shape
//
// Attack ramps linearly from silence to full level, then the level falls
// exponentially to the sustain level (decay) and on to a near-silent floor
// (release). There is no held phase: release starts as soon as decay ends,
// and the voice is over once release reaches the floor.
//
// Exponential segments follow v(t) = v0 * (v1 / v0)^((t - t0) / (t1 - t0)).
// They are rendered by multiplying the level by a constant per-sample ratio,
// re-anchored exactly at each segment start.

/// Envelope parameters (times in seconds, levels linear)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    pub attack: f32,
    pub decay: f32,
    /// Level reached at the end of decay
    pub sustain: f32,
    pub release: f32,
    /// Release target. Exponential ramps cannot reach zero, so this must be > 0.
    pub floor: f32,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 1.5,
            floor: 0.0001,
        }
    }
}

impl EnvelopeParams {
    /// Total lifetime of a voice shaped by these parameters
    pub fn total_duration(&self) -> f32 {
        self.attack + self.decay + self.release
    }

    /// Closed-form level `t` seconds after note-on. Zero outside the lifetime.
    #[cfg(test)]
    pub(crate) fn value_at(&self, t: f32) -> f32 {
        if t < 0.0 || t >= self.total_duration() {
            return 0.0;
        }
        if t < self.attack {
            return t / self.attack;
        }
        let t = t - self.attack;
        if t < self.decay {
            return self.sustain.powf(t / self.decay);
        }
        let t = t - self.decay;
        self.sustain * (self.floor / self.sustain).powf(t / self.release)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Attack,
    Decay,
    Release,
    Finished,
}

/// Sample-rate envelope generator. Starts in attack as soon as it is built.
#[derive(Debug, Clone)]
pub struct PercussiveEnvelope {
    params: EnvelopeParams,
    stage: EnvelopeStage,
    level: f32,
    /// Samples rendered in the current stage
    position: u32,

    attack_samples: u32,
    decay_samples: u32,
    release_samples: u32,
    decay_ratio: f32,
    release_ratio: f32,
}

impl PercussiveEnvelope {
    pub fn new(params: EnvelopeParams, sample_rate: f32) -> Self {
        let to_samples = |seconds: f32| ((seconds * sample_rate).round() as u32).max(1);
        let attack_samples = to_samples(params.attack);
        let decay_samples = to_samples(params.decay);
        let release_samples = to_samples(params.release);

        Self {
            params,
            stage: EnvelopeStage::Attack,
            level: 0.0,
            position: 0,
            attack_samples,
            decay_samples,
            release_samples,
            decay_ratio: params.sustain.powf(1.0 / decay_samples as f32),
            release_ratio: (params.floor / params.sustain).powf(1.0 / release_samples as f32),
        }
    }

    /// Advance one sample and return the level for it
    pub fn process(&mut self) -> f32 {
        let value = match self.stage {
            EnvelopeStage::Attack => self.position as f32 / self.attack_samples as f32,
            EnvelopeStage::Decay | EnvelopeStage::Release => self.level,
            EnvelopeStage::Finished => return 0.0,
        };

        self.position += 1;
        match self.stage {
            EnvelopeStage::Attack if self.position >= self.attack_samples => {
                self.enter(EnvelopeStage::Decay, 1.0);
            }
            EnvelopeStage::Decay if self.position >= self.decay_samples => {
                self.enter(EnvelopeStage::Release, self.params.sustain);
            }
            EnvelopeStage::Release if self.position >= self.release_samples => {
                self.enter(EnvelopeStage::Finished, 0.0);
            }
            EnvelopeStage::Decay => self.level *= self.decay_ratio,
            EnvelopeStage::Release => self.level *= self.release_ratio,
            _ => {}
        }

        value
    }

    fn enter(&mut self, stage: EnvelopeStage, level: f32) {
        self.stage = stage;
        self.level = level;
        self.position = 0;
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn is_finished(&self) -> bool {
        self.stage == EnvelopeStage::Finished
    }

    /// Number of samples from note-on to the end of release
    pub fn lifetime_samples(&self) -> u32 {
        self.attack_samples + self.decay_samples + self.release_samples
    }
}
