// Mixer - The processing graph as it runs on the audio thread
//
//   voices ──┬──────────────────────────────┐
//            └─ × reverb_send ─ convolver ──┴─ + ─ × volume ─ out (L, R)
//
// The mixer owns every voice and the convolver. It is moved into the sink once
// at initialization and is only reached afterwards through the command queue
// and the shared gain parameters.
//
// Voice slots are preallocated, one per command queue entry. Polyphony is not
// limited, so the pool only reallocates on the audio thread once more notes
// than that overlap.

use ringbuf::traits::{Consumer, Observer};

use crate::audio::dsp_utils::flush_frame;
use crate::audio::parameters::MixerParameters;
use crate::messaging::channels::CommandConsumer;
use crate::messaging::command::Command;
use crate::synth::convolver::Convolver;
use crate::synth::voice::Voice;

pub struct Mixer {
    voices: Vec<Voice>,
    convolver: Convolver,
    params: MixerParameters,
    commands: CommandConsumer,
    sample_rate: f32,
}

impl Mixer {
    pub fn new(
        sample_rate: f32,
        convolver: Convolver,
        params: MixerParameters,
        commands: CommandConsumer,
    ) -> Self {
        Self {
            voices: Vec::with_capacity(commands.capacity().get()),
            convolver,
            params,
            commands,
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Drain pending commands. Called once per block, before rendering it.
    pub fn process_commands(&mut self) {
        while let Some(command) = self.commands.try_pop() {
            match command {
                Command::NoteOn { frequency } => {
                    self.voices.push(Voice::new(frequency, self.sample_rate));
                }
            }
        }
    }

    /// Render one stereo frame
    #[inline]
    pub fn next_frame(&mut self) -> (f32, f32) {
        let mut dry = 0.0;
        let mut index = 0;
        while index < self.voices.len() {
            dry += self.voices[index].next_sample();
            if self.voices[index].is_finished() {
                // Order of voices does not matter for a sum
                self.voices.swap_remove(index);
            } else {
                index += 1;
            }
        }

        let (wet_left, wet_right) = self.convolver.process(dry * self.params.reverb_send.get());
        let volume = self.params.volume.get();
        flush_frame(((dry + wet_left) * volume, (dry + wet_right) * volume))
    }

    /// Drain commands, then render `output.len()` frames
    pub fn render(&mut self, output: &mut [(f32, f32)]) {
        self.process_commands();
        for frame in output.iter_mut() {
            *frame = self.next_frame();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::channels::{CommandProducer, create_command_channel};
    use crate::synth::impulse::ImpulseResponse;
    use ringbuf::traits::Producer;

    const SAMPLE_RATE: f32 = 8000.0;

    fn mixer_with(params: MixerParameters) -> (Mixer, CommandProducer) {
        let (tx, rx) = create_command_channel(16);
        let convolver = Convolver::with_block_size(&ImpulseResponse::unit(SAMPLE_RATE), 32, false);
        (Mixer::new(SAMPLE_RATE, convolver, params, rx), tx)
    }

    fn note_on(tx: &mut CommandProducer, frequency: f32) {
        tx.try_push(Command::NoteOn { frequency }).unwrap();
    }

    #[test]
    fn test_silent_without_voices() {
        let (mut mixer, _tx) = mixer_with(MixerParameters::default());
        let mut out = vec![(1.0, 1.0); 256];
        mixer.render(&mut out);
        assert!(out.iter().all(|&frame| frame == (0.0, 0.0)));
    }

    #[test]
    fn test_dry_path_matches_voice() {
        let (mut mixer, mut tx) = mixer_with(MixerParameters::new(0.5, 0.0));
        note_on(&mut tx, 440.0);
        let mut out = vec![(0.0, 0.0); 200];
        mixer.render(&mut out);

        let mut reference = Voice::new(440.0, SAMPLE_RATE);
        for &(left, right) in &out {
            let expected = reference.next_sample() * 0.5;
            assert!((left - expected).abs() < 1e-6);
            assert_eq!(left, right);
        }
    }

    #[test]
    fn test_reverb_send_adds_delayed_wet_signal() {
        // Unit impulse, no normalization: wet = dry * send, one block late
        let (mut mixer, mut tx) = mixer_with(MixerParameters::new(1.0, 0.5));
        note_on(&mut tx, 440.0);
        let mut out = vec![(0.0, 0.0); 128];
        mixer.render(&mut out);

        let mut reference = Voice::new(440.0, SAMPLE_RATE);
        let dry: Vec<f32> = (0..128).map(|_| reference.next_sample()).collect();
        for n in 0..128 {
            let wet = if n >= 32 { dry[n - 32] * 0.5 } else { 0.0 };
            assert!((out[n].0 - (dry[n] + wet)).abs() < 1e-4, "frame {}", n);
        }
    }

    #[test]
    fn test_finished_voices_are_reclaimed() {
        let (mut mixer, mut tx) = mixer_with(MixerParameters::default());
        note_on(&mut tx, 261.63);
        note_on(&mut tx, 329.63);
        mixer.process_commands();
        assert_eq!(mixer.active_voices(), 2);

        let lifetime = Voice::new(261.63, SAMPLE_RATE).lifetime_samples() as usize;
        let mut out = vec![(0.0, 0.0); lifetime];
        mixer.render(&mut out);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_voice_slots_are_preallocated_per_queue_entry() {
        let (mut tx, rx) = create_command_channel(2);
        let convolver = Convolver::with_block_size(&ImpulseResponse::unit(SAMPLE_RATE), 32, false);
        let mut mixer = Mixer::new(SAMPLE_RATE, convolver, MixerParameters::default(), rx);
        let capacity = mixer.voices.capacity();
        assert!(capacity >= 2);

        // A full queue drained in one block fits without reallocating
        note_on(&mut tx, 220.0);
        note_on(&mut tx, 330.0);
        let mut out = vec![(0.0, 0.0); 10];
        mixer.render(&mut out);
        assert_eq!(mixer.active_voices(), 2);
        assert_eq!(mixer.voices.capacity(), capacity);

        // Later notes still sound alongside the ringing ones
        for frequency in [440.0, 550.0, 660.0] {
            note_on(&mut tx, frequency);
            mixer.render(&mut out);
        }
        let mut frequencies: Vec<f32> = mixer.voices.iter().map(Voice::frequency).collect();
        frequencies.sort_by(f32::total_cmp);
        assert_eq!(frequencies, vec![220.0, 330.0, 440.0, 550.0, 660.0]);
    }

    #[test]
    fn test_gain_changes_apply_immediately() {
        let params = MixerParameters::new(1.0, 0.0);
        let (mut mixer, mut tx) = mixer_with(params.clone());
        note_on(&mut tx, 440.0);
        let mut out = vec![(0.0, 0.0); 100];
        mixer.render(&mut out);

        params.volume.set(0.0);
        mixer.render(&mut out);
        assert!(out.iter().all(|&frame| frame == (0.0, 0.0)));
    }
}
