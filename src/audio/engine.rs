// Synthesis engine - Graph lifecycle and the control-side instrument API
//
// The engine is created cold. `initialize` opens the sink, generates the
// reverb impulse at the sink's sample rate, builds the mixer and hands it to
// the sink. Until then every call is a silent no-op, and the same holds forever
// if initialization fails.
//
// After initialization the engine keeps only the control-side handles: the
// note-on producer and the shared gain parameters. Voices live on the audio
// side.

use log::{debug, info, warn};
use ringbuf::traits::Producer;
use thiserror::Error;

use crate::audio::mixer::Mixer;
use crate::audio::parameters::MixerParameters;
use crate::messaging::channels::{
    CommandProducer, DEFAULT_COMMAND_CAPACITY, create_command_channel,
};
use crate::messaging::command::Command;
use crate::synth::convolver::Convolver;
use crate::synth::impulse::{DEFAULT_IMPULSE_DECAY, DEFAULT_IMPULSE_SECONDS, generate_impulse};
use crate::synth::notes::{OctaveShift, base_frequency};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Audio configuration error: {0}")]
    Config(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Audio stream error: {0}")]
    Stream(String),
}

/// Where the mixer runs: a device stream or an offline renderer
pub trait AudioSink {
    /// Acquire the output and report the sample rate the graph must use
    fn open(&mut self) -> Result<f32, EngineError>;

    /// Take ownership of the mixer and start pulling frames from it
    fn start(&mut self, mixer: Mixer) -> Result<(), EngineError>;
}

/// The four-call surface the session drives
pub trait Instrument {
    fn initialize(&mut self) -> Result<(), EngineError>;
    fn is_initialized(&self) -> bool;
    /// Returns the effective frequency of the started voice, `None` if nothing sounded
    fn play_note(&mut self, note: &str, octave: OctaveShift) -> Option<f32>;
    fn set_volume(&mut self, level: f32);
    fn set_reverb(&mut self, level: f32);
}

/// Construction parameters for the processing graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub impulse_duration_secs: f32,
    pub impulse_decay: f32,
    pub command_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            impulse_duration_secs: DEFAULT_IMPULSE_SECONDS,
            impulse_decay: DEFAULT_IMPULSE_DECAY,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
        }
    }
}

/// Control-side handles into a running graph
struct GraphHandles {
    commands: CommandProducer,
    params: MixerParameters,
    sample_rate: f32,
}

enum EngineState {
    Uninitialized,
    Ready(GraphHandles),
}

pub struct SynthEngine<S: AudioSink> {
    sink: S,
    settings: EngineSettings,
    state: EngineState,
}

impl<S: AudioSink> SynthEngine<S> {
    pub fn new(sink: S) -> Self {
        Self::with_settings(sink, EngineSettings::default())
    }

    pub fn with_settings(sink: S, settings: EngineSettings) -> Self {
        Self {
            sink,
            settings,
            state: EngineState::Uninitialized,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    /// Sample rate of the running graph
    pub fn sample_rate(&self) -> Option<f32> {
        match &self.state {
            EngineState::Ready(graph) => Some(graph.sample_rate),
            EngineState::Uninitialized => None,
        }
    }

    pub fn volume(&self) -> Option<f32> {
        match &self.state {
            EngineState::Ready(graph) => Some(graph.params.volume.get()),
            EngineState::Uninitialized => None,
        }
    }

    pub fn reverb(&self) -> Option<f32> {
        match &self.state {
            EngineState::Ready(graph) => Some(graph.params.reverb_send.get()),
            EngineState::Uninitialized => None,
        }
    }

    fn build_graph(&mut self) -> Result<GraphHandles, EngineError> {
        let sample_rate = self.sink.open()?;

        let impulse = generate_impulse(
            self.settings.impulse_duration_secs,
            self.settings.impulse_decay,
            sample_rate,
            &mut rand::thread_rng(),
        );
        let convolver = Convolver::new(&impulse, true);
        debug!(
            "Reverb impulse: {} frames, {} partitions",
            impulse.len(),
            convolver.partition_count()
        );

        let params = MixerParameters::default();
        let (producer, consumer) = create_command_channel(self.settings.command_capacity);
        let mixer = Mixer::new(sample_rate, convolver, params.clone(), consumer);

        self.sink.start(mixer)?;

        Ok(GraphHandles {
            commands: producer,
            params,
            sample_rate,
        })
    }
}

impl<S: AudioSink> Instrument for SynthEngine<S> {
    fn initialize(&mut self) -> Result<(), EngineError> {
        if let EngineState::Ready(_) = self.state {
            return Ok(());
        }

        let graph = self.build_graph().inspect_err(|e| {
            warn!("Audio engine initialization failed: {}", e);
        })?;
        info!("Audio engine ready at {} Hz", graph.sample_rate);
        self.state = EngineState::Ready(graph);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        matches!(self.state, EngineState::Ready(_))
    }

    fn play_note(&mut self, note: &str, octave: OctaveShift) -> Option<f32> {
        let Some(base) = base_frequency(note) else {
            debug!("Ignoring unknown note {:?}", note);
            return None;
        };
        let EngineState::Ready(graph) = &mut self.state else {
            debug!("Ignoring note {} before initialization", note);
            return None;
        };

        let frequency = octave.apply(base);
        if graph.commands.try_push(Command::NoteOn { frequency }).is_err() {
            warn!("Command queue full, dropping note {}", note);
            return None;
        }
        Some(frequency)
    }

    fn set_volume(&mut self, level: f32) {
        match &self.state {
            EngineState::Ready(graph) => graph.params.volume.set(level),
            EngineState::Uninitialized => debug!("Ignoring volume change before initialization"),
        }
    }

    fn set_reverb(&mut self, level: f32) {
        match &self.state {
            EngineState::Ready(graph) => graph.params.reverb_send.set(level),
            EngineState::Uninitialized => debug!("Ignoring reverb change before initialization"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::offline::OfflineSink;
    use crate::synth::notes::NOTE_FREQUENCIES;

    fn quick_settings() -> EngineSettings {
        EngineSettings {
            impulse_duration_secs: 0.05,
            ..EngineSettings::default()
        }
    }

    fn ready_engine() -> SynthEngine<OfflineSink> {
        let mut engine = SynthEngine::with_settings(OfflineSink::new(8000.0), quick_settings());
        engine.initialize().unwrap();
        engine
    }

    #[test]
    fn test_calls_before_initialize_are_noops() {
        let mut engine = SynthEngine::with_settings(OfflineSink::new(8000.0), quick_settings());
        assert!(!engine.is_initialized());
        assert_eq!(engine.play_note("A4", OctaveShift::default()), None);
        engine.set_volume(0.3);
        engine.set_reverb(0.3);
        assert_eq!(engine.volume(), None);
        assert_eq!(engine.sink().open_count(), 0);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut engine = ready_engine();
        engine.initialize().unwrap();
        engine.initialize().unwrap();
        assert_eq!(engine.sink().open_count(), 1);
        assert_eq!(engine.sample_rate(), Some(8000.0));
    }

    #[test]
    fn test_initial_levels() {
        let engine = ready_engine();
        assert_eq!(engine.volume(), Some(1.0));
        assert_eq!(engine.reverb(), Some(0.0));
    }

    #[test]
    fn test_effective_frequency_is_exact() {
        let mut engine = SynthEngine::with_settings(
            OfflineSink::new(8000.0),
            EngineSettings {
                command_capacity: NOTE_FREQUENCIES.len() * 5,
                ..quick_settings()
            },
        );
        engine.initialize().unwrap();

        for (note, base) in NOTE_FREQUENCIES {
            for shift in OctaveShift::MIN..=OctaveShift::MAX {
                let octave = OctaveShift::new(shift).unwrap();
                let expected = base * 2.0_f32.powi(shift as i32);
                assert_eq!(engine.play_note(note, octave), Some(expected));
            }
        }
    }

    #[test]
    fn test_unknown_note_changes_nothing() {
        let mut engine = ready_engine();
        engine.set_volume(0.4);
        engine.set_reverb(0.2);
        assert_eq!(engine.play_note("H9", OctaveShift::default()), None);
        assert_eq!(engine.play_note("", OctaveShift::default()), None);
        assert_eq!(engine.volume(), Some(0.4));
        assert_eq!(engine.reverb(), Some(0.2));
        assert_eq!(engine.sink().renderer().active_voices(), 0);
    }

    #[test]
    fn test_failed_initialize_stays_silent() {
        let mut engine = SynthEngine::with_settings(OfflineSink::unavailable(), quick_settings());
        assert!(engine.initialize().is_err());
        assert!(!engine.is_initialized());
        assert_eq!(engine.play_note("C4", OctaveShift::default()), None);
    }

    #[test]
    fn test_full_queue_drops_note() {
        let mut engine = SynthEngine::with_settings(
            OfflineSink::new(8000.0),
            EngineSettings {
                command_capacity: 2,
                ..quick_settings()
            },
        );
        engine.initialize().unwrap();
        assert!(engine.play_note("C4", OctaveShift::default()).is_some());
        assert!(engine.play_note("D4", OctaveShift::default()).is_some());
        assert_eq!(engine.play_note("E4", OctaveShift::default()), None);

        // Rendering drains the queue and frees room again
        engine.sink().renderer().render(1);
        assert!(engine.play_note("E4", OctaveShift::default()).is_some());
    }
}
