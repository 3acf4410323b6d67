// Audio export - Offline rendering of a melody to a WAV file
//
// The melody drives a regular `SynthEngine` on an `OfflineSink`, so the file
// contains exactly what live playback would produce. Rendering runs as fast as
// possible; note starts are placed on exact frames.

use hound::{WavSpec, WavWriter};
use log::info;
use std::path::Path;
use thiserror::Error;

use crate::audio::dsp_utils::soft_clip_frame;
use crate::audio::engine::{EngineError, EngineSettings, Instrument, SynthEngine};
use crate::audio::format_conversion::f32_to_i16;
use crate::audio::offline::OfflineSink;
use crate::sequencer::player::delay_from_ms;
use crate::sequencer::recorder::RecordedNoteEvent;
use crate::synth::convolver::BLOCK_SIZE;
use crate::synth::envelope::EnvelopeParams;
use crate::synth::notes::OctaveShift;

/// Frames rendered per pass between note starts
const RENDER_CHUNK: usize = 1024;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Melody is empty, nothing to export")]
    EmptyMelody,
}

/// Audio export settings
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub sample_rate: u32,
    pub octave: OctaveShift,
    pub volume: f32,
    pub reverb: f32,
    pub engine: EngineSettings,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            octave: OctaveShift::default(),
            volume: 0.7,
            reverb: 0.3,
            engine: EngineSettings::default(),
        }
    }
}

/// Audio exporter - renders a melody to stereo frames or a 16-bit WAV file
pub struct AudioExporter {
    settings: ExportSettings,
}

impl AudioExporter {
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    fn frame_at(&self, time_offset_ms: f64) -> u64 {
        (delay_from_ms(time_offset_ms).as_secs_f64() * self.settings.sample_rate as f64).round()
            as u64
    }

    /// Frames rendered after the last note start: one voice lifetime, the
    /// reverb tail and the convolver latency
    pub fn tail_frames(&self) -> u64 {
        let seconds = EnvelopeParams::default().total_duration() as f64
            + self.settings.engine.impulse_duration_secs as f64;
        (seconds * self.settings.sample_rate as f64).ceil() as u64 + BLOCK_SIZE as u64
    }

    /// Render the melody, handing each chunk of frames to `write`.
    /// Returns the number of frames produced.
    fn render_with<F>(&self, melody: &[RecordedNoteEvent], mut write: F) -> Result<u64, ExportError>
    where
        F: FnMut(&[(f32, f32)]) -> Result<(), ExportError>,
    {
        if melody.is_empty() {
            return Err(ExportError::EmptyMelody);
        }

        let sink = OfflineSink::new(self.settings.sample_rate as f32);
        let renderer = sink.renderer();
        let mut engine = SynthEngine::with_settings(
            sink,
            EngineSettings {
                command_capacity: self.settings.engine.command_capacity.max(melody.len()),
                ..self.settings.engine
            },
        );
        engine.initialize()?;
        engine.set_volume(self.settings.volume);
        engine.set_reverb(self.settings.reverb);

        let mut starts: Vec<(u64, &str)> = melody
            .iter()
            .map(|event| (self.frame_at(event.time_offset_ms), event.note.as_str()))
            .collect();
        starts.sort_by_key(|(frame, _)| *frame);

        let last_start = starts.last().map(|(frame, _)| *frame).unwrap_or(0);
        let total_frames = last_start + self.tail_frames();

        let mut buffer = vec![(0.0, 0.0); RENDER_CHUNK];
        let mut position: u64 = 0;
        let mut next = 0;

        while position < total_frames {
            while let Some((frame, note)) = starts.get(next) {
                if *frame > position {
                    break;
                }
                engine.play_note(note, self.settings.octave);
                next += 1;
            }

            let until_next_note = starts
                .get(next)
                .map(|(frame, _)| frame - position)
                .unwrap_or(u64::MAX);
            let frames = (RENDER_CHUNK as u64)
                .min(total_frames - position)
                .min(until_next_note) as usize;

            renderer.render_into(&mut buffer[..frames]);
            write(&buffer[..frames])?;
            position += frames as u64;
        }

        Ok(total_frames)
    }

    /// Render the melody into memory
    pub fn render(&self, melody: &[RecordedNoteEvent]) -> Result<Vec<(f32, f32)>, ExportError> {
        let mut frames = Vec::new();
        self.render_with(melody, |chunk| {
            frames.extend_from_slice(chunk);
            Ok(())
        })?;
        Ok(frames)
    }

    /// Render the melody to a 16-bit stereo WAV file
    pub fn export_wav(&self, melody: &[RecordedNoteEvent], path: &Path) -> Result<u64, ExportError> {
        let spec = WavSpec {
            channels: 2,
            sample_rate: self.settings.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec)?;

        let frames = self.render_with(melody, |chunk| {
            for &frame in chunk {
                let (left, right) = soft_clip_frame(frame);
                writer.write_sample(f32_to_i16(left))?;
                writer.write_sample(f32_to_i16(right))?;
            }
            Ok(())
        })?;
        writer.finalize()?;

        info!(
            "Exported {} frames ({:.2}s) to {}",
            frames,
            frames as f64 / self.settings.sample_rate as f64,
            path.display()
        );
        Ok(frames)
    }
}
