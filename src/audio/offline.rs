// Offline sink - Pull-driven rendering without an audio device
//
// Used for WAV export and for tests. The sink keeps the mixer behind a shared
// handle; whoever holds an `OfflineRenderer` decides when frames are produced.

use std::sync::{Arc, Mutex};

use crate::audio::engine::{AudioSink, EngineError};
use crate::audio::mixer::Mixer;

/// Shared handle onto the mixer of an offline sink
#[derive(Clone, Default)]
pub struct OfflineRenderer {
    mixer: Arc<Mutex<Option<Mixer>>>,
}

impl OfflineRenderer {
    /// True once the engine has handed over its mixer
    pub fn is_running(&self) -> bool {
        self.mixer.lock().map(|m| m.is_some()).unwrap_or(false)
    }

    /// Render into `output`. Silence until the sink has been started.
    pub fn render_into(&self, output: &mut [(f32, f32)]) {
        match self.mixer.lock() {
            Ok(mut guard) => match guard.as_mut() {
                Some(mixer) => mixer.render(output),
                None => output.fill((0.0, 0.0)),
            },
            Err(_) => output.fill((0.0, 0.0)),
        }
    }

    pub fn render(&self, frames: usize) -> Vec<(f32, f32)> {
        let mut output = vec![(0.0, 0.0); frames];
        self.render_into(&mut output);
        output
    }

    pub fn active_voices(&self) -> usize {
        self.mixer
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(Mixer::active_voices))
            .unwrap_or(0)
    }
}

pub struct OfflineSink {
    sample_rate: f32,
    available: bool,
    open_count: usize,
    renderer: OfflineRenderer,
}

impl OfflineSink {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            available: true,
            open_count: 0,
            renderer: OfflineRenderer::default(),
        }
    }

    /// A sink whose `open` always fails, standing in for a missing device
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(44100.0)
        }
    }

    pub fn renderer(&self) -> OfflineRenderer {
        self.renderer.clone()
    }

    /// How many times the engine opened this sink
    pub fn open_count(&self) -> usize {
        self.open_count
    }
}

impl AudioSink for OfflineSink {
    fn open(&mut self) -> Result<f32, EngineError> {
        if !self.available {
            return Err(EngineError::NoDevice);
        }
        self.open_count += 1;
        Ok(self.sample_rate)
    }

    fn start(&mut self, mixer: Mixer) -> Result<(), EngineError> {
        let mut slot = self
            .renderer
            .mixer
            .lock()
            .map_err(|_| EngineError::Stream("offline renderer poisoned".to_string()))?;
        *slot = Some(mixer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::engine::{EngineSettings, Instrument, SynthEngine};
    use crate::synth::notes::OctaveShift;

    #[test]
    fn test_silence_before_start() {
        let sink = OfflineSink::new(8000.0);
        let renderer = sink.renderer();
        assert!(!renderer.is_running());
        assert!(renderer.render(64).iter().all(|&f| f == (0.0, 0.0)));
    }

    #[test]
    fn test_engine_drives_renderer() {
        let sink = OfflineSink::new(8000.0);
        let renderer = sink.renderer();
        let mut engine = SynthEngine::with_settings(
            sink,
            EngineSettings {
                impulse_duration_secs: 0.05,
                ..EngineSettings::default()
            },
        );
        engine.initialize().unwrap();
        assert!(renderer.is_running());

        engine.play_note("A4", OctaveShift::default());
        let out = renderer.render(400);
        assert_eq!(renderer.active_voices(), 1);
        assert!(out.iter().any(|&(l, _)| l.abs() > 0.1));
    }

    #[test]
    fn test_unavailable_sink_fails_open() {
        let mut sink = OfflineSink::unavailable();
        assert!(matches!(sink.open(), Err(EngineError::NoDevice)));
        assert_eq!(sink.open_count(), 0);
    }
}
