// CPAL output sink - Real-time playback on the default output device
//
// # Format Support
//
// The device's preferred sample format is detected through
// `default_output_config()`. F32, I16 and U16 streams are supported; the mixer
// always renders f32 stereo and conversion happens while writing into the
// device buffer, without allocation.
//
// # Stream Limitations
//
// On macOS (CoreAudio) the `Stream` is neither Send nor Sync, so the sink must
// stay on the thread that created it. Stream errors are logged from the error
// callback; there is no automatic reconnection.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Host, SampleFormat, SizedSample, Stream, StreamConfig};
use log::{error, info};

use crate::audio::dsp_utils::soft_clip_frame;
use crate::audio::engine::{AudioSink, EngineError};
use crate::audio::format_conversion::write_stereo_to_interleaved_frame;
use crate::audio::mixer::Mixer;

/// Device chosen by `open`, waiting for its mixer
struct PreparedOutput {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
}

pub struct CpalSink {
    host: Host,
    prepared: Option<PreparedOutput>,
    /// Kept alive for as long as the sink; dropping it stops playback
    _stream: Option<Stream>,
}

impl CpalSink {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
            prepared: None,
            _stream: None,
        }
    }

    /// Build an output stream for sample type `T`
    ///
    /// The mixer moves into the data callback, which becomes its only owner.
    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        mut mixer: Mixer,
    ) -> Result<Stream, EngineError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let channels = config.channels as usize;

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // No allocations, no I/O, no blocking locks past this point
                    mixer.process_commands();
                    for frame in data.chunks_mut(channels) {
                        let output = soft_clip_frame(mixer.next_frame());
                        write_stereo_to_interleaved_frame(output, frame);
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| EngineError::Stream(e.to_string()))
    }
}

impl Default for CpalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for CpalSink {
    fn open(&mut self) -> Result<f32, EngineError> {
        let device = self
            .host
            .default_output_device()
            .ok_or(EngineError::NoDevice)?;

        info!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported_config = device
            .default_output_config()
            .map_err(|e| EngineError::Config(e.to_string()))?;
        info!("Audio config: {:?}", supported_config);

        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0 as f32;

        self.prepared = Some(PreparedOutput {
            device,
            config: supported_config.into(),
            sample_format,
        });
        Ok(sample_rate)
    }

    fn start(&mut self, mixer: Mixer) -> Result<(), EngineError> {
        let PreparedOutput {
            device,
            config,
            sample_format,
        } = self
            .prepared
            .take()
            .ok_or_else(|| EngineError::Stream("output not opened".to_string()))?;

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, mixer),
            SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, mixer),
            SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, mixer),
            other => Err(EngineError::UnsupportedFormat(format!(
                "{:?} (supported: F32, I16, U16)",
                other
            ))),
        }?;

        stream
            .play()
            .map_err(|e| EngineError::Stream(e.to_string()))?;

        info!(
            "Audio stream started: {} Hz, {} channels",
            config.sample_rate.0, config.channels
        );
        self._stream = Some(stream);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_requires_open() {
        use crate::audio::parameters::MixerParameters;
        use crate::messaging::channels::create_command_channel;
        use crate::synth::convolver::Convolver;
        use crate::synth::impulse::ImpulseResponse;

        let mut sink = CpalSink::new();
        let (_tx, rx) = create_command_channel(4);
        let convolver = Convolver::new(&ImpulseResponse::unit(44100.0), false);
        let mixer = Mixer::new(44100.0, convolver, MixerParameters::default(), rx);

        assert!(matches!(sink.start(mixer), Err(EngineError::Stream(_))));
        assert!(sink._stream.is_none());
    }
}
