//! Device playback using cpal
//!
//! Opens the default output device at the queue's sample rate and channel
//! count and pulls from a [`SampleReader`] inside the cpal callback. Dropping
//! the [`AudioOutput`] withdraws the callback and releases the reader back to
//! its queue.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error};

use crate::queue::SampleReader;

/// Errors opening or controlling the output stream
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("no audio output device available")]
    NoDevice,

    #[error("failed to get default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to play audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("failed to pause audio stream: {0}")]
    PauseStream(#[from] cpal::PauseStreamError),

    #[error("unsupported sample format: {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),
}

/// Running cpal stream fed by a sound queue reader
pub struct AudioOutput {
    /// The cpal stream (owns the callback and the reader)
    stream: cpal::Stream,
    sample_rate: u32,
    channels: u16,
}

impl AudioOutput {
    /// Start playback on the default output device.
    pub fn start(reader: SampleReader) -> Result<Self, OutputError> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or(OutputError::NoDevice)?;

        // Only the device's native sample format is taken from its default
        // config; rate and layout come from the queue.
        let sample_format = device.default_output_config()?.sample_format();
        let format = reader.format();
        let config = cpal::StreamConfig {
            channels: format.channels(),
            sample_rate: cpal::SampleRate(format.sample_rate()),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, reader)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, reader)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, reader)?,
            other => return Err(OutputError::UnsupportedFormat(other)),
        };

        stream.play()?;

        debug!(
            "Audio stream started: {}Hz, {} channel(s), {:?}",
            format.sample_rate(),
            format.channels(),
            sample_format
        );

        Ok(Self {
            stream,
            sample_rate: format.sample_rate(),
            channels: format.channels(),
        })
    }

    /// Suspend the callback without releasing the reader
    pub fn pause(&self) -> Result<(), OutputError> {
        self.stream.pause()?;
        Ok(())
    }

    /// Resume a paused stream
    pub fn resume(&self) -> Result<(), OutputError> {
        self.stream.play()?;
        Ok(())
    }

    /// Output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Output channel count
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

fn build_stream<S>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut reader: SampleReader,
) -> Result<cpal::Stream, OutputError>
where
    S: crate::queue::OutputSample + cpal::SizedSample,
{
    let stream = device.build_output_stream(
        config,
        move |data: &mut [S], _: &cpal::OutputCallbackInfo| {
            reader.pull_into(data);
        },
        |err| error!("Audio stream error: {}", err),
        None,
    )?;
    Ok(stream)
}
