use super::recorder::{CaptureSource, CaptureStream};
use crate::{HookchatError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    BuildStreamError, Device, FromSample, PlayStreamError, Sample, SampleFormat, SizedSample,
    Stream, StreamConfig,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, error, info};

/// Default system microphone, opened fresh for every recording
#[derive(Debug, Default)]
pub struct MicrophoneSource;

impl MicrophoneSource {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureSource for MicrophoneSource {
    fn open(&mut self) -> Result<Box<dyn CaptureStream>> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| HookchatError::CaptureUnavailable("No input device available".into()))?;

        info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported = device.default_input_config().map_err(|e| {
            HookchatError::CaptureUnavailable(format!("Failed to get input config: {}", e))
        })?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();
        debug!("Input format: {:?}, {} channel(s)", sample_format, config.channels);

        let (samples_tx, samples_rx) = unbounded();
        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, samples_tx),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, samples_tx),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, samples_tx),
            SampleFormat::I32 => build_stream::<i32>(&device, &config, samples_tx),
            SampleFormat::U8 => build_stream::<u8>(&device, &config, samples_tx),
            other => {
                return Err(HookchatError::CaptureUnavailable(format!(
                    "Unsupported input sample format: {:?}",
                    other
                )))
            }
        }
        .map_err(build_error)?;

        // Dropping `stream` on this error path releases the device
        stream.play().map_err(play_error)?;

        Ok(Box::new(MicrophoneStream {
            stream,
            samples_rx,
            sample_rate: config.sample_rate.0,
        }))
    }
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    samples_tx: Sender<Vec<f32>>,
) -> std::result::Result<Stream, BuildStreamError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;

    let err_fn = |err| {
        error!("Audio input stream error: {}", err);
    };

    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            if let Err(e) = samples_tx.send(downmix(data, channels)) {
                debug!("Recording receiver gone: {}", e);
            }
        },
        err_fn,
        None,
    )
}

/// Interleaved frames of any sample type to mono f32
fn downmix<T>(data: &[T], channels: usize) -> Vec<f32>
where
    T: Sample,
    f32: FromSample<T>,
{
    let channels = channels.max(1);
    data.chunks(channels)
        .map(|frame| frame.iter().map(|&s| s.to_sample::<f32>()).sum::<f32>() / channels as f32)
        .collect()
}

// OS privacy refusals surface as backend-specific errors
fn build_error(e: BuildStreamError) -> HookchatError {
    match e {
        BuildStreamError::DeviceNotAvailable => {
            HookchatError::CaptureUnavailable("Input device not available".into())
        }
        BuildStreamError::BackendSpecific { err } => {
            HookchatError::CaptureDenied(format!("Failed to build input stream: {}", err))
        }
        other => HookchatError::CaptureError(format!("Failed to build input stream: {}", other)),
    }
}

fn play_error(e: PlayStreamError) -> HookchatError {
    match e {
        PlayStreamError::DeviceNotAvailable => {
            HookchatError::CaptureUnavailable("Input device not available".into())
        }
        other => HookchatError::CaptureDenied(format!("Failed to start input stream: {}", other)),
    }
}

struct MicrophoneStream {
    stream: Stream,
    samples_rx: Receiver<Vec<f32>>,
    sample_rate: u32,
}

impl CaptureStream for MicrophoneStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn finish(self: Box<Self>) -> Vec<f32> {
        let MicrophoneStream {
            stream, samples_rx, ..
        } = *self;

        // Release the device first so no more chunks arrive, then flush
        drop(stream);
        let samples: Vec<f32> = samples_rx.try_iter().flatten().collect();
        debug!("Flushed {} captured samples", samples.len());
        samples
    }
}
