//! Voice recording lifecycle
//!
//! [`RecordingController`] is a two-state machine (Idle, Active) over an
//! exclusively owned capture stream. Stopping always releases the stream and
//! yields an owned audio [`Artifact`], even when nothing was captured.

use super::wav::{encode_wav, WAV_MIME_TYPE};
use crate::messages::Artifact;
use crate::{HookchatError, Result};
use tracing::{debug, info, warn};

pub const RECORDING_FILE_NAME: &str = "recording.wav";

/// An open capture stream. Dropping it releases the device.
pub trait CaptureStream {
    fn sample_rate(&self) -> u32;

    /// Stop capturing, release the device and return everything captured
    fn finish(self: Box<Self>) -> Vec<f32>;
}

/// Something that can open a capture stream (usually a microphone)
pub trait CaptureSource {
    /// Acquire the device. Errors leave nothing open.
    fn open(&mut self) -> Result<Box<dyn CaptureStream>>;
}

/// Source used when audio input is disabled or compiled out
#[derive(Debug, Default)]
pub struct UnavailableSource;

impl CaptureSource for UnavailableSource {
    fn open(&mut self) -> Result<Box<dyn CaptureStream>> {
        Err(HookchatError::CaptureUnavailable(
            "Audio input is disabled".to_string(),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Active,
}

pub struct RecordingController {
    source: Box<dyn CaptureSource>,
    stream: Option<Box<dyn CaptureStream>>,
}

impl RecordingController {
    pub fn new(source: Box<dyn CaptureSource>) -> Self {
        Self {
            source,
            stream: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        if self.stream.is_some() {
            RecordingState::Active
        } else {
            RecordingState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    /// Start recording. Does nothing if already active.
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            warn!("Already recording");
            return Ok(());
        }

        let stream = self.source.open()?;
        info!("Started recording at {} Hz", stream.sample_rate());
        self.stream = Some(stream);
        Ok(())
    }

    /// Stop recording and finalize the captured audio.
    ///
    /// Returns `Ok(None)` when idle. The stream is released before encoding,
    /// so an encoding failure still leaves the controller idle.
    pub fn stop(&mut self) -> Result<Option<Artifact>> {
        let Some(stream) = self.stream.take() else {
            debug!("Stop requested while idle");
            return Ok(None);
        };

        let sample_rate = stream.sample_rate();
        let samples = stream.finish();
        info!(
            "Stopped recording, {} samples ({:.2}s)",
            samples.len(),
            samples.len() as f32 / sample_rate.max(1) as f32
        );

        // No samples means no container either: the artifact is zero bytes
        let bytes = if samples.is_empty() {
            Vec::new()
        } else {
            encode_wav(&samples, sample_rate, 1)?
        };

        Ok(Some(Artifact::new(bytes, WAV_MIME_TYPE, RECORDING_FILE_NAME)))
    }

    /// Drop the active recording without producing an artifact
    pub fn cancel(&mut self) {
        if let Some(stream) = self.stream.take() {
            let discarded = stream.finish();
            info!("Recording cancelled, discarded {} samples", discarded.len());
        }
    }
}

impl Drop for RecordingController {
    fn drop(&mut self) {
        self.cancel();
    }
}
