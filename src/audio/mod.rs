#[cfg(feature = "audio-io")]
pub mod input;
pub mod recorder;
pub mod wav;

#[cfg(feature = "audio-io")]
pub use input::MicrophoneSource;
pub use recorder::{
    CaptureSource, CaptureStream, RecordingController, RecordingState, UnavailableSource,
};
pub use wav::{encode_wav, WAV_MIME_TYPE};

/// The capture source for this build: the system microphone when audio I/O
/// is compiled in and enabled, otherwise a source that always reports the
/// device as unavailable.
pub fn default_capture_source(enable_audio_input: bool) -> Box<dyn CaptureSource> {
    #[cfg(feature = "audio-io")]
    if enable_audio_input {
        return Box::new(MicrophoneSource::new());
    }

    let _ = enable_audio_input;
    Box::new(UnavailableSource)
}
