pub mod audio;
pub mod chat;
pub mod messages;
pub mod settings;
pub mod webhook;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum HookchatError {
    #[error("Microphone access denied: {0}")]
    CaptureDenied(String),

    #[error("Capture device unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("Capture error: {0}")]
    CaptureError(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Settings storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for HookchatError {
    fn from(e: std::io::Error) -> Self {
        HookchatError::IOError(e.to_string())
    }
}

impl From<reqwest::Error> for HookchatError {
    fn from(e: reqwest::Error) -> Self {
        HookchatError::TransportError(e.to_string())
    }
}

impl From<serde_json::Error> for HookchatError {
    fn from(e: serde_json::Error) -> Self {
        HookchatError::SerializationError(e.to_string())
    }
}

impl HookchatError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The user has to grant access or plug in a device
            HookchatError::CaptureDenied(_) => false,
            HookchatError::CaptureUnavailable(_) => false,
            HookchatError::CaptureError(_) => true,
            // Network hiccups are worth another try
            HookchatError::TransportError(_) => true,
            HookchatError::ConfigError(_) => false,
            HookchatError::StorageError(_) => true,
            HookchatError::IOError(_) => false,
            HookchatError::AudioProcessingError(_) => true,
            HookchatError::SerializationError(_) => false,
        }
    }

    /// Whether this error came from acquiring or running the microphone
    pub fn is_capture_failure(&self) -> bool {
        matches!(
            self,
            HookchatError::CaptureDenied(_)
                | HookchatError::CaptureUnavailable(_)
                | HookchatError::CaptureError(_)
        )
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            HookchatError::CaptureDenied(_) => {
                "Microphone access was denied. Please allow microphone access and try again."
                    .to_string()
            }
            HookchatError::CaptureUnavailable(_) => {
                "No microphone available. Please check your audio devices.".to_string()
            }
            HookchatError::CaptureError(_) => "Recording failed. Please try again.".to_string(),
            HookchatError::TransportError(_) => {
                "Could not reach the webhook. Please check the URL and your connection."
                    .to_string()
            }
            HookchatError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            HookchatError::StorageError(_) => {
                "Settings could not be saved. Changes apply to this session only.".to_string()
            }
            HookchatError::IOError(_) => "File system error occurred.".to_string(),
            HookchatError::AudioProcessingError(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
            HookchatError::SerializationError(_) => {
                "Data could not be encoded or decoded.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, HookchatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_failures_are_distinct() {
        assert!(HookchatError::CaptureDenied("nope".into()).is_capture_failure());
        assert!(HookchatError::CaptureUnavailable("none".into()).is_capture_failure());
        assert!(!HookchatError::TransportError("down".into()).is_capture_failure());
    }

    #[test]
    fn test_recoverability() {
        assert!(HookchatError::TransportError("timeout".into()).is_recoverable());
        assert!(!HookchatError::CaptureDenied("nope".into()).is_recoverable());
    }

    #[test]
    fn test_io_conversion() {
        let err: HookchatError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, HookchatError::IOError(_)));
    }
}
