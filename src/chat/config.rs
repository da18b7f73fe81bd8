//! Configuration for the chat client
//!
//! Static, per-process settings. The user-editable values (webhook URL,
//! session id) live in [`crate::settings::Settings`].

use crate::{HookchatError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Value of the `source` form field
pub const DEFAULT_SOURCE_TAG: &str = "hookchat";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Sent as the `source` field of every request
    pub source_tag: String,

    /// Sent as `client` inside the metadata blob
    pub client_tag: String,

    /// Per-request timeout. `None` leaves it to the environment.
    pub request_timeout: Option<Duration>,

    /// Where settings are persisted. `None` uses the platform config dir.
    pub settings_path: Option<PathBuf>,

    /// Whether voice recording is offered
    pub enable_audio_input: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            source_tag: DEFAULT_SOURCE_TAG.to_string(),
            client_tag: format!("hookchat-cli/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: None,
            settings_path: None,
            enable_audio_input: true,
        }
    }
}

impl ClientConfig {
    pub fn with_source_tag(mut self, tag: impl Into<String>) -> Self {
        self.source_tag = tag.into();
        self
    }

    pub fn with_client_tag(mut self, tag: impl Into<String>) -> Self {
        self.client_tag = tag.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    /// Disable voice recording (text and image only)
    pub fn without_audio_input(mut self) -> Self {
        self.enable_audio_input = false;
        self
    }

    /// Resolved settings file location, if one can be determined
    pub fn settings_file(&self) -> Option<PathBuf> {
        self.settings_path.clone().or_else(|| {
            dirs::config_dir().map(|dir| dir.join("hookchat").join("settings.json"))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_tag.trim().is_empty() {
            return Err(HookchatError::ConfigError("Source tag must not be empty".into()));
        }
        if self.client_tag.trim().is_empty() {
            return Err(HookchatError::ConfigError("Client tag must not be empty".into()));
        }
        if self.request_timeout == Some(Duration::ZERO) {
            return Err(HookchatError::ConfigError("Request timeout must be positive".into()));
        }
        Ok(())
    }
}
