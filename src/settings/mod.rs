//! Persisted client settings: the webhook URL and the session identifier
//!
//! Values are read once from an injected [`KeyValueStore`] and written back
//! on every change.

pub mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore};

use crate::Result;
use tracing::{info, warn};
use uuid::Uuid;

/// Webhook used when none has been saved, and the target of a reset
pub const DEFAULT_WEBHOOK_URL: &str = "http://localhost:5678/webhook/chat";

pub const WEBHOOK_URL_KEY: &str = "webhook_url";
pub const SESSION_ID_KEY: &str = "session_id";

pub struct Settings {
    store: Box<dyn KeyValueStore>,
    webhook_url: String,
    session_id: String,
}

impl Settings {
    /// Load settings from `store`, filling in defaults for absent keys.
    ///
    /// A missing session id is generated and persisted immediately so it
    /// stays stable across restarts.
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        let webhook_url = store
            .get(WEBHOOK_URL_KEY)
            .unwrap_or_else(|| DEFAULT_WEBHOOK_URL.to_string());

        let mut settings = Self {
            session_id: String::new(),
            webhook_url,
            store,
        };

        settings.session_id = match settings.store.get(SESSION_ID_KEY) {
            Some(id) if !id.trim().is_empty() => id,
            _ => {
                let id = Uuid::new_v4().to_string();
                info!("Generated new session id {}", id);
                if let Err(e) = settings.store.set(SESSION_ID_KEY, &id) {
                    warn!("Failed to persist session id: {}", e);
                }
                id
            }
        };

        settings
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// The webhook URL, or `None` when it is blank
    pub fn configured_webhook_url(&self) -> Option<&str> {
        let url = self.webhook_url.trim();
        (!url.is_empty()).then_some(url)
    }

    /// Update the webhook URL. The new value applies even if persisting fails.
    pub fn set_webhook_url(&mut self, url: impl Into<String>) -> Result<()> {
        self.webhook_url = url.into();
        info!("Webhook URL set to {:?}", self.webhook_url);
        self.store.set(WEBHOOK_URL_KEY, &self.webhook_url)
    }

    pub fn reset_webhook_url(&mut self) -> Result<()> {
        self.set_webhook_url(DEFAULT_WEBHOOK_URL)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("webhook_url", &self.webhook_url)
            .field("session_id", &self.session_id)
            .finish()
    }
}
