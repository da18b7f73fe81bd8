//! Conversation flow: optimistic send and placeholder resolution
//!
//! A turn has a synchronous half and an asynchronous half. [`ChatSession::begin_turn`]
//! clears the draft, appends the user entry and its placeholder, and composes
//! the payload. [`Turn::complete`] performs the webhook call and resolves
//! exactly the placeholder captured at submit time, so overlapping turns that
//! finish out of order still land in the right entry.

use crate::chat::config::ClientConfig;
use crate::messages::{Artifact, ConversationStore, Draft, Message};
use crate::settings::Settings;
use crate::webhook::{decode, Payload, RequestComposer, Transport};
use crate::Result;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Reply used when no webhook is configured or the webhook cannot be reached
pub const DEMO_REPLY: &str =
    "Demo reply: no webhook answered this message. Set a webhook URL to connect your automation.";

/// Where a resolved reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Webhook { status: u16 },
    Unconfigured,
    TransportFailure,
}

#[derive(Debug, Clone)]
pub struct TurnResult {
    pub placeholder_id: Uuid,
    pub content: String,
    pub source: ReplySource,
    /// Whether the placeholder was still pending when the reply arrived
    pub applied: bool,
}

/// A submitted turn whose reply is still outstanding
pub struct Turn {
    store: ConversationStore,
    placeholder_id: Uuid,
    webhook_url: Option<String>,
    payload: Payload,
}

impl Turn {
    pub fn placeholder_id(&self) -> Uuid {
        self.placeholder_id
    }

    /// Send the payload and resolve this turn's placeholder.
    ///
    /// Never fails: a missing webhook or transport error resolves the
    /// placeholder with [`DEMO_REPLY`].
    pub async fn complete(self, transport: &dyn Transport) -> TurnResult {
        let Turn {
            store,
            placeholder_id,
            webhook_url,
            payload,
        } = self;

        let started = Instant::now();
        let (content, source) = match webhook_url {
            None => {
                warn!("No webhook configured, answering turn {} with demo reply", placeholder_id);
                (DEMO_REPLY.to_string(), ReplySource::Unconfigured)
            }
            Some(url) => match transport.post(&url, payload).await {
                Ok(response) => {
                    let content = decode(&response.body, response.content_type.as_deref());
                    (
                        content,
                        ReplySource::Webhook {
                            status: response.status,
                        },
                    )
                }
                Err(e) => {
                    warn!("Webhook call for turn {} failed: {}", placeholder_id, e);
                    (DEMO_REPLY.to_string(), ReplySource::TransportFailure)
                }
            },
        };

        let applied = store.resolve(placeholder_id, content.clone());
        info!(
            "Turn {} resolved via {:?} in {}ms",
            placeholder_id,
            source,
            started.elapsed().as_millis()
        );

        TurnResult {
            placeholder_id,
            content,
            source,
            applied,
        }
    }
}

pub struct ChatSession {
    settings: Settings,
    store: ConversationStore,
    composer: RequestComposer,
    transport: Arc<dyn Transport>,
    draft: Draft,
}

impl ChatSession {
    pub fn new(config: &ClientConfig, settings: Settings, transport: Arc<dyn Transport>) -> Self {
        info!("Chat session {} started", settings.session_id());
        Self {
            settings,
            store: ConversationStore::new(),
            composer: RequestComposer::new(&config.source_tag, &config.client_tag),
            transport,
            draft: Draft::default(),
        }
    }

    /// Shared handle to the conversation log
    pub fn store(&self) -> ConversationStore {
        self.store.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.store.get_all()
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.draft.text = text.into();
    }

    pub fn attach_image(&mut self, image: Artifact) {
        debug!("Attached image {} ({} bytes)", image.file_name, image.len());
        self.draft.image = Some(image);
    }

    pub fn attach_audio(&mut self, audio: Artifact) {
        debug!("Attached audio {} ({} bytes)", audio.file_name, audio.len());
        self.draft.audio = Some(audio);
    }

    /// Submit the current draft.
    ///
    /// Clears the draft, appends the user entry and its placeholder together,
    /// and returns the turn to complete. Returns `None` for an empty draft.
    pub fn begin_turn(&mut self) -> Option<Turn> {
        if self.draft.is_empty() {
            debug!("Ignoring empty draft");
            return None;
        }

        let draft = std::mem::take(&mut self.draft);
        let (user_id, placeholder_id) = self.store.append_turn(draft.display_text());

        let text = draft.text.trim().to_string();
        let payload = self
            .composer
            .compose(text, draft.image, draft.audio, self.settings.session_id());

        debug!(
            "Turn {} (user entry {}) submitted as {} payload",
            placeholder_id,
            user_id,
            payload.kind.as_str()
        );

        Some(Turn {
            store: self.store.clone(),
            placeholder_id,
            webhook_url: self.settings.configured_webhook_url().map(str::to_string),
            payload,
        })
    }

    /// Submit the draft and wait for its reply
    pub async fn send(&mut self) -> Option<TurnResult> {
        let turn = self.begin_turn()?;
        let transport = Arc::clone(&self.transport);
        Some(turn.complete(transport.as_ref()).await)
    }

    /// Submit the draft and complete it on a background task, leaving the
    /// session free to compose the next turn
    pub fn spawn_send(&mut self) -> Option<JoinHandle<TurnResult>> {
        let turn = self.begin_turn()?;
        let transport = Arc::clone(&self.transport);
        Some(tokio::spawn(async move { turn.complete(transport.as_ref()).await }))
    }

    pub fn session_id(&self) -> &str {
        self.settings.session_id()
    }

    pub fn webhook_url(&self) -> &str {
        self.settings.webhook_url()
    }

    pub fn set_webhook_url(&mut self, url: impl Into<String>) -> Result<()> {
        self.settings.set_webhook_url(url)
    }

    pub fn reset_webhook_url(&mut self) -> Result<()> {
        self.settings.reset_webhook_url()
    }
}
