use super::types::{Message, MessageStatus};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Ordered conversation log.
///
/// Append-only, except that each placeholder entry may have its content
/// replaced exactly once through [`ConversationStore::resolve`]. Clones share
/// the same log, so an in-flight turn can hold a handle while new turns are
/// appended.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Append an immutable user entry
    pub fn append_user(&self, content: impl Into<String>) -> Uuid {
        let message = Message::user(content);
        let id = message.id;
        self.messages.write().push(message);
        id
    }

    /// Append a pending assistant entry and return its id
    pub fn append_placeholder(&self) -> Uuid {
        let message = Message::placeholder();
        let id = message.id;
        self.messages.write().push(message);
        id
    }

    /// Append a user entry and its placeholder under a single write lock.
    ///
    /// Returns `(user_id, placeholder_id)`. Readers never observe the user
    /// entry without its placeholder.
    pub fn append_turn(&self, content: impl Into<String>) -> (Uuid, Uuid) {
        let user = Message::user(content);
        let placeholder = Message::placeholder();
        let ids = (user.id, placeholder.id);

        let mut messages = self.messages.write();
        messages.push(user);
        messages.push(placeholder);

        debug!("Appended turn {} -> placeholder {}", ids.0, ids.1);
        ids
    }

    /// Replace the content of a pending placeholder.
    ///
    /// Returns `false` and leaves the log untouched when the id is unknown or
    /// has already been resolved.
    pub fn resolve(&self, id: Uuid, content: impl Into<String>) -> bool {
        let mut messages = self.messages.write();

        match messages.iter_mut().find(|m| m.id == id) {
            Some(message) if message.status == MessageStatus::Pending => {
                message.content = content.into();
                message.status = MessageStatus::Final;
                debug!("Resolved placeholder {}", id);
                true
            }
            Some(_) => {
                warn!("Placeholder {} already resolved, ignoring", id);
                false
            }
            None => {
                warn!("No message with id {}, ignoring resolve", id);
                false
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Message> {
        self.messages.read().iter().find(|m| m.id == id).cloned()
    }

    pub fn get_all(&self) -> Vec<Message> {
        self.messages.read().clone()
    }

    pub fn last(&self) -> Option<Message> {
        self.messages.read().last().cloned()
    }

    /// Number of placeholders still waiting for a reply
    pub fn pending_count(&self) -> usize {
        self.messages.read().iter().filter(|m| m.is_pending()).count()
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
