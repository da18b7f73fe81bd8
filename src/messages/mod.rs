pub mod storage;
pub mod types;

pub use storage::ConversationStore;
pub use types::{Artifact, Draft, Message, MessageStatus, Role, PENDING_CONTENT};
