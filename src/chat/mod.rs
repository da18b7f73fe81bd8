pub mod config;
pub mod session;

pub use config::ClientConfig;
pub use session::{ChatSession, ReplySource, Turn, TurnResult, DEMO_REPLY};
