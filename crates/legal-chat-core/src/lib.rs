pub mod client;
pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod state;

// Re-export main types for convenience
pub use client::{ChatClient, Health};
pub use config::Config;
pub use conversation::{Change, Conversation, ConversationObserver};
pub use dispatch::{Answer, Dispatcher, Failure};
pub use state::{Message, Role, FALLBACK_ERROR, GREETING};
