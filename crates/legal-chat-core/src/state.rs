//! UI-agnostic conversation types
//!
//! These are shared by every front end and don't depend on any terminal or
//! rendering framework.

use serde::{Deserialize, Serialize};

/// Seed message every conversation starts with.
pub const GREETING: &str = "Hello! I am your Legal Assistant. I can help you with questions about the Constitution of Pakistan. How may I assist you today?";

/// Shown when a failed request carries neither a detail nor a message.
pub const FALLBACK_ERROR: &str =
    "Sorry, I encountered an error while processing your question. Please try again later.";

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn in the conversation. Content is plain text and is never
/// interpreted as markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}
