//! The contract between the conversation and whatever answers questions.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::state::FALLBACK_ERROR;

/// Successful reply from the backend. Extra fields (the backend echoes the
/// question back) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Answer {
    pub answer: String,
}

impl Answer {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}

/// Any way a question can fail to produce an answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("chat request failed (status: {status:?}, detail: {detail:?}, message: {message:?})")]
pub struct Failure {
    /// Structured `detail` from the response body, if the backend sent one
    pub detail: Option<String>,
    /// HTTP status, when a response was received at all
    pub status: Option<u16>,
    /// Generic transport-level description
    pub message: Option<String>,
}

impl Failure {
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Text shown to the user in place of an answer. The structured detail
    /// wins over the generic message; blank strings count as missing.
    pub fn user_text(&self) -> String {
        if let Some(detail) = non_blank(&self.detail) {
            format!("Error: {}", detail)
        } else if let Some(message) = non_blank(&self.message) {
            format!("Error: {}", message)
        } else {
            FALLBACK_ERROR.to_string()
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Sends one question to the backend and waits for it to settle.
///
/// Implementations own any timeout policy; callers never retry.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn ask(&self, question: &str) -> Result<Answer, Failure>;
}
