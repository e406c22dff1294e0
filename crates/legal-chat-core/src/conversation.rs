//! Conversation state manager
//!
//! Owns the ordered message list and the single in-flight slot. The
//! conversation only ever grows: the seed greeting stays first and every
//! later message is appended. While a question is outstanding further
//! submissions are dropped, not queued.

use tracing::{debug, warn};

use crate::dispatch::{Answer, Dispatcher, Failure};
use crate::state::{Message, Role, GREETING};

/// A mutation, reported to observers right after it happens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    MessageAppended { index: usize, role: Role },
    PendingChanged(bool),
}

/// View-layer hook notified synchronously after every mutation.
pub trait ConversationObserver: Send {
    fn on_change(&mut self, change: &Change);
}

impl<F> ConversationObserver for F
where
    F: FnMut(&Change) + Send,
{
    fn on_change(&mut self, change: &Change) {
        self(change)
    }
}

pub struct Conversation {
    messages: Vec<Message>,
    pending: bool,
    observers: Vec<Box<dyn ConversationObserver>>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_greeting(GREETING)
    }

    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::assistant(greeting)],
            pending: false,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: impl ConversationObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Accept a submission. Returns the trimmed question the caller must
    /// dispatch, or `None` when the text is blank or a request is already
    /// in flight (both are silent no-ops).
    pub fn begin(&mut self, text: &str) -> Option<String> {
        let question = text.trim();
        if question.is_empty() {
            return None;
        }
        if self.pending {
            debug!("dropping submission while a request is in flight");
            return None;
        }

        self.append(Message::user(question));
        self.set_pending(true);
        Some(question.to_string())
    }

    /// Record the outcome of the outstanding request.
    pub fn settle(&mut self, result: Result<Answer, Failure>) {
        if !self.pending {
            warn!("settle called with no request in flight, ignoring");
            return;
        }

        let content = match result {
            Ok(answer) => answer.answer,
            Err(failure) => {
                warn!(
                    status = ?failure.status,
                    detail = ?failure.detail,
                    message = ?failure.message,
                    "question failed"
                );
                failure.user_text()
            }
        };

        self.append(Message::assistant(content));
        self.set_pending(false);
    }

    /// Submit, dispatch and settle in one go. Returns whether anything was
    /// dispatched.
    pub async fn submit(&mut self, text: &str, dispatcher: &dyn Dispatcher) -> bool {
        let Some(question) = self.begin(text) else {
            return false;
        };

        let result = dispatcher.ask(&question).await;
        self.settle(result);
        true
    }

    fn append(&mut self, message: Message) {
        let change = Change::MessageAppended {
            index: self.messages.len(),
            role: message.role(),
        };
        self.messages.push(message);
        self.notify(change);
    }

    fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
        self.notify(Change::PendingChanged(pending));
    }

    fn notify(&mut self, change: Change) {
        for observer in &mut self.observers {
            observer.on_change(&change);
        }
    }
}
