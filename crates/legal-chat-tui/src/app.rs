use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use legal_chat_core::{
    Answer, Change, Conversation, ConversationObserver, Dispatcher, Failure, Health, Role,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::tui::AppEvent;

/// What the startup health check found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Checking,
    Online,
    Offline(String),
}

/// Marks the chat view dirty whenever the conversation changes, so the next
/// frame brings the newest row into view.
pub struct ScrollReactor {
    dirty: Arc<AtomicBool>,
}

impl ConversationObserver for ScrollReactor {
    fn on_change(&mut self, _change: &Change) {
        self.dirty.store(true, Ordering::Relaxed);
    }
}

/// Scroll position of the chat pane. `offset` eases toward `target` one
/// tick at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    pub offset: u16,
    pub height: u16,
    pub width: u16,
    target: u16,
    follow: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: 0,
            height: 0,
            width: 0,
            target: 0,
            follow: true,
        }
    }
}

impl Viewport {
    pub fn follow_latest(&mut self) {
        self.follow = true;
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    /// Clamp to the current content and, when following, aim at the bottom.
    pub fn sync(&mut self, content_height: u16) {
        let bottom = content_height.saturating_sub(self.height);
        if self.follow {
            self.target = bottom;
        }
        self.target = self.target.min(bottom);
        self.offset = self.offset.min(bottom);
    }

    /// One step of the smooth scroll: cover half the remaining distance.
    pub fn advance(&mut self) {
        if self.offset < self.target {
            self.offset += (self.target - self.offset).div_ceil(2);
        } else if self.offset > self.target {
            self.offset -= (self.offset - self.target).div_ceil(2);
        }
    }

    /// Manual scrolling jumps immediately and stops following new rows.
    pub fn scroll_by(&mut self, delta: i32) {
        self.follow = false;
        let offset = (i32::from(self.offset) + delta).clamp(0, i32::from(u16::MAX)) as u16;
        self.offset = offset;
        self.target = offset;
    }
}

pub struct App {
    pub should_quit: bool,
    pub conversation: Conversation,
    pub api_url: String,
    pub backend: BackendStatus,

    // Draft input, cursor counted in chars
    pub input: String,
    pub cursor: usize,

    pub viewport: Viewport,
    pub animation_frame: u8,

    dispatcher: Arc<dyn Dispatcher>,
    events: mpsc::UnboundedSender<AppEvent>,
    scroll_dirty: Arc<AtomicBool>,
}

impl App {
    pub fn new(
        greeting: &str,
        api_url: String,
        dispatcher: Arc<dyn Dispatcher>,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let scroll_dirty = Arc::new(AtomicBool::new(true));
        let mut conversation = Conversation::with_greeting(greeting);
        conversation.subscribe(ScrollReactor {
            dirty: scroll_dirty.clone(),
        });

        Self {
            should_quit: false,
            conversation,
            api_url,
            backend: BackendStatus::Checking,
            input: String::new(),
            cursor: 0,
            viewport: Viewport::default(),
            animation_frame: 0,
            dispatcher,
            events,
            scroll_dirty,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.conversation.is_pending()
    }

    /// Submit the draft. Blank drafts and submissions while a question is
    /// outstanding leave everything, including the draft, untouched.
    pub fn submit(&mut self) {
        let Some(question) = self.conversation.begin(&self.input) else {
            return;
        };

        self.input.clear();
        self.cursor = 0;
        info!(chars = question.chars().count(), "question submitted");

        let dispatcher = self.dispatcher.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = dispatcher.ask(&question).await;
            if events.send(AppEvent::Settled(result)).is_err() {
                debug!("event loop gone before the answer arrived");
            }
        });
    }

    pub fn settle(&mut self, result: Result<Answer, Failure>) {
        self.conversation.settle(result);
        self.animation_frame = 0;
    }

    pub fn set_backend_status(&mut self, result: Result<Health, String>) {
        self.backend = match result {
            Ok(health) if health.status == "ok" => BackendStatus::Online,
            Ok(health) => BackendStatus::Offline(health.status),
            Err(e) => {
                warn!(error = %e, url = %self.api_url, "backend health check failed");
                BackendStatus::Offline(e)
            }
        };
    }

    /// Tick animation frame and smooth scroll (called by Tick event)
    pub fn tick(&mut self) {
        if self.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.viewport.advance();
    }

    /// Record the chat pane's inner size and the number of rows it has to
    /// show, and pick up any pending scroll-to-latest request. Called once
    /// per frame by the renderer.
    pub fn sync_viewport(&mut self, width: u16, height: u16, content_rows: usize) {
        self.viewport.width = width;
        self.viewport.height = height;
        if self.scroll_dirty.swap(false, Ordering::Relaxed) {
            self.viewport.follow_latest();
        }
        let content_height = content_rows.min(u16::MAX as usize) as u16;
        self.viewport.sync(content_height);
    }

    pub fn role_label(role: Role) -> &'static str {
        match role {
            Role::User => "You:",
            Role::Assistant => "Assistant:",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use legal_chat_core::GREETING;

    struct EchoDispatcher;

    #[async_trait]
    impl Dispatcher for EchoDispatcher {
        async fn ask(&self, question: &str) -> Result<Answer, Failure> {
            Ok(Answer::new(format!("echo: {}", question)))
        }
    }

    fn test_app() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(
            GREETING,
            "http://localhost:5000/api".to_string(),
            Arc::new(EchoDispatcher),
            tx,
        );
        (app, rx)
    }

    #[tokio::test]
    async fn test_submit_clears_draft_and_settles_through_event() {
        let (mut app, mut rx) = test_app();
        app.input = "  What is Article 25?  ".to_string();
        app.cursor = app.input.chars().count();

        app.submit();
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
        assert!(app.is_pending());
        assert_eq!(app.conversation.len(), 2);

        match rx.recv().await {
            Some(AppEvent::Settled(result)) => app.settle(result),
            other => panic!("unexpected event: {:?}", other),
        }

        assert!(!app.is_pending());
        let last = app.conversation.last().unwrap();
        assert_eq!(last.role(), Role::Assistant);
        assert_eq!(last.content(), "echo: What is Article 25?");
    }

    #[tokio::test]
    async fn test_rejected_submission_keeps_draft() {
        let (mut app, _rx) = test_app();

        app.input = "   ".to_string();
        app.submit();
        assert_eq!(app.input, "   ");
        assert!(!app.is_pending());

        app.input = "first".to_string();
        app.submit();
        app.input = "second".to_string();
        app.submit();
        assert_eq!(app.input, "second");
        assert_eq!(app.conversation.len(), 2);
    }

    #[test]
    fn test_viewport_eases_to_bottom() {
        let mut viewport = Viewport {
            height: 10,
            ..Viewport::default()
        };
        viewport.sync(50);
        assert_eq!(viewport.offset, 0);

        let mut steps = 0;
        while viewport.offset != 40 {
            viewport.advance();
            steps += 1;
            assert!(steps < 20);
        }
        assert!(steps > 1);
    }

    #[test]
    fn test_manual_scroll_stops_following() {
        let mut viewport = Viewport {
            height: 10,
            ..Viewport::default()
        };
        viewport.sync(50);
        viewport.scroll_by(-3);
        assert!(!viewport.is_following());
        assert_eq!(viewport.offset, 0);

        viewport.scroll_by(100);
        viewport.sync(50);
        assert_eq!(viewport.offset, 40);

        viewport.follow_latest();
        viewport.sync(60);
        viewport.advance();
        assert!(viewport.offset > 40);
    }

    #[tokio::test]
    async fn test_conversation_change_requests_scroll() {
        let (mut app, _rx) = test_app();
        app.sync_viewport(40, 5, 20);
        app.viewport.scroll_by(-10);
        assert!(!app.viewport.is_following());

        app.input = "question".to_string();
        app.submit();
        app.sync_viewport(40, 5, 20);
        assert!(app.viewport.is_following());
    }

    #[test]
    fn test_health_status() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(GREETING, String::new(), Arc::new(EchoDispatcher), tx);
        assert_eq!(app.backend, BackendStatus::Checking);

        app.set_backend_status(Ok(Health {
            status: "ok".to_string(),
            message: "Legal RAG API is running".to_string(),
        }));
        assert_eq!(app.backend, BackendStatus::Online);

        app.set_backend_status(Err("connection refused".to_string()));
        assert_eq!(
            app.backend,
            BackendStatus::Offline("connection refused".to_string())
        );
    }
}
