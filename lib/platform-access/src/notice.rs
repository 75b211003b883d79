//! User-facing notices and navigation requests.
//!
//! Both are fire-and-forget broadcasts consumed by the view layer. A notice
//! emitted while nothing is subscribed is dropped.

use tokio::sync::broadcast;
use tracing::debug;

const NOTICE_CAPACITY: usize = 32;
const NAVIGATION_CAPACITY: usize = 8;

/// Whether a notice reports success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A short message for the notification surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    kind: NoticeKind,
    message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> NoticeKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

/// Publishes notices to the notification surface.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notice>,
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(NOTICE_CAPACITY);
        Self { sender }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(Notice::success(message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(Notice::error(message));
    }

    pub fn publish(&self, notice: Notice) {
        debug!(kind = ?notice.kind(), message = notice.message(), "Publishing notice");
        let _ = self.sender.send(notice);
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Requests the view layer to navigate to a path.
#[derive(Debug, Clone)]
pub struct Navigator {
    sender: broadcast::Sender<String>,
}

impl Navigator {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(NAVIGATION_CAPACITY);
        Self { sender }
    }

    pub fn navigate(&self, path: impl Into<String>) {
        let path = path.into();
        debug!(%path, "Requesting navigation");
        let _ = self.sender.send(path);
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}
