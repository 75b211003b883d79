//! The auth provider boundary.
//!
//! The hosted auth service is consumed through [`AuthProvider`]. Session
//! changes are pushed to subscribers through a broadcast channel; dropping a
//! [`SessionSubscription`] unsubscribes.

use crate::error::ProviderError;
use crate::session::Session;
use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

/// Buffered events per subscriber before the oldest are dropped.
const DEFAULT_EVENT_CAPACITY: usize = 16;

/// A change reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A user signed in.
    SignedIn(Session),
    /// The access token of the current session was renewed.
    TokenRefreshed(Session),
    /// The session ended (sign-out, expiry or revocation).
    SignedOut,
}

impl SessionEvent {
    /// Returns the session carried by the event, if any.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn(session) | Self::TokenRefreshed(session) => Some(session),
            Self::SignedOut => None,
        }
    }

    /// Consumes the event, returning its session.
    #[must_use]
    pub fn into_session(self) -> Option<Session> {
        match self {
            Self::SignedIn(session) | Self::TokenRefreshed(session) => Some(session),
            Self::SignedOut => None,
        }
    }

    /// Short name for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "signed_in",
            Self::TokenRefreshed(_) => "token_refreshed",
            Self::SignedOut => "signed_out",
        }
    }
}

/// Receiving end of the provider's change stream.
#[derive(Debug)]
pub struct SessionSubscription {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl SessionSubscription {
    /// Waits for the next event. Returns `None` once the provider is gone.
    ///
    /// A subscriber that falls behind skips to the oldest retained event;
    /// the newest state is never lost.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Session subscriber lagged behind provider events");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// Sending end of the change stream, owned by provider implementations.
#[derive(Debug, Clone)]
pub struct SessionBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionBroadcaster {
    /// Creates a broadcaster with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Creates a broadcaster buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Opens a new subscription.
    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Publishes an event to every current subscriber.
    pub fn emit(&self, event: SessionEvent) {
        // No subscribers is not an error: nothing is listening yet.
        let _ = self.sender.send(event);
    }
}

impl Default for SessionBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// The hosted authentication service.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait AuthProvider: Send + Sync {
    /// Returns the persisted session, if one exists.
    async fn current_session(&self) -> Result<Option<Session>, ProviderError>;

    /// Subscribes to sign-in, sign-out and token refresh notifications.
    fn subscribe(&self) -> SessionSubscription;

    /// Signs in with an identifier (email) and secret (password).
    async fn sign_in_with_password(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Session, ProviderError>;

    /// Ends the current session on the provider side.
    async fn sign_out(&self) -> Result<(), ProviderError>;
}
