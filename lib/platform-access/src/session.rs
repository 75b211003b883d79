//! Sessions issued by the hosted auth provider.
//!
//! The provider owns the session; the application only ever holds a
//! read-only copy that is replaced whenever the provider reports a change
//! (sign-in, token refresh) and dropped on sign-out.

use chrono::{DateTime, Utc};
use roofclaim_core::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Proof of authentication for one user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The authenticated user's ID.
    user_id: UserId,
    /// Bearer token presented to the hosted backend.
    access_token: String,
    /// Token used to obtain a new access token.
    refresh_token: Option<String>,
    /// Email the user signed in with, if the provider reported one.
    email: Option<String>,
    /// When the access token stops being accepted.
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates a session for the given user and access token.
    #[must_use]
    pub fn new(user_id: UserId, access_token: impl Into<String>) -> Self {
        Self {
            user_id,
            access_token: access_token.into(),
            refresh_token: None,
            email: None,
            expires_at: None,
        }
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: Option<String>) -> Self {
        self.refresh_token = refresh_token;
        self
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Sets the access token expiry.
    #[must_use]
    pub fn with_expires_at(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Returns the authenticated user's ID.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the refresh token, if present.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Returns the email address, if present.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns when the access token expires, if known.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns true if the access token has a known expiry in the past.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    /// Returns true if both sessions belong to the same user.
    #[must_use]
    pub fn same_user(&self, other: &Session) -> bool {
        self.user_id == other.user_id
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
