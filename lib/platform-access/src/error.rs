//! Error types for the platform-access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `ProviderError`: failures reported by the auth provider boundary
//! - `DataError`: failures reported by the data service boundary
//! - `SessionFetchError`: the initial session fetch failed (recoverable)
//! - `RoleResolutionError`: a role could not be resolved (recoverable)
//! - `AuthError`: login, logout and profile update failures

use roofclaim_core::UserId;
use std::fmt;

/// Errors from the auth provider boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The identifier/secret pair was not accepted.
    InvalidCredentials,
    /// The provider could not be reached.
    Network { reason: String },
    /// The provider answered with an error status.
    Rejected { status: u16, reason: String },
    /// The provider answered with a body that could not be understood.
    MalformedResponse { reason: String },
    /// Locally persisted session state could not be read or written.
    Storage { reason: String },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid login credentials"),
            Self::Network { reason } => write!(f, "auth provider unreachable: {reason}"),
            Self::Rejected { status, reason } => {
                write!(f, "auth provider rejected request ({status}): {reason}")
            }
            Self::MalformedResponse { reason } => {
                write!(f, "malformed auth provider response: {reason}")
            }
            Self::Storage { reason } => write!(f, "session storage error: {reason}"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Errors from the data service boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// The data service could not be reached.
    Network { reason: String },
    /// The request was refused for lack of a valid session.
    Unauthorized { table: String },
    /// The data service answered with an error status.
    Rejected {
        table: String,
        status: u16,
        reason: String,
    },
    /// The data service answered with a body that could not be understood.
    MalformedResponse { reason: String },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network { reason } => write!(f, "data service unreachable: {reason}"),
            Self::Unauthorized { table } => write!(f, "not authorized to access '{table}'"),
            Self::Rejected {
                table,
                status,
                reason,
            } => write!(f, "request on '{table}' rejected ({status}): {reason}"),
            Self::MalformedResponse { reason } => {
                write!(f, "malformed data service response: {reason}")
            }
        }
    }
}

impl std::error::Error for DataError {}

/// The persisted session could not be fetched at startup.
///
/// The application continues signed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionFetchError {
    /// The provider failed to report the current session.
    Provider(ProviderError),
}

impl SessionFetchError {
    /// Message shown on the notification surface.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        "Failed to fetch user session"
    }
}

impl fmt::Display for SessionFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider(err) => write!(f, "failed to fetch session: {err}"),
        }
    }
}

impl std::error::Error for SessionFetchError {}

impl From<ProviderError> for SessionFetchError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

/// A role could not be resolved or provisioned.
///
/// Resolution degrades to the default role instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleResolutionError {
    /// The profile row could not be read.
    ReadFailed { user_id: UserId, reason: String },
    /// No profile row exists for the user.
    ProfileMissing { user_id: UserId },
    /// The stored value is not a known role.
    UnrecognizedRole { user_id: UserId, value: String },
    /// The default role was assigned in memory but could not be stored.
    DefaultNotPersisted { user_id: UserId, reason: String },
}

impl RoleResolutionError {
    /// Message shown on the notification surface.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::DefaultNotPersisted { .. } => "Failed to save default user role",
            _ => "Failed to fetch user role",
        }
    }
}

impl fmt::Display for RoleResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed { user_id, reason } => {
                write!(f, "failed to read role for user {user_id}: {reason}")
            }
            Self::ProfileMissing { user_id } => {
                write!(f, "no profile row for user {user_id}")
            }
            Self::UnrecognizedRole { user_id, value } => {
                write!(f, "user {user_id} has unrecognized role {value}")
            }
            Self::DefaultNotPersisted { user_id, reason } => {
                write!(f, "failed to store default role for user {user_id}: {reason}")
            }
        }
    }
}

impl std::error::Error for RoleResolutionError {}

/// Errors surfaced to callers of the auth context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Login was refused by the provider.
    InvalidCredentials,
    /// Login failed for a reason other than bad credentials.
    LoginFailed { reason: String },
    /// The provider did not confirm sign-out; the session is still live.
    LogoutFailed { reason: String },
    /// The operation needs a signed-in user.
    NotAuthenticated,
    /// A profile update tried to change a field owned elsewhere.
    ProtectedField { field: String },
    /// The backend refused the profile update.
    ProfileUpdateFailed { reason: String },
}

impl AuthError {
    pub(crate) fn from_login(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidCredentials => Self::InvalidCredentials,
            other => Self::LoginFailed {
                reason: other.to_string(),
            },
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid email or password"),
            Self::LoginFailed { reason } => write!(f, "login failed: {reason}"),
            Self::LogoutFailed { reason } => write!(f, "logout failed: {reason}"),
            Self::NotAuthenticated => write!(f, "user is not authenticated"),
            Self::ProtectedField { field } => {
                write!(f, "field '{field}' cannot be changed through a profile update")
            }
            Self::ProfileUpdateFailed { reason } => {
                write!(f, "profile update failed: {reason}")
            }
        }
    }
}

impl std::error::Error for AuthError {}
