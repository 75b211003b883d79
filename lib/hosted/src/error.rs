//! Hosted client error types.

use std::fmt;

/// Errors raised while setting up the hosted client.
///
/// Request failures are reported through the access layer's
/// `ProviderError` and `DataError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostedError {
    /// A configuration value is unusable.
    InvalidConfig {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
    /// The HTTP client could not be built.
    ClientBuild {
        /// Error details.
        details: String,
    },
}

impl fmt::Display for HostedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { field, reason } => {
                write!(f, "invalid hosted backend setting '{field}': {reason}")
            }
            Self::ClientBuild { details } => {
                write!(f, "failed to build HTTP client: {details}")
            }
        }
    }
}

impl std::error::Error for HostedError {}
