//! Error types for page operations and server functions.

use leptos::server_fn::error::ServerFnError;
use roofclaim_platform_access::DataError;
use std::fmt;

/// Errors raised while serving backend settings to the browser.
#[derive(Debug)]
pub enum SettingsError {
    /// The server was started without a usable backend configuration.
    Unavailable { details: String },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { details } => {
                write!(f, "backend settings unavailable: {}", details)
            }
        }
    }
}

impl SettingsError {
    /// Convert to a user-safe ServerFnError.
    pub fn into_server_error(self) -> ServerFnError {
        match &self {
            SettingsError::Unavailable { .. } => {
                ServerFnError::new("Backend is not configured")
            }
        }
    }
}

/// Errors raised by record pages.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordError {
    /// The backend was not reachable yet.
    NotConnected,
    /// Reading or writing a table failed.
    Data { table: String, details: String },
    /// A remote procedure failed.
    Rpc { function: String, details: String },
    /// The backend answered with rows of an unexpected shape.
    Malformed { table: String, details: String },
    /// A form field failed validation.
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "backend not connected"),
            Self::Data { table, details } => {
                write!(f, "request on '{}' failed: {}", table, details)
            }
            Self::Rpc { function, details } => {
                write!(f, "call to '{}' failed: {}", function, details)
            }
            Self::Malformed { table, details } => {
                write!(f, "unexpected rows from '{}': {}", table, details)
            }
            Self::Invalid { field, reason } => write!(f, "invalid {}: {}", field, reason),
        }
    }
}

impl std::error::Error for RecordError {}

impl RecordError {
    pub fn data(table: &str, err: DataError) -> Self {
        Self::Data {
            table: table.to_string(),
            details: err.to_string(),
        }
    }

    /// Message safe to show in the UI.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotConnected => "Still connecting. Please try again.".to_string(),
            Self::Data { table, .. } | Self::Malformed { table, .. } => {
                format!("Failed to load {}", table.replace('_', " "))
            }
            Self::Rpc { .. } => "Failed to load dashboard".to_string(),
            Self::Invalid { reason, .. } => reason.clone(),
        }
    }
}
