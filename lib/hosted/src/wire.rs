//! Request and response shapes of the hosted auth and data APIs.

use chrono::{DateTime, Duration, Utc};
use roofclaim_core::UserId;
use roofclaim_platform_access::{Condition, DataError, Filter, ProviderError, Session};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a password grant.
#[derive(Debug, Serialize)]
pub(crate) struct PasswordGrant<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of a refresh grant.
#[derive(Debug, Serialize)]
pub(crate) struct RefreshGrant<'a> {
    pub refresh_token: &'a str,
}

/// The authenticated user as reported by the auth API.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Successful token grant.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Absolute expiry as a unix timestamp; preferred over `expires_in`.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: WireUser,
}

impl TokenResponse {
    /// Converts the grant into a session, computing expiry from `now`.
    pub(crate) fn into_session(self, now: DateTime<Utc>) -> Result<Session, ProviderError> {
        let user_id: UserId = self
            .user
            .id
            .parse()
            .map_err(|e| ProviderError::MalformedResponse {
                reason: format!("user id: {e}"),
            })?;
        let expires_at = match (self.expires_at, self.expires_in) {
            (Some(at), _) => DateTime::from_timestamp(at, 0),
            (None, Some(seconds)) => Some(now + Duration::seconds(seconds)),
            (None, None) => None,
        };
        Ok(Session::new(user_id, self.access_token)
            .with_refresh_token(self.refresh_token)
            .with_email(self.user.email)
            .with_expires_at(expires_at))
    }
}

/// Error body of either API. Field names differ between versions.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    pub(crate) fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn code(&self) -> Option<&str> {
        self.error_code.as_deref().or(self.error.as_deref())
    }

    /// Human readable reason, falling back to the raw body.
    fn reason(&self, raw: &str) -> String {
        self.error_description
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.message.as_deref())
            .or(self.error.as_deref())
            .unwrap_or(raw)
            .to_string()
    }
}

/// Maps a failed auth API response to a provider error.
pub(crate) fn auth_error(status: u16, body: &str) -> ProviderError {
    let parsed = ErrorBody::parse(body);
    let bad_credentials = matches!(
        parsed.code(),
        Some("invalid_grant" | "invalid_credentials")
    );
    if bad_credentials && (status == 400 || status == 401) {
        return ProviderError::InvalidCredentials;
    }
    ProviderError::Rejected {
        status,
        reason: parsed.reason(body),
    }
}

/// Maps a failed data API response to a data error.
pub(crate) fn data_error(table: &str, status: u16, body: &str) -> DataError {
    if status == 401 || status == 403 {
        return DataError::Unauthorized {
            table: table.to_string(),
        };
    }
    DataError::Rejected {
        table: table.to_string(),
        status,
        reason: ErrorBody::parse(body).reason(body),
    }
}

/// Renders a filter value the way the data API expects it in a query string.
fn operand(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Encodes `filter` as query parameters.
pub(crate) fn query_pairs(filter: &Filter) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = filter
        .conditions()
        .iter()
        .map(|condition| match condition {
            Condition::Eq { column, value } if value.is_null() => {
                (column.clone(), "is.null".to_string())
            }
            Condition::Eq { column, value } => (column.clone(), format!("eq.{}", operand(value))),
            Condition::IsNull { column } => (column.clone(), "is.null".to_string()),
        })
        .collect();
    if let Some(select) = filter.selection() {
        pairs.push(("select".to_string(), select.replace(' ', "")));
    }
    if let Some((column, direction)) = filter.ordering() {
        pairs.push(("order".to_string(), format!("{column}.{}", direction.as_str())));
    }
    pairs
}
