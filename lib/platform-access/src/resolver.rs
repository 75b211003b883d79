//! Role resolution with lazy default provisioning.
//!
//! The role lives in the `role` column of the user's profile row. A user
//! without a stored role is assigned [`Role::default`] on first resolution;
//! the write only applies while the column is still null, so racing writers
//! leave a single durable assignment.

use crate::data::{DataService, Filter, Row};
use crate::error::RoleResolutionError;
use crate::notice::Notifier;
use crate::role::Role;
use roofclaim_core::{UserId, table};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

/// Column holding the role on the profile row.
pub const ROLE_COLUMN: &str = "role";

/// Key column of the profile row.
pub const ID_COLUMN: &str = "id";

/// Determines the role of an authenticated user.
pub struct RoleResolver {
    data: Arc<dyn DataService>,
    notifier: Notifier,
    /// Serializes resolutions so a read-then-write is never interleaved.
    serial: Mutex<()>,
}

impl RoleResolver {
    #[must_use]
    pub fn new(data: Arc<dyn DataService>, notifier: Notifier) -> Self {
        Self {
            data,
            notifier,
            serial: Mutex::new(()),
        }
    }

    /// Resolves the role for `user_id`.
    ///
    /// Never fails: any error is logged, reported as one error notice, and
    /// degrades to the default role.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn resolve(&self, user_id: &UserId) -> Role {
        let _serial = self.serial.lock().await;
        match self.try_resolve(user_id).await {
            Ok(role) => {
                debug!(%role, "Resolved role");
                role
            }
            Err(err) => {
                match &err {
                    RoleResolutionError::ReadFailed { .. }
                    | RoleResolutionError::DefaultNotPersisted { .. } => {
                        error!(error = %err, "Role resolution failed");
                    }
                    RoleResolutionError::ProfileMissing { .. }
                    | RoleResolutionError::UnrecognizedRole { .. } => {
                        warn!(error = %err, "Role resolution degraded");
                    }
                }
                self.notifier.error(err.user_message());
                Role::default()
            }
        }
    }

    async fn try_resolve(&self, user_id: &UserId) -> Result<Role, RoleResolutionError> {
        match self.read_stored(user_id).await? {
            Some(value) => parse_stored(user_id, value),
            None => self.provision_default(user_id).await,
        }
    }

    /// Reads the stored role value. `None` means null or absent.
    async fn read_stored(&self, user_id: &UserId) -> Result<Option<Value>, RoleResolutionError> {
        let filter = Filter::new()
            .eq(ID_COLUMN, user_id.as_str())
            .select(ROLE_COLUMN);
        let rows = self
            .data
            .read(table::USERS, &filter)
            .await
            .map_err(|e| RoleResolutionError::ReadFailed {
                user_id: user_id.clone(),
                reason: e.to_string(),
            })?;
        let Some(mut row) = rows.into_iter().next() else {
            return Err(RoleResolutionError::ProfileMissing {
                user_id: user_id.clone(),
            });
        };
        Ok(row.remove(ROLE_COLUMN).filter(|value| !value.is_null()))
    }

    async fn provision_default(&self, user_id: &UserId) -> Result<Role, RoleResolutionError> {
        let role = Role::default();
        let filter = Filter::new()
            .eq(ID_COLUMN, user_id.as_str())
            .is_null(ROLE_COLUMN);
        let mut patch = Row::new();
        patch.insert(ROLE_COLUMN.to_string(), Value::from(role.as_str()));

        let updated = self
            .data
            .write(table::USERS, &filter, patch)
            .await
            .map_err(|e| RoleResolutionError::DefaultNotPersisted {
                user_id: user_id.clone(),
                reason: e.to_string(),
            })?;

        if !updated.is_empty() {
            info!(%role, "Assigned default role");
            return Ok(role);
        }

        // Another writer set the role between our read and write.
        debug!("Default role not written, re-reading stored role");
        match self.read_stored(user_id).await? {
            Some(value) => parse_stored(user_id, value),
            None => Ok(role),
        }
    }
}

fn parse_stored(user_id: &UserId, value: Value) -> Result<Role, RoleResolutionError> {
    let unrecognized = |value: String| RoleResolutionError::UnrecognizedRole {
        user_id: user_id.clone(),
        value,
    };
    match value {
        Value::String(s) => s.parse().map_err(|_| unrecognized(s)),
        other => Err(unrecognized(other.to_string())),
    }
}
