//! In-memory fakes for the provider and data boundaries.

use crate::data::{DataService, Filter, Row};
use crate::error::{DataError, ProviderError};
use crate::provider::{AuthProvider, SessionBroadcaster, SessionEvent, SessionSubscription};
use crate::resolver::{ID_COLUMN, ROLE_COLUMN};
use crate::session::Session;
use crate::state::AuthState;
use async_trait::async_trait;
use roofclaim_core::{UserId, table};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, watch};

/// Waits until the published state satisfies `pred`.
pub(crate) async fn wait_until(
    rx: &mut watch::Receiver<AuthState>,
    pred: impl FnMut(&AuthState) -> bool,
) -> AuthState {
    let state = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("timed out waiting for auth state")
        .expect("session store dropped");
    AuthState::clone(&state)
}

/// Data service over in-memory tables.
#[derive(Default)]
pub(crate) struct MemoryData {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    reads: Mutex<HashMap<String, usize>>,
    writes: Mutex<HashMap<String, usize>>,
    read_failure: Mutex<Option<String>>,
    write_failure: Mutex<Option<String>>,
    /// `(user id, role)` stored just before the next write runs.
    racing_role: Mutex<Option<(String, String)>>,
    rpc_results: Mutex<HashMap<String, Value>>,
}

impl MemoryData {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_row(&self, table: &str, row: Value) {
        let Value::Object(row) = row else {
            panic!("row must be a JSON object");
        };
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    pub(crate) fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the non-null stored role of `user_id`.
    pub(crate) fn stored_role(&self, user_id: &str) -> Option<Value> {
        self.rows(table::USERS)
            .into_iter()
            .find(|row| row.get(ID_COLUMN) == Some(&Value::from(user_id)))
            .and_then(|mut row| row.remove(ROLE_COLUMN))
            .filter(|value| !value.is_null())
    }

    pub(crate) fn read_count(&self, table: &str) -> usize {
        self.reads.lock().unwrap().get(table).copied().unwrap_or(0)
    }

    /// Number of writes that changed at least one row.
    pub(crate) fn write_count(&self, table: &str) -> usize {
        self.writes.lock().unwrap().get(table).copied().unwrap_or(0)
    }

    pub(crate) fn fail_reads(&self, reason: &str) {
        *self.read_failure.lock().unwrap() = Some(reason.to_string());
    }

    pub(crate) fn fail_writes(&self, reason: &str) {
        *self.write_failure.lock().unwrap() = Some(reason.to_string());
    }

    /// Simulates another client assigning a role between a read and a write.
    pub(crate) fn set_role_before_next_write(&self, user_id: &str, role: &str) {
        *self.racing_role.lock().unwrap() = Some((user_id.to_string(), role.to_string()));
    }

    pub(crate) fn set_rpc_result(&self, function: &str, value: Value) {
        self.rpc_results
            .lock()
            .unwrap()
            .insert(function.to_string(), value);
    }

    fn apply_racing_role(&self) {
        let Some((user_id, role)) = self.racing_role.lock().unwrap().take() else {
            return;
        };
        let mut tables = self.tables.lock().unwrap();
        for row in tables.entry(table::USERS.to_string()).or_default() {
            if row.get(ID_COLUMN) == Some(&Value::from(user_id.as_str())) {
                row.insert(ROLE_COLUMN.to_string(), Value::from(role.as_str()));
            }
        }
    }
}

#[async_trait]
impl DataService for MemoryData {
    async fn read(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, DataError> {
        *self.reads.lock().unwrap().entry(table.to_string()).or_default() += 1;
        if let Some(reason) = self.read_failure.lock().unwrap().clone() {
            return Err(DataError::Network { reason });
        }
        Ok(self
            .rows(table)
            .into_iter()
            .filter(|row| filter.matches(row))
            .collect())
    }

    async fn write(
        &self,
        table: &str,
        filter: &Filter,
        patch: Row,
    ) -> Result<Vec<Row>, DataError> {
        if let Some(reason) = self.write_failure.lock().unwrap().clone() {
            return Err(DataError::Rejected {
                table: table.to_string(),
                status: 503,
                reason,
            });
        }
        self.apply_racing_role();

        let mut updated = Vec::new();
        let mut tables = self.tables.lock().unwrap();
        for row in tables.entry(table.to_string()).or_default() {
            if filter.matches(row) {
                for (column, value) in &patch {
                    row.insert(column.clone(), value.clone());
                }
                updated.push(row.clone());
            }
        }
        if !updated.is_empty() {
            *self.writes.lock().unwrap().entry(table.to_string()).or_default() += 1;
        }
        Ok(updated)
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, DataError> {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn rpc(&self, function: &str, _args: Row) -> Result<Value, DataError> {
        self.rpc_results
            .lock()
            .unwrap()
            .get(function)
            .cloned()
            .ok_or_else(|| DataError::Rejected {
                table: function.to_string(),
                status: 404,
                reason: "function not found".to_string(),
            })
    }
}

/// Auth provider with fixed accounts and controllable failures.
pub(crate) struct MemoryAuthProvider {
    broadcaster: SessionBroadcaster,
    accounts: Mutex<HashMap<String, (String, UserId)>>,
    current: Mutex<Option<Session>>,
    fetch_gate: Mutex<Option<Arc<Notify>>>,
    fetch_failure: Mutex<Option<ProviderError>>,
    sign_in_failure: Mutex<Option<ProviderError>>,
    sign_out_failure: Mutex<Option<ProviderError>>,
    fetch_count: Mutex<usize>,
}

impl MemoryAuthProvider {
    pub(crate) fn new() -> Self {
        Self {
            broadcaster: SessionBroadcaster::new(),
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            fetch_gate: Mutex::new(None),
            fetch_failure: Mutex::new(None),
            sign_in_failure: Mutex::new(None),
            sign_out_failure: Mutex::new(None),
            fetch_count: Mutex::new(0),
        }
    }

    pub(crate) fn with_account(self, email: &str, password: &str, user_id: &str) -> Self {
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            (password.to_string(), UserId::from(user_id)),
        );
        self
    }

    /// Starts with a persisted session for `user_id`.
    pub(crate) fn with_session(self, user_id: &str) -> Self {
        *self.current.lock().unwrap() = Some(session_for(user_id));
        self
    }

    /// Makes `current_session` wait until the returned gate is notified.
    pub(crate) fn gate_fetch(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.fetch_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub(crate) fn fail_fetch(&self, err: ProviderError) {
        *self.fetch_failure.lock().unwrap() = Some(err);
    }

    pub(crate) fn fail_sign_in(&self, err: ProviderError) {
        *self.sign_in_failure.lock().unwrap() = Some(err);
    }

    pub(crate) fn fail_sign_out(&self, err: ProviderError) {
        *self.sign_out_failure.lock().unwrap() = Some(err);
    }

    pub(crate) fn fetch_count(&self) -> usize {
        *self.fetch_count.lock().unwrap()
    }

    /// Pushes an event as if the hosted service had reported it.
    pub(crate) fn emit(&self, event: SessionEvent) {
        self.broadcaster.emit(event);
    }
}

pub(crate) fn session_for(user_id: &str) -> Session {
    Session::new(UserId::from(user_id), format!("token-{user_id}"))
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn current_session(&self) -> Result<Option<Session>, ProviderError> {
        *self.fetch_count.lock().unwrap() += 1;
        let gate = self.fetch_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(err) = self.fetch_failure.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.current.lock().unwrap().clone())
    }

    fn subscribe(&self) -> SessionSubscription {
        self.broadcaster.subscribe()
    }

    async fn sign_in_with_password(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Session, ProviderError> {
        if let Some(err) = self.sign_in_failure.lock().unwrap().clone() {
            return Err(err);
        }
        let user_id = match self.accounts.lock().unwrap().get(identifier) {
            Some((password, user_id)) if password == secret => user_id.clone(),
            _ => return Err(ProviderError::InvalidCredentials),
        };
        let session = session_for(user_id.as_str()).with_email(Some(identifier.to_string()));
        *self.current.lock().unwrap() = Some(session.clone());
        self.broadcaster.emit(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        if let Some(err) = self.sign_out_failure.lock().unwrap().clone() {
            return Err(err);
        }
        *self.current.lock().unwrap() = None;
        self.broadcaster.emit(SessionEvent::SignedOut);
        Ok(())
    }
}
