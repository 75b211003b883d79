//! HTTP client for the hosted backend.
//!
//! One [`HostedClient`] serves as both the auth provider and the data
//! service, so data requests carry the signed-in user's access token.

use crate::config::HostedConfig;
use crate::error::HostedError;
use crate::storage::SessionStorage;
use crate::wire::{
    PasswordGrant, RefreshGrant, TokenResponse, auth_error, data_error, query_pairs,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{RequestBuilder, Response};
use roofclaim_platform_access::{
    AuthProvider, DataError, DataService, Filter, ProviderError, Row, Session,
    SessionBroadcaster, SessionEvent, SessionSubscription,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, instrument, warn};

const APIKEY_HEADER: &str = "apikey";
const PREFER_HEADER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";

/// Client for the hosted auth and data APIs.
pub struct HostedClient {
    http: reqwest::Client,
    config: HostedConfig,
    session: RwLock<Option<Session>>,
    storage: Arc<dyn SessionStorage>,
    events: SessionBroadcaster,
    refreshing: tokio::sync::Mutex<()>,
}

impl HostedClient {
    /// Creates a client. No request is made until first use.
    pub fn new(
        config: HostedConfig,
        storage: Arc<dyn SessionStorage>,
    ) -> roofclaim_core::Result<Self, HostedError> {
        if !(config.url().starts_with("https://") || config.url().starts_with("http://")) {
            return Err(HostedError::InvalidConfig {
                field: "url",
                reason: format!("'{}' is not an http(s) URL", config.url()),
            }
            .into());
        }
        if config.anon_key().trim().is_empty() {
            return Err(HostedError::InvalidConfig {
                field: "anon_key",
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(config.timeout());
        let http = builder.build().map_err(|e| HostedError::ClientBuild {
            details: e.to_string(),
        })?;

        Ok(Self {
            http,
            config,
            session: RwLock::new(None),
            storage,
            events: SessionBroadcaster::new(),
            refreshing: tokio::sync::Mutex::new(()),
        })
    }

    #[must_use]
    pub fn config(&self) -> &HostedConfig {
        &self.config
    }

    /// Exchanges the refresh token for a new access token.
    #[instrument(skip(self))]
    pub async fn refresh_session(&self) -> Result<Session, ProviderError> {
        let refresh_token = self
            .cached()
            .and_then(|session| session.refresh_token().map(str::to_string))
            .ok_or_else(|| ProviderError::Rejected {
                status: 401,
                reason: "no refresh token".to_string(),
            })?;
        let session = self
            .grant(
                "refresh_token",
                &RefreshGrant {
                    refresh_token: &refresh_token,
                },
            )
            .await?;
        self.events.emit(SessionEvent::TokenRefreshed(session.clone()));
        Ok(session)
    }

    fn cached(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bearer token for requests: the user's access token, or the anon key
    /// when signed out.
    fn bearer(&self) -> String {
        self.cached().map_or_else(
            || self.config.anon_key().to_string(),
            |session| session.access_token().to_string(),
        )
    }

    /// Adds the apikey and bearer headers, refreshing an expired session
    /// first.
    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        if let Err(err) = self.ensure_fresh().await {
            warn!(error = %err, "Session refresh failed, sending current token");
        }
        request
            .header(APIKEY_HEADER, self.config.anon_key())
            .bearer_auth(self.bearer())
    }

    /// Replaces an expired cached session.
    ///
    /// A refused refresh, or an expired session without a refresh token,
    /// signs out locally and emits [`SessionEvent::SignedOut`]. Transport
    /// failures keep the session and are returned.
    async fn ensure_fresh(&self) -> Result<(), ProviderError> {
        let _refreshing = self.refreshing.lock().await;
        // Another request may have refreshed while this one waited.
        let Some(session) = self.cached() else {
            return Ok(());
        };
        if !session.is_expired() {
            return Ok(());
        }

        debug!(user_id = %session.user_id(), "Session expired, refreshing");
        if session.refresh_token().is_none() {
            self.expire();
            return Ok(());
        }
        match self.refresh_session().await {
            Ok(_) => Ok(()),
            Err(ProviderError::InvalidCredentials) => {
                self.expire();
                Ok(())
            }
            Err(ProviderError::Rejected { status, .. }) if (400..500).contains(&status) => {
                self.expire();
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn expire(&self) {
        info!("Session no longer valid, signing out locally");
        self.forget();
        self.events.emit(SessionEvent::SignedOut);
    }

    /// Stores the session in memory and in persistent storage.
    fn remember(&self, session: &Session) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        let saved = serde_json::to_string(session)
            .map_err(|e| ProviderError::Storage {
                reason: e.to_string(),
            })
            .and_then(|json| self.storage.save(&json));
        if let Err(err) = saved {
            warn!(error = %err, "Failed to persist session");
        }
    }

    fn forget(&self) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;
        if let Err(err) = self.storage.clear() {
            warn!(error = %err, "Failed to clear persisted session");
        }
    }

    /// Loads the persisted session. Unreadable entries are discarded.
    fn restore(&self) -> Result<Option<Session>, ProviderError> {
        let Some(json) = self.storage.load()? else {
            return Ok(None);
        };
        match serde_json::from_str::<Session>(&json) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                warn!(error = %err, "Discarding unreadable persisted session");
                self.forget();
                Ok(None)
            }
        }
    }

    async fn grant<B: Serialize + Sync>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> Result<Session, ProviderError> {
        let response = self
            .http
            .post(self.config.auth_endpoint("token"))
            .query(&[("grant_type", grant_type)])
            .header(APIKEY_HEADER, self.config.anon_key())
            .json(body)
            .send()
            .await
            .map_err(provider_network)?;
        let status = response.status();
        let text = response.text().await.map_err(provider_network)?;
        if !status.is_success() {
            let err = auth_error(status.as_u16(), &text);
            warn!(grant_type, status = status.as_u16(), error = %err, "Token grant refused");
            return Err(err);
        }
        let token: TokenResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::MalformedResponse {
                reason: e.to_string(),
            })?;
        let session = token.into_session(Utc::now())?;
        self.remember(&session);
        Ok(session)
    }

    async fn rows(&self, table: &str, response: Response) -> Result<Vec<Row>, DataError> {
        let status = response.status();
        let text = response.text().await.map_err(data_network)?;
        if !status.is_success() {
            let err = data_error(table, status.as_u16(), &text);
            warn!(table, status = status.as_u16(), error = %err, "Data request refused");
            return Err(err);
        }
        serde_json::from_str(&text).map_err(|e| DataError::MalformedResponse {
            reason: e.to_string(),
        })
    }
}

fn provider_network(err: reqwest::Error) -> ProviderError {
    ProviderError::Network {
        reason: err.to_string(),
    }
}

fn data_network(err: reqwest::Error) -> DataError {
    DataError::Network {
        reason: err.to_string(),
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl AuthProvider for HostedClient {
    #[instrument(skip(self))]
    async fn current_session(&self) -> Result<Option<Session>, ProviderError> {
        if self.cached().is_none() {
            match self.restore()? {
                Some(session) => {
                    *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
                }
                None => return Ok(None),
            }
        }
        self.ensure_fresh().await?;
        Ok(self.cached())
    }

    fn subscribe(&self) -> SessionSubscription {
        self.events.subscribe()
    }

    #[instrument(skip(self, secret))]
    async fn sign_in_with_password(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Session, ProviderError> {
        let session = self
            .grant(
                "password",
                &PasswordGrant {
                    email: identifier,
                    password: secret,
                },
            )
            .await?;
        info!(user_id = %session.user_id(), "Signed in");
        self.events.emit(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), ProviderError> {
        if let Some(session) = self.cached() {
            let response = self
                .http
                .post(self.config.auth_endpoint("logout"))
                .header(APIKEY_HEADER, self.config.anon_key())
                .bearer_auth(session.access_token())
                .send()
                .await
                .map_err(provider_network)?;
            let status = response.status().as_u16();
            // 401 and 404: the token is already gone server-side.
            if !response.status().is_success() && status != 401 && status != 404 {
                let text = response.text().await.map_err(provider_network)?;
                return Err(auth_error(status, &text));
            }
        }
        self.forget();
        self.events.emit(SessionEvent::SignedOut);
        info!("Signed out");
        Ok(())
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl DataService for HostedClient {
    #[instrument(skip(self, filter))]
    async fn read(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, DataError> {
        let request = self
            .http
            .get(self.config.table_endpoint(table))
            .query(&query_pairs(filter));
        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(data_network)?;
        let rows = self.rows(table, response).await?;
        debug!(count = rows.len(), "Read rows");
        Ok(rows)
    }

    #[instrument(skip(self, filter, patch))]
    async fn write(
        &self,
        table: &str,
        filter: &Filter,
        patch: Row,
    ) -> Result<Vec<Row>, DataError> {
        let request = self
            .http
            .patch(self.config.table_endpoint(table))
            .query(&query_pairs(filter))
            .header(PREFER_HEADER, RETURN_REPRESENTATION)
            .json(&patch);
        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(data_network)?;
        let rows = self.rows(table, response).await?;
        debug!(count = rows.len(), "Updated rows");
        Ok(rows)
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, DataError> {
        let request = self
            .http
            .post(self.config.table_endpoint(table))
            .header(PREFER_HEADER, RETURN_REPRESENTATION)
            .json(&rows);
        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(data_network)?;
        self.rows(table, response).await
    }

    #[instrument(skip(self, args))]
    async fn rpc(&self, function: &str, args: Row) -> Result<Value, DataError> {
        let request = self
            .http
            .post(self.config.rpc_endpoint(function))
            .json(&args);
        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(data_network)?;
        let status = response.status();
        let text = response.text().await.map_err(data_network)?;
        if !status.is_success() {
            return Err(data_error(function, status.as_u16(), &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| DataError::MalformedResponse {
            reason: e.to_string(),
        })
    }
}
