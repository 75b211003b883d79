//! The session store and the task that drives it.
//!
//! [`SessionStore`] owns the published [`AuthState`]. It is mutated from a
//! single [`SessionDriver`] that performs the initial session fetch and
//! then applies provider events in the order they arrive, plus direct
//! clears on confirmed logout.

use crate::cache::QueryCache;
use crate::error::SessionFetchError;
use crate::notice::Notifier;
use crate::provider::{AuthProvider, SessionEvent, SessionSubscription};
use crate::resolver::RoleResolver;
use crate::session::Session;
use crate::state::AuthState;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument};

/// Holds the current session and role and publishes every change.
pub struct SessionStore {
    state: watch::Sender<AuthState>,
    resolver: RoleResolver,
    cache: QueryCache,
    notifier: Notifier,
}

impl SessionStore {
    #[must_use]
    pub fn new(resolver: RoleResolver, cache: QueryCache, notifier: Notifier) -> Self {
        let (state, _) = watch::channel(AuthState::initial());
        Self {
            state,
            resolver,
            cache,
            notifier,
        }
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Fetches the persisted session and ends the loading phase.
    ///
    /// Loading ends only after the fetch and any role resolution it
    /// triggers. A failed fetch leaves the store signed out.
    #[instrument(skip_all)]
    pub async fn initialize(&self, provider: &dyn AuthProvider) {
        match provider.current_session().await {
            Ok(Some(session)) => {
                debug!(user_id = %session.user_id(), "Restored persisted session");
                self.store_session(session).await;
            }
            Ok(None) => debug!("No persisted session"),
            Err(err) => {
                let err = SessionFetchError::from(err);
                error!(error = %err, "Initial session fetch failed");
                self.notifier.error(err.user_message());
            }
        }
        self.state.send_modify(AuthState::finish_loading);
        info!(
            authenticated = self.state.borrow().is_authenticated(),
            "Session loading finished"
        );
    }

    /// Applies one provider event.
    #[instrument(skip_all, fields(event = event.kind()))]
    pub async fn apply(&self, event: SessionEvent) {
        match event.into_session() {
            Some(session) => self.store_session(session).await,
            None => self.clear(),
        }
    }

    /// Drops session and role and invalidates identity-scoped reads.
    pub fn clear(&self) {
        self.state.send_modify(AuthState::clear);
        self.cache.invalidate_user();
    }

    async fn store_session(&self, session: Session) {
        let user_id = session.user_id().clone();
        let mut needs_role = false;
        self.state.send_modify(|state| {
            needs_role = !state.has_role_for(&user_id);
            state.replace_session(session);
        });
        self.cache.invalidate_user();

        if !needs_role {
            debug!(%user_id, "Session refreshed for user with resolved role");
            return;
        }

        let role = self.resolver.resolve(&user_id).await;
        let applied = self
            .state
            .send_if_modified(|state| state.assign_role(&user_id, role));
        if !applied {
            debug!(%user_id, %role, "Discarded role for a session that is no longer current");
        }
    }
}

/// Single consumer of provider events.
///
/// Created together with the auth context; the caller spawns [`run`]
/// on its executor. Dropping the driver stops all session tracking.
///
/// [`run`]: SessionDriver::run
pub struct SessionDriver {
    store: Arc<SessionStore>,
    provider: Arc<dyn AuthProvider>,
    subscription: SessionSubscription,
}

impl SessionDriver {
    /// The subscription must be opened before [`run`](Self::run) so that
    /// events raised during the initial fetch are buffered.
    pub(crate) fn new(
        store: Arc<SessionStore>,
        provider: Arc<dyn AuthProvider>,
        subscription: SessionSubscription,
    ) -> Self {
        Self {
            store,
            provider,
            subscription,
        }
    }

    /// Runs the initial fetch, then applies events until the provider closes
    /// its change stream.
    pub async fn run(mut self) {
        self.store.initialize(self.provider.as_ref()).await;
        while let Some(event) = self.subscription.next().await {
            self.store.apply(event).await;
        }
        debug!("Session change stream closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QueryKey;
    use crate::error::ProviderError;
    use crate::notice::Notice;
    use crate::role::Role;
    use crate::test_support::{MemoryAuthProvider, MemoryData, session_for, wait_until};
    use roofclaim_core::{UserId, table};
    use serde_json::json;
    use tokio::sync::broadcast;

    struct Harness {
        store: Arc<SessionStore>,
        provider: Arc<MemoryAuthProvider>,
        data: Arc<MemoryData>,
        notices: broadcast::Receiver<Notice>,
        cache: QueryCache,
    }

    fn harness(provider: MemoryAuthProvider) -> (Harness, SessionDriver) {
        let provider = Arc::new(provider);
        let data = Arc::new(MemoryData::new());
        data.insert_row(table::USERS, json!({"id": "u1", "role": "admin"}));
        data.insert_row(table::USERS, json!({"id": "u2", "role": null}));

        let notifier = Notifier::new();
        let notices = notifier.subscribe();
        let cache = QueryCache::new();
        let resolver = RoleResolver::new(data.clone(), notifier.clone());
        let store = Arc::new(SessionStore::new(resolver, cache.clone(), notifier));
        let driver = SessionDriver::new(store.clone(), provider.clone(), provider.subscribe());
        (
            Harness {
                store,
                provider,
                data,
                notices,
                cache,
            },
            driver,
        )
    }

    #[tokio::test]
    async fn no_persisted_session_finishes_signed_out() {
        let (h, driver) = harness(MemoryAuthProvider::new());
        let mut rx = h.store.subscribe();
        tokio::spawn(driver.run());

        let state = wait_until(&mut rx, |s| !s.is_loading()).await;
        assert!(state.session().is_none());
        assert!(state.role().is_none());
    }

    #[tokio::test]
    async fn persisted_session_resolves_role_before_loading_ends() {
        let (h, driver) = harness(MemoryAuthProvider::new().with_session("u1"));
        let mut rx = h.store.subscribe();
        tokio::spawn(driver.run());

        let state = wait_until(&mut rx, |s| !s.is_loading()).await;
        assert_eq!(state.user_id(), Some(&UserId::from("u1")));
        assert_eq!(state.role(), Some(Role::Admin));
    }

    #[tokio::test]
    async fn failed_fetch_degrades_to_signed_out_with_one_notice() {
        let provider = MemoryAuthProvider::new().with_session("u1");
        provider.fail_fetch(ProviderError::Network {
            reason: "offline".to_string(),
        });
        let (mut h, driver) = harness(provider);
        let mut rx = h.store.subscribe();
        tokio::spawn(driver.run());

        let state = wait_until(&mut rx, |s| !s.is_loading()).await;
        assert!(state.session().is_none());
        assert!(state.role().is_none());
        let notice = h.notices.try_recv().expect("one notice");
        assert_eq!(notice.message(), "Failed to fetch user session");
        assert!(h.notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn sign_out_event_clears_session_and_role() {
        let (h, driver) = harness(MemoryAuthProvider::new().with_session("u1"));
        let mut rx = h.store.subscribe();
        tokio::spawn(driver.run());
        wait_until(&mut rx, |s| s.role().is_some()).await;

        h.provider.emit(SessionEvent::SignedOut);
        let state = wait_until(&mut rx, |s| s.session().is_none()).await;
        assert!(state.role().is_none());
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn event_during_initial_fetch_resolves_role_once() {
        let provider = MemoryAuthProvider::new().with_session("u2");
        let gate = provider.gate_fetch();
        let (h, driver) = harness(provider);
        let mut rx = h.store.subscribe();
        tokio::spawn(driver.run());

        h.provider.emit(SessionEvent::SignedIn(session_for("u2")));
        gate.notify_one();

        let state = wait_until(&mut rx, |s| !s.is_loading()).await;
        assert_eq!(state.role(), Some(Role::Customer));

        // Events apply in order, so the buffered sign-in has been handled
        // once the sign-out is visible.
        h.provider.emit(SessionEvent::SignedOut);
        wait_until(&mut rx, |s| s.session().is_none()).await;
        assert_eq!(h.data.read_count(table::USERS), 1);
        assert_eq!(h.data.write_count(table::USERS), 1);
    }

    #[tokio::test]
    async fn event_after_initial_fetch_keeps_resolved_role() {
        let (h, driver) = harness(MemoryAuthProvider::new().with_session("u2"));
        let mut rx = h.store.subscribe();
        tokio::spawn(driver.run());
        let state = wait_until(&mut rx, |s| !s.is_loading()).await;
        assert_eq!(state.role(), Some(Role::Customer));

        h.provider.emit(SessionEvent::SignedIn(session_for("u2")));
        h.provider.emit(SessionEvent::SignedOut);
        wait_until(&mut rx, |s| s.session().is_none()).await;
        assert_eq!(h.data.read_count(table::USERS), 1);
        assert_eq!(h.data.stored_role("u2"), Some(json!("customer")));
    }

    #[tokio::test]
    async fn token_refresh_keeps_role_and_updates_token() {
        let (h, driver) = harness(MemoryAuthProvider::new().with_session("u1"));
        let mut rx = h.store.subscribe();
        tokio::spawn(driver.run());
        wait_until(&mut rx, |s| s.role().is_some()).await;

        let refreshed = Session::new(UserId::from("u1"), "rotated");
        h.provider.emit(SessionEvent::TokenRefreshed(refreshed));
        let state = wait_until(&mut rx, |s| {
            s.session().map(Session::access_token) == Some("rotated")
        })
        .await;
        assert_eq!(state.role(), Some(Role::Admin));
        assert_eq!(h.data.read_count(table::USERS), 1);
    }

    #[tokio::test]
    async fn switching_users_resolves_the_new_role() {
        let (h, driver) = harness(MemoryAuthProvider::new().with_session("u1"));
        let mut rx = h.store.subscribe();
        tokio::spawn(driver.run());
        wait_until(&mut rx, |s| s.role() == Some(Role::Admin)).await;

        h.provider.emit(SessionEvent::SignedIn(session_for("u2")));
        let state = wait_until(&mut rx, |s| {
            s.user_id() == Some(&UserId::from("u2")) && s.role().is_some()
        })
        .await;
        assert_eq!(state.role(), Some(Role::Customer));
    }

    #[tokio::test]
    async fn session_changes_invalidate_user_queries() {
        let (h, driver) = harness(MemoryAuthProvider::new());
        let mut rx = h.store.subscribe();
        h.cache.put(QueryKey::user(["profile"]), json!({"full_name": "Ann"}));
        h.cache.put(QueryKey::new("invoices", ["all"]), json!([]));
        tokio::spawn(driver.run());
        wait_until(&mut rx, |s| !s.is_loading()).await;

        h.provider.emit(SessionEvent::SignedIn(session_for("u1")));
        wait_until(&mut rx, |s| s.role().is_some()).await;
        assert!(h.cache.get(&QueryKey::user(["profile"])).is_none());
        assert!(h.cache.get(&QueryKey::new("invoices", ["all"])).is_some());
    }

    #[tokio::test]
    async fn initial_fetch_runs_once() {
        let (h, driver) = harness(MemoryAuthProvider::new());
        let mut rx = h.store.subscribe();
        tokio::spawn(driver.run());
        wait_until(&mut rx, |s| !s.is_loading()).await;
        assert_eq!(h.provider.fetch_count(), 1);
    }
}
