//! The auth context: the single entry point the application talks to.

use crate::cache::QueryCache;
use crate::data::{DataService, Filter};
use crate::error::AuthError;
use crate::guard::{GuardDecision, evaluate};
use crate::notice::{Navigator, Notice, Notifier};
use crate::profile::ProfileUpdate;
use crate::provider::AuthProvider;
use crate::resolver::{ID_COLUMN, RoleResolver};
use crate::role::RoleSet;
use crate::routes::SIGN_IN_PATH;
use crate::session::Session;
use crate::state::AuthState;
use crate::store::{SessionDriver, SessionStore};
use roofclaim_core::table;
use rootcause::prelude::Report;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, instrument, warn};

const LOGIN_SUCCEEDED: &str = "Logged in successfully";
const LOGIN_FAILED: &str = "Login failed. Please check your credentials and try again.";
const LOGOUT_SUCCEEDED: &str = "Logged out successfully";
const LOGOUT_FAILED: &str = "Failed to log out. Please try again.";
const PROFILE_UPDATED: &str = "Profile updated successfully";
const PROFILE_UPDATE_FAILED: &str = "Failed to update profile. Please try again.";

/// Authentication state and operations for the application.
///
/// Cloning is cheap; all clones share the same store.
#[derive(Clone)]
pub struct AuthContext {
    inner: Arc<Inner>,
}

struct Inner {
    provider: Arc<dyn AuthProvider>,
    data: Arc<dyn DataService>,
    store: Arc<SessionStore>,
    notifier: Notifier,
    navigator: Navigator,
    cache: QueryCache,
}

impl AuthContext {
    /// Wires the context to its provider and data service.
    ///
    /// The returned driver must be spawned for the state to leave loading.
    #[must_use]
    pub fn start(
        provider: Arc<dyn AuthProvider>,
        data: Arc<dyn DataService>,
    ) -> (Self, SessionDriver) {
        let notifier = Notifier::new();
        let cache = QueryCache::new();
        let resolver = RoleResolver::new(data.clone(), notifier.clone());
        let store = Arc::new(SessionStore::new(resolver, cache.clone(), notifier.clone()));
        let subscription = provider.subscribe();
        let driver = SessionDriver::new(store.clone(), provider.clone(), subscription);

        let context = Self {
            inner: Arc::new(Inner {
                provider,
                data,
                store,
                notifier,
                navigator: Navigator::new(),
                cache,
            }),
        };
        (context, driver)
    }

    /// Returns the current `(session, role, loading)` triple.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.inner.store.snapshot()
    }

    /// Watches the triple.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.store.subscribe()
    }

    #[must_use]
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notifier.subscribe()
    }

    /// Paths the view layer is asked to navigate to.
    #[must_use]
    pub fn navigation(&self) -> broadcast::Receiver<String> {
        self.inner.navigator.subscribe()
    }

    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    #[must_use]
    pub fn data(&self) -> &Arc<dyn DataService> {
        &self.inner.data
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    /// Evaluates a route admitting `allowed` against the current state.
    #[must_use]
    pub fn guard(&self, allowed: &RoleSet) -> GuardDecision {
        evaluate(&self.state(), allowed)
    }

    /// Signs in with email and password.
    ///
    /// State is not touched here; the provider's change stream delivers
    /// the new session.
    #[instrument(skip_all)]
    pub async fn login(&self, identifier: &str, secret: &str) -> Result<Session, Report<AuthError>> {
        match self
            .inner
            .provider
            .sign_in_with_password(identifier, secret)
            .await
        {
            Ok(session) => {
                info!(user_id = %session.user_id(), "Login succeeded");
                self.inner.notifier.success(LOGIN_SUCCEEDED);
                Ok(session)
            }
            Err(err) => {
                warn!(error = %err, "Login failed");
                self.inner.notifier.error(LOGIN_FAILED);
                Err(AuthError::from_login(err).into())
            }
        }
    }

    /// Signs out.
    ///
    /// Local state is cleared only once the provider confirms; on failure
    /// the user stays signed in.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<(), Report<AuthError>> {
        if let Err(err) = self.inner.provider.sign_out().await {
            error!(error = %err, "Logout failed");
            self.inner.notifier.error(LOGOUT_FAILED);
            return Err(AuthError::LogoutFailed {
                reason: err.to_string(),
            }
            .into());
        }
        self.inner.store.clear();
        self.inner.navigator.navigate(SIGN_IN_PATH);
        self.inner.notifier.success(LOGOUT_SUCCEEDED);
        info!("Logged out");
        Ok(())
    }

    /// Updates columns of the signed-in user's profile row.
    ///
    /// The role and id columns are refused. An empty update is a no-op.
    #[instrument(skip_all)]
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<(), Report<AuthError>> {
        let result = self.try_update_profile(update).await;
        match &result {
            Ok(true) => self.inner.notifier.success(PROFILE_UPDATED),
            Ok(false) => {}
            Err(err) => {
                warn!(error = %err, "Profile update failed");
                self.inner.notifier.error(PROFILE_UPDATE_FAILED);
            }
        }
        result.map(|_| ()).map_err(Report::from)
    }

    /// Returns whether anything was written.
    async fn try_update_profile(&self, update: ProfileUpdate) -> Result<bool, AuthError> {
        let Some(user_id) = self.state().user_id().cloned() else {
            return Err(AuthError::NotAuthenticated);
        };
        if let Some(field) = update.protected_field() {
            return Err(AuthError::ProtectedField {
                field: field.to_string(),
            });
        }
        if update.is_empty() {
            return Ok(false);
        }

        debug!(%user_id, columns = update.fields().len(), "Updating profile");
        let filter = Filter::new().eq(ID_COLUMN, user_id.as_str());
        let updated = self
            .inner
            .data
            .write(table::USERS, &filter, update.into_row())
            .await
            .map_err(|e| AuthError::ProfileUpdateFailed {
                reason: e.to_string(),
            })?;
        if updated.is_empty() {
            return Err(AuthError::ProfileUpdateFailed {
                reason: format!("no profile row for user {user_id}"),
            });
        }
        info!(%user_id, "Profile updated");
        self.inner.cache.invalidate_user();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QueryKey;
    use crate::error::ProviderError;
    use crate::notice::NoticeKind;
    use crate::role::Role;
    use crate::test_support::{MemoryAuthProvider, MemoryData, wait_until};
    use roofclaim_core::UserId;
    use serde_json::json;

    struct Fixture {
        context: AuthContext,
        provider: Arc<MemoryAuthProvider>,
        data: Arc<MemoryData>,
        notices: broadcast::Receiver<Notice>,
        state: watch::Receiver<AuthState>,
    }

    async fn started(provider: MemoryAuthProvider) -> Fixture {
        let provider = Arc::new(provider.with_account("ann@example.com", "hunter2", "u1"));
        let data = Arc::new(MemoryData::new());
        data.insert_row(table::USERS, json!({"id": "u1", "role": "employee", "full_name": "Ann"}));
        data.insert_row(table::USERS, json!({"id": "u2"}));

        let (context, driver) = AuthContext::start(provider.clone(), data.clone());
        let notices = context.notices();
        let mut state = context.subscribe();
        tokio::spawn(driver.run());
        wait_until(&mut state, |s| !s.is_loading()).await;

        Fixture {
            context,
            provider,
            data,
            notices,
            state,
        }
    }

    fn drain(rx: &mut broadcast::Receiver<Notice>) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = rx.try_recv() {
            notices.push(notice);
        }
        notices
    }

    #[tokio::test]
    async fn login_publishes_session_and_role() {
        let mut f = started(MemoryAuthProvider::new()).await;

        let session = f
            .context
            .login("ann@example.com", "hunter2")
            .await
            .expect("login");
        assert_eq!(session.user_id().as_str(), "u1");

        let state = wait_until(&mut f.state, |s| s.role().is_some()).await;
        assert_eq!(state.role(), Some(Role::Employee));
        let notices = drain(&mut f.notices);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind(), NoticeKind::Success);
    }

    #[tokio::test]
    async fn bad_credentials_fail_without_touching_state() {
        let mut f = started(MemoryAuthProvider::new()).await;
        let before = f.context.state();

        let err = f
            .context
            .login("ann@example.com", "wrong")
            .await
            .expect_err("bad password");
        assert_eq!(err.current_context(), &AuthError::InvalidCredentials);
        assert_eq!(f.context.state(), before);

        let notices = drain(&mut f.notices);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message(), LOGIN_FAILED);
    }

    #[tokio::test]
    async fn network_failure_on_login_is_distinct() {
        let provider = MemoryAuthProvider::new();
        provider.fail_sign_in(ProviderError::Network {
            reason: "timeout".to_string(),
        });
        let f = started(provider).await;

        let err = f
            .context
            .login("ann@example.com", "hunter2")
            .await
            .expect_err("offline");
        assert!(matches!(err.current_context(), AuthError::LoginFailed { .. }));
    }

    #[tokio::test]
    async fn logout_clears_state_and_navigates_to_sign_in() {
        let mut f = started(MemoryAuthProvider::new().with_session("u1")).await;
        let mut navigation = f.context.navigation();
        f.context
            .cache()
            .put(QueryKey::user(["profile"]), json!({"full_name": "Ann"}));

        f.context.logout().await.expect("logout");

        let state = f.context.state();
        assert!(state.session().is_none());
        assert!(state.role().is_none());
        assert!(!state.is_loading());
        assert_eq!(navigation.try_recv().expect("navigation"), SIGN_IN_PATH);
        assert!(f.context.cache().get(&QueryKey::user(["profile"])).is_none());
        let notices = drain(&mut f.notices);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message(), LOGOUT_SUCCEEDED);
    }

    #[tokio::test]
    async fn failed_logout_leaves_state_unchanged() {
        let provider = MemoryAuthProvider::new().with_session("u1");
        provider.fail_sign_out(ProviderError::Network {
            reason: "offline".to_string(),
        });
        let mut f = started(provider).await;
        let mut navigation = f.context.navigation();
        let before = f.context.state();
        assert_eq!(before.role(), Some(Role::Employee));

        let err = f.context.logout().await.expect_err("sign out fails");
        assert!(matches!(err.current_context(), AuthError::LogoutFailed { .. }));
        assert_eq!(f.context.state(), before);
        assert!(navigation.try_recv().is_err());
        let notices = drain(&mut f.notices);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message(), LOGOUT_FAILED);
    }

    #[tokio::test]
    async fn update_profile_writes_free_columns() {
        let mut f = started(MemoryAuthProvider::new().with_session("u1")).await;

        f.context
            .update_profile(ProfileUpdate::new().set("full_name", "Ann Smith"))
            .await
            .expect("update");

        let row = f
            .data
            .rows(table::USERS)
            .into_iter()
            .find(|row| row["id"] == "u1")
            .expect("row");
        assert_eq!(row["full_name"], "Ann Smith");
        assert_eq!(row["role"], "employee");
        let notices = drain(&mut f.notices);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message(), PROFILE_UPDATED);
    }

    #[tokio::test]
    async fn update_profile_refuses_role_changes() {
        let mut f = started(MemoryAuthProvider::new().with_session("u1")).await;

        let err = f
            .context
            .update_profile(ProfileUpdate::new().set("role", "admin"))
            .await
            .expect_err("role is protected");
        assert_eq!(
            err.current_context(),
            &AuthError::ProtectedField {
                field: "role".to_string()
            }
        );
        assert_eq!(f.data.stored_role("u1"), Some(json!("employee")));
        assert_eq!(f.context.state().role(), Some(Role::Employee));
        assert_eq!(drain(&mut f.notices).len(), 1);
    }

    #[tokio::test]
    async fn update_profile_requires_session() {
        let f = started(MemoryAuthProvider::new()).await;
        let err = f
            .context
            .update_profile(ProfileUpdate::new().set("phone", "555-0100"))
            .await
            .expect_err("signed out");
        assert_eq!(err.current_context(), &AuthError::NotAuthenticated);
        assert_eq!(f.data.write_count(table::USERS), 0);
    }

    #[tokio::test]
    async fn update_profile_reports_backend_rejection() {
        let mut f = started(MemoryAuthProvider::new().with_session("u1")).await;
        f.data.fail_writes("constraint violation");

        let err = f
            .context
            .update_profile(ProfileUpdate::new().set("phone", "555-0100"))
            .await
            .expect_err("rejected");
        assert!(matches!(
            err.current_context(),
            AuthError::ProfileUpdateFailed { .. }
        ));
        let notices = drain(&mut f.notices);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message(), PROFILE_UPDATE_FAILED);
    }

    #[tokio::test]
    async fn empty_update_is_a_no_op() {
        let mut f = started(MemoryAuthProvider::new().with_session("u1")).await;
        f.context
            .update_profile(ProfileUpdate::new())
            .await
            .expect("no-op");
        assert_eq!(f.data.write_count(table::USERS), 0);
        assert!(drain(&mut f.notices).is_empty());
    }

    #[tokio::test]
    async fn guard_follows_published_state() {
        let mut f = started(MemoryAuthProvider::new()).await;
        let staff = RoleSet::of(&[Role::Admin, Role::Employee]);
        assert_eq!(f.context.guard(&staff), GuardDecision::Unauthenticated);

        f.context
            .login("ann@example.com", "hunter2")
            .await
            .expect("login");
        wait_until(&mut f.state, |s| s.role().is_some()).await;
        assert_eq!(f.context.guard(&staff), GuardDecision::Allowed(Role::Employee));
        assert_eq!(
            f.context.guard(&RoleSet::of(&[Role::Admin])),
            GuardDecision::Forbidden
        );
    }

    #[tokio::test]
    async fn first_login_provisions_default_role_once() {
        let provider = MemoryAuthProvider::new().with_account("new@example.com", "pw", "u2");
        let mut f = started(provider).await;

        f.context.login("new@example.com", "pw").await.expect("login");
        let state = wait_until(&mut f.state, |s| s.role().is_some()).await;
        assert_eq!(state.role(), Some(Role::Customer));
        assert_eq!(f.data.stored_role("u2"), Some(json!("customer")));
        assert_eq!(f.data.write_count(table::USERS), 1);
        assert_eq!(state.user_id(), Some(&UserId::from("u2")));
    }

    #[tokio::test]
    async fn data_accessor_reaches_the_backend() {
        let f = started(MemoryAuthProvider::new()).await;
        f.data
            .set_rpc_result(table::RPC_PROJECT_STATUS, json!([{"status": "Active"}]));
        let value = f
            .context
            .data()
            .rpc(table::RPC_PROJECT_STATUS, Default::default())
            .await
            .expect("rpc");
        assert_eq!(value[0]["status"], "Active");
        assert_eq!(f.provider.fetch_count(), 1);
    }
}
