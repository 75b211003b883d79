//! Browser wiring of the auth context into the view layer.
//!
//! The [`AuthContext`] only exists in the browser. During server rendering
//! the mirrored state stays at [`AuthState::initial`], so every protected
//! page renders its loading placeholder and hydration sees the same markup.

use leptos::leptos_dom::helpers::set_timeout;
use leptos::prelude::*;
use roofclaim_hosted::HostedConfig;
use roofclaim_platform_access::{
    AuthContext, AuthState, GuardDecision, Notice, Role, RoleSet, evaluate,
};
use std::time::Duration;

/// How long a notice stays on screen.
const TOAST_LIFETIME: Duration = Duration::from_secs(5);

/// Notice shown when the backend could not be reached at startup.
const SESSION_UNAVAILABLE: &str = "Failed to fetch user session";

/// Server function handing the public backend settings to the browser.
#[server]
pub async fn backend_settings() -> Result<HostedConfig, ServerFnError> {
    use crate::error::SettingsError;
    use axum::Extension;

    let Extension(config): Extension<HostedConfig> =
        leptos_axum::extract().await.map_err(|e| {
            tracing::error!(error = %e, "Backend settings missing from request");
            SettingsError::Unavailable {
                details: e.to_string(),
            }
            .into_server_error()
        })?;
    Ok(config)
}

/// A notice on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub notice: Notice,
}

/// Reactive handle on the authentication state, provided at the app root.
#[derive(Clone, Copy)]
pub struct Auth {
    state: RwSignal<AuthState>,
    context: RwSignal<Option<AuthContext>>,
    /// Mirrors the query cache's invalidation counter.
    cache_generation: RwSignal<u64>,
    toasts: RwSignal<Vec<Toast>>,
    next_toast: StoredValue<u64>,
}

impl Auth {
    /// Creates the handle and provides it to descendants.
    pub fn provide() -> Self {
        let auth = Self {
            state: RwSignal::new(AuthState::initial()),
            context: RwSignal::new(None),
            cache_generation: RwSignal::new(0),
            toasts: RwSignal::new(Vec::new()),
            next_toast: StoredValue::new(0),
        };
        provide_context(auth);
        auth
    }

    /// Current state; tracked.
    pub fn state(&self) -> AuthState {
        self.state.get()
    }

    /// Resolved role; tracked.
    pub fn role(&self) -> Option<Role> {
        self.state.with(AuthState::role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.with(AuthState::is_authenticated)
    }

    /// Guard decision for a route admitting `allowed`; tracked.
    pub fn decision(&self, allowed: &RoleSet) -> GuardDecision {
        self.state.with(|state| evaluate(state, allowed))
    }

    /// The connected context, for event handlers.
    pub fn context(&self) -> Option<AuthContext> {
        self.context.get_untracked()
    }

    /// The connected context; tracked together with cache invalidations,
    /// so resources reload once connected and after every invalidation.
    pub fn watch_context(&self) -> Option<AuthContext> {
        self.cache_generation.track();
        self.context.get()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.get()
    }

    /// Puts `notice` on screen until dismissed or expired.
    pub fn show(&self, notice: Notice) {
        let id = self.next_toast.get_value();
        self.next_toast.set_value(id + 1);
        self.toasts.update(|toasts| toasts.push(Toast { id, notice }));

        let auth = *self;
        set_timeout(move || auth.dismiss(id), TOAST_LIFETIME);
    }

    pub fn dismiss(&self, id: u64) {
        self.toasts.update(|toasts| toasts.retain(|toast| toast.id != id));
    }

    /// Settles the state as signed out when no context could be built.
    fn unavailable(&self) {
        self.state.set(AuthState::signed_out());
        self.show(Notice::error(SESSION_UNAVAILABLE));
    }
}

/// Returns the handle provided by the app root.
pub fn use_auth() -> Auth {
    expect_context::<Auth>()
}

/// Builds the hosted client and the auth context, then keeps the signals
/// in step with it.
///
/// `navigate` is called for every navigation the context requests.
#[cfg(feature = "hydrate")]
pub fn connect(auth: Auth, navigate: impl Fn(&str) + 'static) {
    use leptos::task::spawn_local;
    use roofclaim_hosted::{HostedClient, LocalStorage};
    use std::sync::Arc;

    spawn_local(async move {
        let config = match backend_settings().await {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load backend settings");
                auth.unavailable();
                return;
            }
        };

        let storage = Arc::new(LocalStorage::new(config.storage_key()));
        let client = match HostedClient::new(config, storage) {
            Ok(client) => Arc::new(client),
            Err(report) => {
                tracing::error!(error = %report, "Failed to build backend client");
                auth.unavailable();
                return;
            }
        };

        let (context, driver) = AuthContext::start(client.clone(), client);

        // Subscribe before the driver runs so startup notices are not missed.
        let states = context.subscribe();
        let notices = context.notices();
        let navigation = context.navigation();
        let generations = context.cache().subscribe();
        auth.context.set(Some(context));

        spawn_local(mirror_state(auth, states));
        spawn_local(mirror_cache_generation(auth, generations));
        spawn_local(show_notices(auth, notices));
        spawn_local(follow_navigation(navigation, navigate));
        spawn_local(driver.run());
        tracing::debug!("Auth context started");
    });
}

#[cfg(feature = "hydrate")]
async fn mirror_state(auth: Auth, mut states: tokio::sync::watch::Receiver<AuthState>) {
    loop {
        let state = states.borrow_and_update().clone();
        auth.state.set(state);
        if states.changed().await.is_err() {
            break;
        }
    }
}

#[cfg(feature = "hydrate")]
async fn mirror_cache_generation(auth: Auth, mut generations: tokio::sync::watch::Receiver<u64>) {
    while generations.changed().await.is_ok() {
        let generation = *generations.borrow_and_update();
        auth.cache_generation.set(generation);
    }
}

#[cfg(feature = "hydrate")]
async fn show_notices(auth: Auth, mut notices: tokio::sync::broadcast::Receiver<Notice>) {
    use tokio::sync::broadcast::error::RecvError;

    loop {
        match notices.recv().await {
            Ok(notice) => auth.show(notice),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Notices dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(feature = "hydrate")]
async fn follow_navigation(
    mut paths: tokio::sync::broadcast::Receiver<String>,
    navigate: impl Fn(&str),
) {
    use tokio::sync::broadcast::error::RecvError;

    loop {
        match paths.recv().await {
            Ok(path) => navigate(&path),
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}
