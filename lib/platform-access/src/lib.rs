//! Session lifecycle, role resolution and route protection for roofclaim.
//!
//! This crate provides:
//! - The provider and data service boundaries (`AuthProvider`, `DataService`)
//! - Role resolution with lazy default provisioning (`RoleResolver`)
//! - The published `(session, role, loading)` triple (`AuthState`)
//! - The application-facing `AuthContext` with login, logout and profile updates
//! - Route guarding against the static route table
//!
//! # Access Control Model
//!
//! Every signed-in user has exactly one [`Role`], read from the `role`
//! column of their row in the `users` table. A user without a stored role
//! is assigned `customer` on first resolution. Routes admit either any
//! signed-in user or an explicit set of roles; see [`routes::ROUTES`].
//!
//! # Example
//!
//! ```
//! use roofclaim_platform_access::{AuthState, GuardDecision, Role, RoleSet, evaluate};
//!
//! // Before the persisted session has been fetched nothing is decided.
//! let state = AuthState::initial();
//! let staff = RoleSet::of(&[Role::Admin, Role::Employee]);
//! assert_eq!(evaluate(&state, &staff), GuardDecision::Pending);
//! ```

pub mod cache;
pub mod context;
pub mod data;
pub mod error;
pub mod guard;
pub mod notice;
pub mod profile;
pub mod provider;
pub mod resolver;
pub mod role;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types at crate root
pub use cache::{QueryCache, QueryKey, USER_SCOPE};
pub use context::AuthContext;
pub use data::{Condition, DataService, Direction, Filter, Row};
pub use error::{
    AuthError, DataError, ProviderError, RoleResolutionError, SessionFetchError,
};
pub use guard::{GuardDecision, RouteGuard, evaluate};
pub use notice::{Navigator, Notice, NoticeKind, Notifier};
pub use profile::ProfileUpdate;
pub use provider::{AuthProvider, SessionBroadcaster, SessionEvent, SessionSubscription};
pub use resolver::RoleResolver;
pub use role::{Role, RoleSet, UnknownRole};
pub use routes::{Access, RoutePermission};
pub use session::Session;
pub use state::AuthState;
pub use store::{SessionDriver, SessionStore};
