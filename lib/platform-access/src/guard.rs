//! Route protection.
//!
//! A guard decision is derived from the current [`AuthState`] every time a
//! protected view renders; nothing is cached between evaluations.

use crate::role::{Role, RoleSet};
use crate::routes::{RoutePermission, SIGN_IN_PATH, UNAUTHORIZED_PATH};
use crate::state::AuthState;

/// Outcome of evaluating a protected route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// The session or role is still being determined; render a placeholder.
    Pending,
    /// No session; send the user to sign in.
    Unauthenticated,
    /// Signed in, but the role is not admitted.
    Forbidden,
    /// Render the view for this role.
    Allowed(Role),
}

impl GuardDecision {
    /// Returns where the user should be sent instead of the view.
    #[must_use]
    pub fn redirect(&self) -> Option<&'static str> {
        match self {
            Self::Unauthenticated => Some(SIGN_IN_PATH),
            Self::Forbidden => Some(UNAUTHORIZED_PATH),
            Self::Pending | Self::Allowed(_) => None,
        }
    }

    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }
}

/// Decides whether `state` may open a route admitting `allowed`.
///
/// Checks run in order: loading, session, role. A session whose role has
/// not been resolved yet is pending, never forbidden.
#[must_use]
pub fn evaluate(state: &AuthState, allowed: &RoleSet) -> GuardDecision {
    if state.is_loading() {
        return GuardDecision::Pending;
    }
    if state.session().is_none() {
        return GuardDecision::Unauthenticated;
    }
    let Some(role) = state.role() else {
        return GuardDecision::Pending;
    };
    if allowed.permits(role) {
        GuardDecision::Allowed(role)
    } else {
        GuardDecision::Forbidden
    }
}

/// Guard bound to one route's admitted roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    allowed: RoleSet,
}

impl RouteGuard {
    #[must_use]
    pub fn new(allowed: RoleSet) -> Self {
        Self { allowed }
    }

    /// Guard for a route table entry. Public routes yield `None`.
    #[must_use]
    pub fn for_route(route: &RoutePermission) -> Option<Self> {
        route.allowed_roles().map(Self::new)
    }

    #[must_use]
    pub fn allowed(&self) -> &RoleSet {
        &self.allowed
    }

    #[must_use]
    pub fn evaluate(&self, state: &AuthState) -> GuardDecision {
        evaluate(state, &self.allowed)
    }
}
