//! The `(session, role, loading)` triple published to the application.

use crate::role::Role;
use crate::session::Session;
use roofclaim_core::UserId;

/// Snapshot of the authentication state.
///
/// While `loading` is set the role is reported as unresolved, whatever is
/// stored, so nothing can authorize against a role that is about to change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    session: Option<Session>,
    role: Option<Role>,
    loading: bool,
}

impl AuthState {
    /// State before the initial session fetch has completed.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            session: None,
            role: None,
            loading: true,
        }
    }

    /// Settled state with nobody signed in.
    ///
    /// Used by the view layer when the backend could not be reached at all.
    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            session: None,
            role: None,
            loading: false,
        }
    }

    /// Returns the current session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Returns the resolved role, or `None` while loading or resolving.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        if self.loading { None } else { self.role }
    }

    /// Returns true until the initial session fetch has completed.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Returns the signed-in user's ID, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.session.as_ref().map(Session::user_id)
    }

    /// Returns true once loading is done and a session is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.loading && self.session.is_some()
    }

    /// Returns true if `user_id` is signed in and already has a role.
    pub(crate) fn has_role_for(&self, user_id: &UserId) -> bool {
        self.role.is_some() && self.user_id() == Some(user_id)
    }

    /// Stores a new session. The role is kept only for the same user.
    pub(crate) fn replace_session(&mut self, session: Session) {
        let same_user = self.user_id() == Some(session.user_id());
        if !same_user {
            self.role = None;
        }
        self.session = Some(session);
    }

    /// Stores `role` if `user_id` is still the signed-in user.
    ///
    /// Returns false when the session moved on while the role was resolving.
    pub(crate) fn assign_role(&mut self, user_id: &UserId, role: Role) -> bool {
        if self.user_id() != Some(user_id) {
            return false;
        }
        self.role = Some(role);
        true
    }

    /// Drops session and role.
    pub(crate) fn clear(&mut self) {
        self.session = None;
        self.role = None;
    }

    pub(crate) fn finish_loading(&mut self) {
        self.loading = false;
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(user: &str) -> Session {
        Session::new(UserId::from(user), format!("token-{user}"))
    }

    #[test]
    fn initial_state_is_loading_and_signed_out() {
        let state = AuthState::initial();
        assert!(state.is_loading());
        assert!(state.session().is_none());
        assert!(state.role().is_none());
        assert!(!state.is_authenticated());
    }

    #[test]
    fn signed_out_state_is_settled() {
        let state = AuthState::signed_out();
        assert!(!state.is_loading());
        assert!(state.session().is_none());
        assert!(!state.is_authenticated());
    }

    #[test]
    fn role_hidden_while_loading() {
        let mut state = AuthState::initial();
        state.replace_session(session("u1"));
        assert!(state.assign_role(&UserId::from("u1"), Role::Admin));
        assert_eq!(state.role(), None);

        state.finish_loading();
        assert_eq!(state.role(), Some(Role::Admin));
        assert!(state.is_authenticated());
    }

    #[test]
    fn replacing_with_same_user_keeps_role() {
        let mut state = AuthState::initial();
        state.finish_loading();
        state.replace_session(session("u1"));
        state.assign_role(&UserId::from("u1"), Role::Sales);

        state.replace_session(Session::new(UserId::from("u1"), "refreshed"));
        assert_eq!(state.role(), Some(Role::Sales));
        assert_eq!(
            state.session().map(Session::access_token),
            Some("refreshed")
        );
    }

    #[test]
    fn replacing_with_other_user_resets_role() {
        let mut state = AuthState::initial();
        state.finish_loading();
        state.replace_session(session("u1"));
        state.assign_role(&UserId::from("u1"), Role::Admin);

        state.replace_session(session("u2"));
        assert_eq!(state.role(), None);
        assert!(!state.has_role_for(&UserId::from("u2")));
    }

    #[test]
    fn stale_role_is_rejected() {
        let mut state = AuthState::initial();
        state.finish_loading();
        state.replace_session(session("u2"));

        assert!(!state.assign_role(&UserId::from("u1"), Role::Admin));
        assert_eq!(state.role(), None);
    }

    #[test]
    fn clear_drops_session_and_role() {
        let mut state = AuthState::initial();
        state.finish_loading();
        state.replace_session(session("u1"));
        state.assign_role(&UserId::from("u1"), Role::Employee);

        state.clear();
        assert!(state.session().is_none());
        assert!(state.role().is_none());
        assert!(!state.is_loading());
    }
}
