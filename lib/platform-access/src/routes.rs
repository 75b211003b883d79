//! The application's route table.
//!
//! Every path and the roles it admits are fixed at compile time. The view
//! layer mounts its pages against these entries, and the navigation bar
//! lists the ones the signed-in role may open.

use crate::role::{Role, RoleSet};

/// Where unauthenticated users are sent.
pub const SIGN_IN_PATH: &str = "/login";

/// Where users are sent when their role is not admitted.
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// Role dashboard.
pub const HOME_PATH: &str = "/";

const STAFF: &[Role] = &[Role::Admin, Role::Employee];

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone, signed in or not.
    Public,
    /// Any signed-in user.
    Authenticated,
    /// Signed-in users holding one of the listed roles.
    Roles(&'static [Role]),
}

/// One entry of the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePermission {
    pub path: &'static str,
    /// Navigation label.
    pub label: &'static str,
    pub access: Access,
}

impl RoutePermission {
    /// Returns the roles admitted, or `None` for public routes.
    #[must_use]
    pub fn allowed_roles(&self) -> Option<RoleSet> {
        match self.access {
            Access::Public => None,
            Access::Authenticated => Some(RoleSet::any()),
            Access::Roles(roles) => Some(RoleSet::of(roles)),
        }
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.access == Access::Public
    }

    /// Returns true if a signed-in user with `role` may open the route.
    #[must_use]
    pub fn admits(&self, role: Role) -> bool {
        self.allowed_roles().is_none_or(|allowed| allowed.permits(role))
    }
}

const fn route(path: &'static str, label: &'static str, access: Access) -> RoutePermission {
    RoutePermission {
        path,
        label,
        access,
    }
}

/// Every route of the application.
pub const ROUTES: &[RoutePermission] = &[
    route(HOME_PATH, "Dashboard", Access::Authenticated),
    route("/inspection-scheduling", "Inspection Scheduling", Access::Roles(STAFF)),
    route("/inspection-report", "Inspection Report", Access::Roles(STAFF)),
    route("/installation-tracking", "Installation Tracking", Access::Roles(STAFF)),
    route("/find-leads", "Find Leads", Access::Roles(&[Role::Admin])),
    route("/contacts", "Contacts", Access::Roles(STAFF)),
    route(
        "/supplement-tracking",
        "Supplement Tracking",
        Access::Roles(&[Role::Admin, Role::Employee, Role::SupplementSpecialist]),
    ),
    route("/tasks", "Tasks", Access::Roles(STAFF)),
    route(
        "/insurance-mortgage-tracker",
        "Insurance & Mortgage",
        Access::Roles(STAFF),
    ),
    route("/invoices", "Invoices", Access::Roles(STAFF)),
    route(
        "/project-manager",
        "Project Manager",
        Access::Roles(&[Role::Admin, Role::ProjectManager]),
    ),
    route(SIGN_IN_PATH, "Login", Access::Public),
    route("/signup", "Sign Up", Access::Public),
    route("/forgot-password", "Forgot Password", Access::Public),
    route(UNAUTHORIZED_PATH, "Unauthorized", Access::Public),
];

/// Looks up the entry for `path`. A trailing slash is ignored.
#[must_use]
pub fn permission_for(path: &str) -> Option<&'static RoutePermission> {
    let trimmed = path.trim_end_matches('/');
    let path = if trimmed.is_empty() { HOME_PATH } else { trimmed };
    ROUTES.iter().find(|entry| entry.path == path)
}

/// Returns the protected routes `role` may open, in table order.
pub fn navigable_for(role: Role) -> impl Iterator<Item = &'static RoutePermission> {
    ROUTES
        .iter()
        .filter(move |entry| !entry.is_public() && entry.admits(role))
}
