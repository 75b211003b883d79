//! Role and permission types for route access control.
//!
//! Every authenticated user carries exactly one [`Role`], stored in the
//! `role` column of their profile row. Routes declare the roles they admit
//! as a [`RoleSet`]; an empty set admits any authenticated user.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authorization label for a user of the application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Homeowner tracking their own claim. Assigned by default.
    #[default]
    Customer,
    /// Office or field staff.
    Employee,
    /// Full access, including lead sourcing.
    Admin,
    /// Sales representative.
    Sales,
    /// Handles insurance supplements.
    SupplementSpecialist,
    /// Oversees jobs from contract to completion.
    ProjectManager,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 6] = [
        Role::Customer,
        Role::Employee,
        Role::Admin,
        Role::Sales,
        Role::SupplementSpecialist,
        Role::ProjectManager,
    ];

    /// Returns the stored representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Employee => "employee",
            Self::Admin => "admin",
            Self::Sales => "sales",
            Self::SupplementSpecialist => "supplement_specialist",
            Self::ProjectManager => "project_manager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored role value is not one of the known roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole {
    /// The value that failed to parse.
    pub value: String,
}

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.value)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole {
                value: s.to_string(),
            })
    }
}

/// Set of roles admitted by a route.
///
/// An empty set is unrestricted: any authenticated role passes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleSet {
    roles: Vec<Role>,
}

impl RoleSet {
    /// Creates an unrestricted set (authentication only).
    #[must_use]
    pub fn any() -> Self {
        Self { roles: Vec::new() }
    }

    /// Creates a set admitting exactly the given roles.
    #[must_use]
    pub fn of(roles: &[Role]) -> Self {
        roles.iter().copied().collect()
    }

    /// Returns true if no specific role is required.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.roles.is_empty()
    }

    /// Returns true if `role` may pass.
    #[must_use]
    pub fn permits(&self, role: Role) -> bool {
        self.is_unrestricted() || self.roles.contains(&role)
    }

    /// Returns the roles as a slice.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut roles = Vec::new();
        for role in iter {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        Self { roles }
    }
}
