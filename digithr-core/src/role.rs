//! User roles and route allow-lists
//!
//! Access control is flat set membership with an ADMIN override: ADMIN
//! satisfies every allow-list, every other role must be listed explicitly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

/// Fixed set of roles a user may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Superviseur,
    ChefMaintenance,
    AgentSecurite,
    Operateur,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Superviseur,
        Role::ChefMaintenance,
        Role::AgentSecurite,
        Role::Operateur,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Superviseur => "SUPERVISEUR",
            Role::ChefMaintenance => "CHEF_MAINTENANCE",
            Role::AgentSecurite => "AGENT_SECURITE",
            Role::Operateur => "OPERATEUR",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("role", s))
    }
}

/// Allow-list of roles for a route.
///
/// An empty set means "ADMIN only": ADMIN is always permitted, and nobody
/// else is listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet {
    roles: Vec<Role>,
}

impl RoleSet {
    /// The empty allow-list. Only ADMIN passes.
    pub fn admin_only() -> Self {
        Self::default()
    }

    pub fn of(roles: &[Role]) -> Self {
        let mut roles = roles.to_vec();
        roles.sort();
        roles.dedup();
        Self { roles }
    }

    pub fn permits(&self, role: Role) -> bool {
        role.is_admin() || self.roles.contains(&role)
    }

    pub fn is_admin_only(&self) -> bool {
        self.roles.iter().all(Role::is_admin)
    }

    /// Roles to report when a caller is turned away. ADMIN is always listed
    /// since it always qualifies.
    pub fn required(&self) -> Vec<Role> {
        let mut required = vec![Role::Admin];
        required.extend(self.roles.iter().copied().filter(|r| !r.is_admin()));
        required
    }
}
