//! Membership Model
//!
//! A membership is the authorization edge between an external user and a
//! restaurant. Every tenant-scoped request resolves to exactly one of them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Membership role within a restaurant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Manager,
    Employee,
}

/// Roles accepted when an operation does not declare its own list
pub const DEFAULT_ADMIN_ROLES: &[Role] = &[Role::Admin, Role::Owner];

/// Roles allowed to manage restaurant configuration
pub const MANAGEMENT_ROLES: &[Role] = &[Role::Admin, Role::Owner, Role::Manager];

/// Every role; day-to-day order handling is open to all staff
pub const ALL_ROLES: &[Role] = &[Role::Owner, Role::Admin, Role::Manager, Role::Employee];

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Employee => "employee",
        }
    }

    /// Parse a stored role value (case-insensitive, surrounding whitespace ignored)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "owner" => Some(Role::Owner),
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "employee" => Some(Role::Employee),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_lenient_on_case_and_whitespace() {
        assert_eq!(Role::parse(" Owner "), Some(Role::Owner));
        assert_eq!(Role::parse("EMPLOYEE"), Some(Role::Employee));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"manager\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn default_roles_are_admin_and_owner() {
        assert!(DEFAULT_ADMIN_ROLES.contains(&Role::Admin));
        assert!(DEFAULT_ADMIN_ROLES.contains(&Role::Owner));
        assert!(!DEFAULT_ADMIN_ROLES.contains(&Role::Employee));
        assert_eq!(ALL_ROLES.len(), 4);
    }
}
