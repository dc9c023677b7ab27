//! Program roles carried in the identity provider's public metadata.

use serde::{Deserialize, Serialize};

use crate::constants::{ROLE_ADMIN, ROLE_INSTRUCTOR, ROLE_STUDENT};

/// Role of a signed-in user across the whole program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Instructor,
    Student,
}

impl Role {
    /// Wire representation of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Instructor => ROLE_INSTRUCTOR,
            Role::Student => ROLE_STUDENT,
        }
    }

    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Admins and instructors
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Instructor)
    }

    fn rank(&self) -> u8 {
        match self {
            Role::Admin => 2,
            Role::Instructor => 1,
            Role::Student => 0,
        }
    }

    /// Check if this role can access a required role
    pub fn can_access(&self, required: &Role) -> bool {
        self.rank() >= required.rank()
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Student
    }
}

/// Unknown or missing roles fall back to `Student`.
impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            ROLE_ADMIN => Role::Admin,
            ROLE_INSTRUCTOR => Role::Instructor,
            _ => Role::Student,
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Role::from(s.as_str())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::from("admin"), Role::Admin);
        assert_eq!(Role::from("Instructor"), Role::Instructor);
        assert_eq!(Role::from(" student "), Role::Student);
    }

    #[test]
    fn test_unknown_role_is_student() {
        assert_eq!(Role::from(""), Role::Student);
        assert_eq!(Role::from("superuser"), Role::Student);
    }

    #[test]
    fn test_role_hierarchy() {
        assert!(Role::Admin.can_access(&Role::Instructor));
        assert!(Role::Instructor.can_access(&Role::Student));
        assert!(!Role::Instructor.can_access(&Role::Admin));
        assert!(!Role::Student.can_access(&Role::Instructor));
    }

    #[test]
    fn test_staff_roles() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Instructor.is_staff());
        assert!(!Role::Student.is_staff());
    }

    #[test]
    fn test_role_round_trips_through_string() {
        for role in [Role::Admin, Role::Instructor, Role::Student] {
            let s: String = role.into();
            assert_eq!(Role::from(s), role);
        }
    }
}
