//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Roles
// =============================================================================

/// Program administrator (manages classes, templates and roles)
pub const ROLE_ADMIN: &str = "admin";

/// Instructor assigned to one or more classes
pub const ROLE_INSTRUCTOR: &str = "instructor";

/// Student enrolled in one or more classes
pub const ROLE_STUDENT: &str = "student";

/// All valid role values
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_INSTRUCTOR, ROLE_STUDENT];

/// Check if a role value is valid
pub fn is_valid_role(role: &str) -> bool {
    VALID_ROLES.contains(&role)
}

// =============================================================================
// Classes & Schedule
// =============================================================================

/// Days in a program week
pub const DAYS_PER_WEEK: i64 = 7;

/// Longest program a class may run
pub const MAX_DURATION_WEEKS: i32 = 52;

/// Minimum name length requirement
pub const MIN_NAME_LENGTH: usize = 1;

// =============================================================================
// Surveys
// =============================================================================

/// Lowest value on the rating scale
pub const RATING_MIN: i32 = 1;

/// Highest value on the rating scale
pub const RATING_MAX: i32 = 5;

/// Upper bound for free-text answers, comments and feedback
pub const MAX_TEXT_LENGTH: usize = 5000;

// =============================================================================
// Authentication
// =============================================================================

/// Authorization header prefix for Bearer tokens
pub const BEARER_TOKEN_PREFIX: &str = "Bearer ";
