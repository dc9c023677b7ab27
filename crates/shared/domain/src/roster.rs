//! Class roster: instructors and students invited by email.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainResult;
use crate::validation::{normalize_email, require_name};

/// Which roster table a member lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Instructor,
    Student,
}

impl MemberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Instructor => "instructor",
            MemberKind::Student => "student",
        }
    }
}

impl std::fmt::Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for MemberKind {
    fn from(s: &str) -> Self {
        match s {
            "instructor" => MemberKind::Instructor,
            _ => MemberKind::Student,
        }
    }
}

/// Instructor or student row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Member {
    pub id: Uuid,
    pub class_id: Uuid,
    pub kind: MemberKind,
    /// Identity provider user ID; empty until the invite is claimed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Whether the invited person has signed in yet
    pub fn has_joined(&self) -> bool {
        self.user_id.is_some()
    }
}

/// Roster addition input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMember {
    pub email: String,
    pub name: String,
}

impl NewMember {
    /// Validate name and email, normalizing the email for uniqueness checks.
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            email: normalize_email(&self.email)?,
            name: require_name("Name", &self.name)?,
        })
    }
}

/// A signed-in user's place in one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Membership {
    pub class_id: Uuid,
    pub member_id: Uuid,
    pub kind: MemberKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_member_normalizes() {
        let member = NewMember {
            email: " Grace@Example.org".to_string(),
            name: " Grace Hopper ".to_string(),
        }
        .validate()
        .unwrap();

        assert_eq!(member.email, "grace@example.org");
        assert_eq!(member.name, "Grace Hopper");
    }

    #[test]
    fn test_new_member_rejects_bad_email() {
        let result = NewMember {
            email: "grace".to_string(),
            name: "Grace".to_string(),
        }
        .validate();
        assert!(result.is_err());
    }

    #[test]
    fn test_member_kind_parsing() {
        assert_eq!(MemberKind::from("instructor"), MemberKind::Instructor);
        assert_eq!(MemberKind::from("student"), MemberKind::Student);
        assert_eq!(MemberKind::Instructor.to_string(), "instructor");
    }
}
