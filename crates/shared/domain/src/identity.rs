//! Program users and invitations as seen through the identity provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::role::Role;

/// Signed-in user of the program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    /// Identity provider user ID
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of an email invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Revoked,
    Expired,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Revoked => "revoked",
            InvitationStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "pending" => Ok(InvitationStatus::Pending),
            "accepted" => Ok(InvitationStatus::Accepted),
            "revoked" => Ok(InvitationStatus::Revoked),
            "expired" => Ok(InvitationStatus::Expired),
            other => Err(DomainError::validation(format!(
                "Unknown invitation status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invitation sent by the identity provider on behalf of the program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Invitation {
    pub id: String,
    pub email: String,
    /// Role granted once the invitation is accepted
    pub role: Role,
    pub status: InvitationStatus,
    /// Class the invitee was added to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Identity extracted from a verified session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionIdentity {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

/// Guard for role changes made by an admin.
///
/// An admin may not remove their own admin role, which would leave the
/// program without the account performing the change.
pub fn check_role_change(actor_id: &str, target_id: &str, new_role: Role) -> DomainResult<()> {
    if actor_id == target_id && new_role != Role::Admin {
        return Err(DomainError::SelfDemotion);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invitation_status_parse() {
        assert_eq!(
            InvitationStatus::parse("revoked").unwrap(),
            InvitationStatus::Revoked
        );
        assert!(InvitationStatus::parse("bounced").is_err());
    }

    #[test]
    fn test_admin_cannot_demote_self() {
        assert_eq!(
            check_role_change("user_1", "user_1", Role::Instructor),
            Err(DomainError::SelfDemotion)
        );
        assert!(check_role_change("user_1", "user_1", Role::Admin).is_ok());
        assert!(check_role_change("user_1", "user_2", Role::Student).is_ok());
    }
}
