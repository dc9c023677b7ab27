//! gRPC implementation for IdentityService.

use std::sync::Arc;

use tonic::{Request, Response, Status};

use crate::service::IdentityService;
use common::wire;
use domain::{is_valid_role, Role};
use proto::identity::{
    identity_service_server::IdentityService as IdentityServiceProto, GetUserRequest, Invitation,
    InviteUserRequest, ListInvitationsRequest, ListInvitationsResponse, ListUsersRequest,
    ListUsersResponse, RevokeInvitationRequest, SetRoleRequest, User, VerifyTokenRequest,
    VerifyTokenResponse,
};

/// gRPC service wrapper for IdentityService.
pub struct IdentityGrpcService {
    service: Arc<dyn IdentityService>,
}

impl IdentityGrpcService {
    /// Create a new gRPC service wrapper.
    pub fn new(service: Arc<dyn IdentityService>) -> Self {
        Self { service }
    }
}

/// Roles sent by callers must be spelled exactly.
fn parse_role(role: &str) -> Result<Role, Status> {
    if is_valid_role(role) {
        Ok(Role::from(role))
    } else {
        Err(Status::invalid_argument(format!("Unknown role '{}'", role)))
    }
}

fn user_to_proto(user: domain::User) -> User {
    User {
        id: user.id,
        email: user.email,
        name: user.name,
        role: user.role.to_string(),
        created_at: user.created_at.to_rfc3339(),
    }
}

fn invitation_to_proto(invitation: domain::Invitation) -> Invitation {
    Invitation {
        id: invitation.id,
        email: invitation.email,
        role: invitation.role.to_string(),
        status: invitation.status.to_string(),
        class_id: invitation.class_id.map(|id| id.to_string()),
        created_at: invitation.created_at.to_rfc3339(),
    }
}

#[tonic::async_trait]
impl IdentityServiceProto for IdentityGrpcService {
    async fn verify_token(
        &self,
        request: Request<VerifyTokenRequest>,
    ) -> Result<Response<VerifyTokenResponse>, Status> {
        let req = request.into_inner();

        match self.service.verify_token(&req.token) {
            Ok(identity) => Ok(Response::new(VerifyTokenResponse {
                valid: true,
                user_id: identity.user_id,
                email: identity.email,
                role: identity.role.to_string(),
            })),
            Err(_) => Ok(Response::new(VerifyTokenResponse {
                valid: false,
                user_id: String::new(),
                email: String::new(),
                role: String::new(),
            })),
        }
    }

    async fn invite_user(
        &self,
        request: Request<InviteUserRequest>,
    ) -> Result<Response<Invitation>, Status> {
        let req = request.into_inner();
        let role = parse_role(&req.role)?;
        let class_id = wire::parse_opt_uuid("class_id", req.class_id.as_deref())?;

        let invitation = self
            .service
            .invite_user(req.email, role, class_id)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(invitation_to_proto(invitation)))
    }

    async fn list_invitations(
        &self,
        _request: Request<ListInvitationsRequest>,
    ) -> Result<Response<ListInvitationsResponse>, Status> {
        let invitations = self
            .service
            .list_invitations()
            .await
            .map_err(Status::from)?;

        Ok(Response::new(ListInvitationsResponse {
            invitations: invitations.into_iter().map(invitation_to_proto).collect(),
        }))
    }

    async fn revoke_invitation(
        &self,
        request: Request<RevokeInvitationRequest>,
    ) -> Result<Response<Invitation>, Status> {
        let invitation = self
            .service
            .revoke_invitation(request.into_inner().id)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(invitation_to_proto(invitation)))
    }

    async fn list_users(
        &self,
        request: Request<ListUsersRequest>,
    ) -> Result<Response<ListUsersResponse>, Status> {
        let req = request.into_inner();

        let (users, total) = self
            .service
            .list_users(req.limit, req.offset)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(ListUsersResponse {
            users: users.into_iter().map(user_to_proto).collect(),
            total: i32::try_from(total).unwrap_or(i32::MAX),
        }))
    }

    async fn get_user(&self, request: Request<GetUserRequest>) -> Result<Response<User>, Status> {
        let user = self
            .service
            .get_user(request.into_inner().id)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(user_to_proto(user)))
    }

    async fn set_role(&self, request: Request<SetRoleRequest>) -> Result<Response<User>, Status> {
        let req = request.into_inner();
        let role = parse_role(&req.role)?;

        let user = self
            .service
            .set_role(req.id, role)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(user_to_proto(user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role_is_strict() {
        assert_eq!(parse_role("instructor").unwrap(), Role::Instructor);
        assert_eq!(
            parse_role("Admin").unwrap_err().code(),
            tonic::Code::InvalidArgument
        );
        assert!(parse_role("").is_err());
    }
}
