//! gRPC client for identity-service.

use async_trait::async_trait;
use tonic::transport::Channel;
#[cfg(test)]
use mockall::automock;
use tracing::debug;
use uuid::Uuid;

use super::convert::{timestamp, uuid};
use common::{AppError, AppResult};
use domain::{Invitation, InvitationStatus, Role, SessionIdentity, User};
use proto::identity::{
    self as pb, identity_service_client::IdentityServiceClient as ProtoIdentityServiceClient,
    GetUserRequest, InviteUserRequest, ListInvitationsRequest, ListUsersRequest,
    RevokeInvitationRequest, SetRoleRequest, VerifyTokenRequest,
};

/// gRPC client wrapper for identity-service.
#[derive(Clone)]
pub struct IdentityClient {
    client: ProtoIdentityServiceClient<Channel>,
}

/// Calls handlers make on identity-service.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Verify a session token; `None` when it is invalid or expired.
    async fn verify_token(&self, token: &str) -> AppResult<Option<SessionIdentity>>;

    /// Send an invitation email through the identity provider.
    async fn invite_user(
        &self,
        email: &str,
        role: Role,
        class_id: Option<Uuid>,
    ) -> AppResult<Invitation>;

    async fn list_invitations(&self) -> AppResult<Vec<Invitation>>;

    async fn revoke_invitation(&self, id: &str) -> AppResult<Invitation>;

    /// One page of users and the total count.
    async fn list_users(
        &self,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> AppResult<(Vec<User>, i32)>;

    async fn get_user(&self, id: &str) -> AppResult<User>;

    /// Promote or demote a user.
    async fn set_role(&self, id: &str, role: Role) -> AppResult<User>;
}

impl IdentityClient {
    /// Connect to identity-service.
    pub async fn connect(endpoint: &str) -> Result<Self, tonic::transport::Error> {
        debug!("Connecting to identity-service at {}", endpoint);
        let client = ProtoIdentityServiceClient::connect(endpoint.to_string()).await?;
        Ok(Self { client })
    }
}

#[async_trait]
impl IdentityApi for IdentityClient {
    async fn verify_token(&self, token: &str) -> AppResult<Option<SessionIdentity>> {
        let request = tonic::Request::new(VerifyTokenRequest {
            token: token.to_string(),
        });

        let mut client = self.client.clone();
        let response = client.verify_token(request).await.map_err(AppError::from)?;
        let proto = response.into_inner();

        if !proto.valid {
            return Ok(None);
        }

        Ok(Some(SessionIdentity {
            user_id: proto.user_id,
            email: proto.email,
            role: Role::from(proto.role),
        }))
    }

    async fn invite_user(
        &self,
        email: &str,
        role: Role,
        class_id: Option<Uuid>,
    ) -> AppResult<Invitation> {
        let request = tonic::Request::new(InviteUserRequest {
            email: email.to_string(),
            role: role.to_string(),
            class_id: class_id.map(|id| id.to_string()),
        });

        let mut client = self.client.clone();
        let response = client.invite_user(request).await.map_err(AppError::from)?;
        proto_to_invitation(response.into_inner())
    }

    async fn list_invitations(&self) -> AppResult<Vec<Invitation>> {
        let request = tonic::Request::new(ListInvitationsRequest {});

        let mut client = self.client.clone();
        let response = client
            .list_invitations(request)
            .await
            .map_err(AppError::from)?;
        response
            .into_inner()
            .invitations
            .into_iter()
            .map(proto_to_invitation)
            .collect()
    }

    async fn revoke_invitation(&self, id: &str) -> AppResult<Invitation> {
        let request = tonic::Request::new(RevokeInvitationRequest { id: id.to_string() });

        let mut client = self.client.clone();
        let response = client
            .revoke_invitation(request)
            .await
            .map_err(AppError::from)?;
        proto_to_invitation(response.into_inner())
    }

    async fn list_users(
        &self,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> AppResult<(Vec<User>, i32)> {
        let request = tonic::Request::new(ListUsersRequest { limit, offset });

        let mut client = self.client.clone();
        let response = client.list_users(request).await.map_err(AppError::from)?;
        let proto = response.into_inner();

        let users = proto
            .users
            .into_iter()
            .map(proto_to_user)
            .collect::<AppResult<_>>()?;
        Ok((users, proto.total))
    }

    async fn get_user(&self, id: &str) -> AppResult<User> {
        let request = tonic::Request::new(GetUserRequest { id: id.to_string() });

        let mut client = self.client.clone();
        let response = client.get_user(request).await.map_err(AppError::from)?;
        proto_to_user(response.into_inner())
    }

    async fn set_role(&self, id: &str, role: Role) -> AppResult<User> {
        let request = tonic::Request::new(SetRoleRequest {
            id: id.to_string(),
            role: role.to_string(),
        });

        let mut client = self.client.clone();
        let response = client.set_role(request).await.map_err(AppError::from)?;
        proto_to_user(response.into_inner())
    }
}

fn proto_to_user(proto: pb::User) -> AppResult<User> {
    Ok(User {
        created_at: timestamp("created_at", &proto.created_at)?,
        role: Role::from(proto.role),
        id: proto.id,
        email: proto.email,
        name: proto.name,
    })
}

fn proto_to_invitation(proto: pb::Invitation) -> AppResult<Invitation> {
    let class_id = proto
        .class_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .map(|id| uuid("class_id", id))
        .transpose()?;

    Ok(Invitation {
        status: InvitationStatus::parse(&proto.status)
            .map_err(|_| AppError::internal("Invalid invitation status from service"))?,
        created_at: timestamp("created_at", &proto.created_at)?,
        role: Role::from(proto.role),
        class_id,
        id: proto.id,
        email: proto.email,
    })
}
