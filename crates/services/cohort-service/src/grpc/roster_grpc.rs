//! gRPC implementation for RosterService.

use std::sync::Arc;

use tonic::{Request, Response, Status};

use super::convert::{member_to_proto, membership_to_proto};
use super::{parse_opt_uuid, parse_uuid};
use crate::service::RosterService;
use domain::{MemberKind, NewMember};
use proto::cohort::{
    roster_service_server::RosterService as RosterServiceProto, AddMemberRequest,
    ClaimMembershipsRequest, ClaimMembershipsResponse, Empty, ListMembersRequest,
    ListMembersResponse, ListMembershipsRequest, Member, MembershipsResponse, RemoveMemberRequest,
};

/// gRPC service wrapper for RosterService.
pub struct RosterGrpcService {
    service: Arc<dyn RosterService>,
}

impl RosterGrpcService {
    /// Create a new gRPC service wrapper.
    pub fn new(service: Arc<dyn RosterService>) -> Self {
        Self { service }
    }
}

/// Only the two roster names are accepted on the wire.
fn parse_kind(kind: &str) -> Result<MemberKind, Status> {
    match kind {
        "instructor" => Ok(MemberKind::Instructor),
        "student" => Ok(MemberKind::Student),
        other => Err(Status::invalid_argument(format!(
            "Unknown roster '{}'",
            other
        ))),
    }
}

#[tonic::async_trait]
impl RosterServiceProto for RosterGrpcService {
    async fn add_member(
        &self,
        request: Request<AddMemberRequest>,
    ) -> Result<Response<Member>, Status> {
        let req = request.into_inner();
        let class_id = parse_uuid("class_id", &req.class_id)?;
        let kind = parse_kind(&req.kind)?;

        let member = self
            .service
            .add_member(
                class_id,
                kind,
                NewMember {
                    email: req.email,
                    name: req.name,
                },
            )
            .await
            .map_err(Status::from)?;
        Ok(Response::new(member_to_proto(&member)))
    }

    async fn list_members(
        &self,
        request: Request<ListMembersRequest>,
    ) -> Result<Response<ListMembersResponse>, Status> {
        let req = request.into_inner();
        let class_id = parse_uuid("class_id", &req.class_id)?;
        let kind = parse_kind(&req.kind)?;

        let members = self
            .service
            .list_members(class_id, kind)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(ListMembersResponse {
            members: members.iter().map(member_to_proto).collect(),
        }))
    }

    async fn remove_member(
        &self,
        request: Request<RemoveMemberRequest>,
    ) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        let class_id = parse_uuid("class_id", &req.class_id)?;
        let member_id = parse_uuid("member_id", &req.member_id)?;
        let kind = parse_kind(&req.kind)?;

        self.service
            .remove_member(class_id, kind, member_id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(Empty {}))
    }

    async fn list_memberships(
        &self,
        request: Request<ListMembershipsRequest>,
    ) -> Result<Response<MembershipsResponse>, Status> {
        let req = request.into_inner();
        let class_id = parse_opt_uuid("class_id", req.class_id.as_deref())?;

        let memberships = self
            .service
            .list_memberships(&req.user_id, class_id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(MembershipsResponse {
            memberships: memberships.iter().map(membership_to_proto).collect(),
        }))
    }

    async fn claim_memberships(
        &self,
        request: Request<ClaimMembershipsRequest>,
    ) -> Result<Response<ClaimMembershipsResponse>, Status> {
        let req = request.into_inner();

        let (claimed, memberships) = self
            .service
            .claim_memberships(&req.user_id, &req.email)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(ClaimMembershipsResponse {
            claimed: i32::try_from(claimed).unwrap_or(i32::MAX),
            memberships: memberships.iter().map(membership_to_proto).collect(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("student").unwrap(), MemberKind::Student);
        assert_eq!(parse_kind("instructor").unwrap(), MemberKind::Instructor);
        assert_eq!(
            parse_kind("admin").unwrap_err().code(),
            tonic::Code::InvalidArgument
        );
    }
}
