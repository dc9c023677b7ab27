//! gRPC implementation for EngagementService.

use std::sync::Arc;

use tonic::{Request, Response, Status};

use super::convert::{announcement_to_proto, comment_to_proto, feedback_to_proto};
use super::{domain_status, parse_opt_uuid, parse_uuid};
use crate::service::EngagementService;
use domain::{CommentStatus, NewAnnouncement, NewComment, NewFeedback};
use proto::cohort::{
    engagement_service_server::EngagementService as EngagementServiceProto, AddCommentRequest,
    Announcement, Comment, CreateAnnouncementRequest, DeleteAnnouncementRequest, Empty, Feedback,
    GetAnnouncementRequest, GetCommentRequest, ListAnnouncementsRequest, ListAnnouncementsResponse,
    ListCommentsRequest, ListCommentsResponse, ListFeedbackRequest, ListFeedbackResponse,
    ModerateCommentRequest, SetAnnouncementPinnedRequest, SubmitFeedbackRequest,
};

/// gRPC service wrapper for EngagementService.
pub struct EngagementGrpcService {
    service: Arc<dyn EngagementService>,
}

impl EngagementGrpcService {
    /// Create a new gRPC service wrapper.
    pub fn new(service: Arc<dyn EngagementService>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl EngagementServiceProto for EngagementGrpcService {
    async fn add_comment(
        &self,
        request: Request<AddCommentRequest>,
    ) -> Result<Response<Comment>, Status> {
        let req = request.into_inner();
        let survey_id = parse_uuid("survey_id", &req.survey_id)?;
        let comment = NewComment {
            author_id: parse_uuid("author_id", &req.author_id)?,
            subject_id: parse_opt_uuid("subject_id", req.subject_id.as_deref())?,
            body: req.body,
        };

        let comment = self
            .service
            .add_comment(survey_id, comment)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(comment_to_proto(&comment)))
    }

    async fn get_comment(
        &self,
        request: Request<GetCommentRequest>,
    ) -> Result<Response<Comment>, Status> {
        let id = parse_uuid("id", &request.into_inner().id)?;

        let comment = self.service.get_comment(id).await.map_err(Status::from)?;
        Ok(Response::new(comment_to_proto(&comment)))
    }

    async fn list_comments(
        &self,
        request: Request<ListCommentsRequest>,
    ) -> Result<Response<ListCommentsResponse>, Status> {
        let req = request.into_inner();
        let class_id = parse_uuid("class_id", &req.class_id)?;
        let status = req
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(CommentStatus::parse)
            .transpose()
            .map_err(domain_status)?;

        let comments = self
            .service
            .list_comments(class_id, status)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(ListCommentsResponse {
            comments: comments.iter().map(comment_to_proto).collect(),
        }))
    }

    async fn moderate_comment(
        &self,
        request: Request<ModerateCommentRequest>,
    ) -> Result<Response<Comment>, Status> {
        let req = request.into_inner();
        let id = parse_uuid("id", &req.id)?;
        let status = CommentStatus::parse(&req.status).map_err(domain_status)?;

        let comment = self
            .service
            .moderate_comment(id, status)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(comment_to_proto(&comment)))
    }

    async fn submit_feedback(
        &self,
        request: Request<SubmitFeedbackRequest>,
    ) -> Result<Response<Feedback>, Status> {
        let req = request.into_inner();
        let class_id = parse_uuid("class_id", &req.class_id)?;
        let feedback = NewFeedback {
            student_id: parse_opt_uuid("student_id", req.student_id.as_deref())?,
            week: req.week,
            rating: req.rating,
            body: req.body,
        };

        let feedback = self
            .service
            .submit_feedback(class_id, feedback)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(feedback_to_proto(&feedback)))
    }

    async fn list_feedback(
        &self,
        request: Request<ListFeedbackRequest>,
    ) -> Result<Response<ListFeedbackResponse>, Status> {
        let class_id = parse_uuid("class_id", &request.into_inner().class_id)?;

        let feedback = self
            .service
            .list_feedback(class_id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(ListFeedbackResponse {
            feedback: feedback.iter().map(feedback_to_proto).collect(),
        }))
    }

    async fn create_announcement(
        &self,
        request: Request<CreateAnnouncementRequest>,
    ) -> Result<Response<Announcement>, Status> {
        let req = request.into_inner();
        let class_id = parse_uuid("class_id", &req.class_id)?;
        let announcement = NewAnnouncement {
            title: req.title,
            body: req.body,
            author_user_id: req.author_user_id,
            pinned: req.pinned,
        };

        let announcement = self
            .service
            .create_announcement(class_id, announcement)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(announcement_to_proto(&announcement)))
    }

    async fn get_announcement(
        &self,
        request: Request<GetAnnouncementRequest>,
    ) -> Result<Response<Announcement>, Status> {
        let id = parse_uuid("id", &request.into_inner().id)?;

        let announcement = self
            .service
            .get_announcement(id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(announcement_to_proto(&announcement)))
    }

    async fn list_announcements(
        &self,
        request: Request<ListAnnouncementsRequest>,
    ) -> Result<Response<ListAnnouncementsResponse>, Status> {
        let class_id = parse_uuid("class_id", &request.into_inner().class_id)?;

        let announcements = self
            .service
            .list_announcements(class_id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(ListAnnouncementsResponse {
            announcements: announcements.iter().map(announcement_to_proto).collect(),
        }))
    }

    async fn set_announcement_pinned(
        &self,
        request: Request<SetAnnouncementPinnedRequest>,
    ) -> Result<Response<Announcement>, Status> {
        let req = request.into_inner();
        let id = parse_uuid("id", &req.id)?;

        let announcement = self
            .service
            .set_announcement_pinned(id, req.pinned)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(announcement_to_proto(&announcement)))
    }

    async fn delete_announcement(
        &self,
        request: Request<DeleteAnnouncementRequest>,
    ) -> Result<Response<Empty>, Status> {
        let id = parse_uuid("id", &request.into_inner().id)?;

        self.service
            .delete_announcement(id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(Empty {}))
    }
}
