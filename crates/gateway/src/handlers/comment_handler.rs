//! Survey comment handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use common::{AppError, AppResult};
use domain::{Comment, CommentStatus, NewComment};

use crate::access::{class_access, staff_access, survey_access, ClassAccess};
use crate::extractors::ValidatedJson;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Comment posted alongside a survey
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    /// Classmate the comment is about, if any
    pub subject_id: Option<Uuid>,
    #[validate(length(min = 1, max = 5000, message = "Comment must be 1 to 5000 characters"))]
    #[schema(example = "The pairing sessions really helped this week")]
    pub body: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListCommentsParams {
    /// pending, approved or rejected; staff only
    pub status: Option<CommentStatus>,
}

/// Create comment routes
pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/surveys/:id/comments", post(create_comment))
        .route("/classes/:id/comments", get(list_comments))
        .route("/comments/:id/approve", post(approve_comment))
        .route("/comments/:id/reject", post(reject_comment))
}

/// Students only ever see approved comments.
fn status_filter(access: ClassAccess, requested: Option<CommentStatus>) -> Option<CommentStatus> {
    if access.is_staff() {
        requested
    } else {
        Some(CommentStatus::Approved)
    }
}

async fn moderate(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
    status: CommentStatus,
) -> AppResult<Comment> {
    let comment = state.cohort_client.get_comment(id).await?;
    staff_access(state, user, comment.class_id).await?;
    state.cohort_client.moderate_comment(id, status).await
}

/// Post a comment on a survey as a student of its class
#[utoipa::path(
    post,
    path = "/surveys/{id}/comments",
    tag = "Comments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Survey ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment awaiting moderation", body = Comment),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not on the class roster"),
        (status = 404, description = "Survey not found")
    )
)]
pub async fn create_comment(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let (detail, access) = survey_access(&state, &current_user, id).await?;
    if !access.sees(&detail.survey) {
        return Err(AppError::NotFound);
    }
    let author_id = access.student_id()?;

    let comment = state
        .cohort_client
        .add_comment(
            id,
            NewComment {
                author_id,
                subject_id: req.subject_id,
                body: req.body,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// List comments in a class
#[utoipa::path(
    get,
    path = "/classes/{id}/comments",
    tag = "Comments",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Class ID"),
        ListCommentsParams
    ),
    responses(
        (status = 200, description = "Comments; approved only for students", body = Vec<Comment>),
        (status = 403, description = "Not on the class roster")
    )
)]
pub async fn list_comments(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ListCommentsParams>,
) -> AppResult<Json<Vec<Comment>>> {
    let access = class_access(&state, &current_user, id).await?;
    let comments = state
        .cohort_client
        .list_comments(id, status_filter(access, params.status))
        .await?;
    Ok(Json(comments))
}

/// Approve a comment (class staff)
#[utoipa::path(
    post,
    path = "/comments/{id}/approve",
    tag = "Comments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment approved", body = Comment),
        (status = 403, description = "Not staff of the class"),
        (status = 404, description = "Comment not found")
    )
)]
pub async fn approve_comment(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Comment>> {
    let comment = moderate(&state, &current_user, id, CommentStatus::Approved).await?;
    Ok(Json(comment))
}

/// Reject a comment (class staff)
#[utoipa::path(
    post,
    path = "/comments/{id}/reject",
    tag = "Comments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment rejected", body = Comment),
        (status = 403, description = "Not staff of the class"),
        (status = 404, description = "Comment not found")
    )
)]
pub async fn reject_comment(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Comment>> {
    let comment = moderate(&state, &current_user, id, CommentStatus::Rejected).await?;
    Ok(Json(comment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_students_are_pinned_to_approved() {
        let student = ClassAccess::Student {
            member_id: Uuid::new_v4(),
        };
        assert_eq!(
            status_filter(student, Some(CommentStatus::Pending)),
            Some(CommentStatus::Approved)
        );
        assert_eq!(status_filter(student, None), Some(CommentStatus::Approved));
    }

    #[test]
    fn test_staff_filter_is_passed_through() {
        assert_eq!(status_filter(ClassAccess::Admin, None), None);
        assert_eq!(
            status_filter(ClassAccess::Admin, Some(CommentStatus::Rejected)),
            Some(CommentStatus::Rejected)
        );
    }

    #[test]
    fn test_status_query_parses_lowercase() {
        let params: ListCommentsParams =
            serde_json::from_value(serde_json::json!({ "status": "pending" })).unwrap();
        assert_eq!(params.status, Some(CommentStatus::Pending));
    }
}
