//! Announcement handlers.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use common::AppResult;
use domain::{Announcement, NewAnnouncement};

use crate::access::{class_access, staff_access};
use crate::extractors::ValidatedJson;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Announcement creation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAnnouncementRequest {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    #[schema(example = "Demo day moved to Friday")]
    pub title: String,
    #[validate(length(min = 1, max = 5000, message = "Body must be 1 to 5000 characters"))]
    pub body: String,
    #[serde(default)]
    pub pinned: bool,
}

/// Create announcement routes
pub fn announcement_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/classes/:id/announcements",
            get(list_announcements).post(create_announcement),
        )
        .route("/announcements/:id/pin", post(pin_announcement))
        .route("/announcements/:id/unpin", post(unpin_announcement))
        .route("/announcements/:id", delete(delete_announcement))
}

async fn set_pinned(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
    pinned: bool,
) -> AppResult<Announcement> {
    let announcement = state.cohort_client.get_announcement(id).await?;
    staff_access(state, user, announcement.class_id).await?;
    state.cohort_client.set_announcement_pinned(id, pinned).await
}

/// List announcements, pinned first then newest
#[utoipa::path(
    get,
    path = "/classes/{id}/announcements",
    tag = "Announcements",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Announcements", body = Vec<Announcement>),
        (status = 403, description = "Not on the class roster")
    )
)]
pub async fn list_announcements(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Announcement>>> {
    class_access(&state, &current_user, id).await?;
    let announcements = state.cohort_client.list_announcements(id).await?;
    Ok(Json(announcements))
}

/// Post an announcement (class staff)
#[utoipa::path(
    post,
    path = "/classes/{id}/announcements",
    tag = "Announcements",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Class ID")),
    request_body = CreateAnnouncementRequest,
    responses(
        (status = 201, description = "Announcement posted", body = Announcement),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not staff of the class")
    )
)]
pub async fn create_announcement(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateAnnouncementRequest>,
) -> AppResult<(StatusCode, Json<Announcement>)> {
    staff_access(&state, &current_user, id).await?;

    let announcement = state
        .cohort_client
        .create_announcement(
            id,
            NewAnnouncement {
                title: req.title,
                body: req.body,
                author_user_id: current_user.id,
                pinned: req.pinned,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(announcement)))
}

/// Pin an announcement (class staff)
#[utoipa::path(
    post,
    path = "/announcements/{id}/pin",
    tag = "Announcements",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Announcement ID")),
    responses(
        (status = 200, description = "Announcement pinned", body = Announcement),
        (status = 403, description = "Not staff of the class"),
        (status = 404, description = "Announcement not found")
    )
)]
pub async fn pin_announcement(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Announcement>> {
    Ok(Json(set_pinned(&state, &current_user, id, true).await?))
}

/// Unpin an announcement (class staff)
#[utoipa::path(
    post,
    path = "/announcements/{id}/unpin",
    tag = "Announcements",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Announcement ID")),
    responses(
        (status = 200, description = "Announcement unpinned", body = Announcement),
        (status = 403, description = "Not staff of the class"),
        (status = 404, description = "Announcement not found")
    )
)]
pub async fn unpin_announcement(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Announcement>> {
    Ok(Json(set_pinned(&state, &current_user, id, false).await?))
}

/// Delete an announcement (class staff)
#[utoipa::path(
    delete,
    path = "/announcements/{id}",
    tag = "Announcements",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Announcement ID")),
    responses(
        (status = 204, description = "Announcement deleted"),
        (status = 403, description = "Not staff of the class"),
        (status = 404, description = "Announcement not found")
    )
)]
pub async fn delete_announcement(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let announcement = state.cohort_client.get_announcement(id).await?;
    staff_access(&state, &current_user, announcement.class_id).await?;
    state.cohort_client.delete_announcement(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
