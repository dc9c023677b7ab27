//! Roster handlers.
//!
//! Adding a member sends an identity provider invitation before the roster
//! row is written. The invitee claims the row on first sign-in through `/me`.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get},
    Router,
};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use common::{AppError, AppResult};
use domain::{Member, MemberKind, NewMember, Role};

use crate::access::{class_access, staff_access};
use crate::extractors::ValidatedJson;
use crate::handlers::results_handler::invalidate_class_results;
use crate::middleware::{require_admin, CurrentUser};
use crate::state::AppState;

/// Roster addition request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddMemberRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "grace@example.org")]
    pub email: String,
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    #[schema(example = "Grace Hopper")]
    pub name: String,
}

/// Create roster routes
pub fn roster_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/classes/:id/instructors",
            get(list_instructors).post(add_instructor),
        )
        .route(
            "/classes/:id/instructors/:member_id",
            delete(remove_instructor),
        )
        .route("/classes/:id/students", get(list_students).post(add_student))
        .route("/classes/:id/students/:member_id", delete(remove_student))
}

/// Program role granted by a roster invitation.
fn invite_role(kind: MemberKind) -> Role {
    match kind {
        MemberKind::Instructor => Role::Instructor,
        MemberKind::Student => Role::Student,
    }
}

fn is_on_roster(members: &[Member], email: &str) -> bool {
    members.iter().any(|m| m.email.eq_ignore_ascii_case(email))
}

async fn add_member(
    state: &AppState,
    class_id: Uuid,
    kind: MemberKind,
    req: AddMemberRequest,
) -> AppResult<Member> {
    let member = NewMember {
        email: req.email,
        name: req.name,
    }
    .validate()?;

    // Fail before the invitation goes out
    let existing = state.cohort_client.list_members(class_id, kind).await?;
    if is_on_roster(&existing, &member.email) {
        return Err(AppError::conflict(format!("A {} with this email", kind)));
    }

    match state
        .identity_client
        .invite_user(&member.email, invite_role(kind), Some(class_id))
        .await
    {
        Ok(invitation) => info!("Invitation {} sent to {}", invitation.id, member.email),
        // Already invited or already registered; the roster row is still needed
        Err(AppError::Conflict(_)) => info!("{} already has an account or invitation", member.email),
        Err(e) => return Err(e),
    }

    let added = state
        .cohort_client
        .add_member(class_id, kind, member)
        .await?;

    if kind == MemberKind::Student {
        state.cache.invalidate_results(class_id, &[]).await;
    }
    Ok(added)
}

async fn remove_member(
    state: &AppState,
    class_id: Uuid,
    kind: MemberKind,
    member_id: Uuid,
) -> AppResult<StatusCode> {
    state
        .cohort_client
        .remove_member(class_id, kind, member_id)
        .await?;

    if kind == MemberKind::Student {
        invalidate_class_results(state, class_id).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// List instructors of a class
#[utoipa::path(
    get,
    path = "/classes/{id}/instructors",
    tag = "Roster",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Instructors", body = Vec<Member>),
        (status = 403, description = "Not on the class roster")
    )
)]
pub async fn list_instructors(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Member>>> {
    class_access(&state, &current_user, id).await?;
    let members = state
        .cohort_client
        .list_members(id, MemberKind::Instructor)
        .await?;
    Ok(Json(members))
}

/// Invite and add an instructor (admin only)
#[utoipa::path(
    post,
    path = "/classes/{id}/instructors",
    tag = "Roster",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Class ID")),
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Instructor invited and added", body = Member),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 409, description = "Email already on the roster"),
        (status = 429, description = "Too many invitations")
    )
)]
pub async fn add_instructor(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<AddMemberRequest>,
) -> AppResult<(StatusCode, Json<Member>)> {
    require_admin(&current_user)?;
    let member = add_member(&state, id, MemberKind::Instructor, req).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// Remove an instructor (admin only)
#[utoipa::path(
    delete,
    path = "/classes/{id}/instructors/{member_id}",
    tag = "Roster",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Class ID"),
        ("member_id" = Uuid, Path, description = "Instructor roster ID")
    ),
    responses(
        (status = 204, description = "Instructor removed"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Instructor not found")
    )
)]
pub async fn remove_instructor(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    require_admin(&current_user)?;
    remove_member(&state, id, MemberKind::Instructor, member_id).await
}

/// List students of a class
#[utoipa::path(
    get,
    path = "/classes/{id}/students",
    tag = "Roster",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Students", body = Vec<Member>),
        (status = 403, description = "Not on the class roster")
    )
)]
pub async fn list_students(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Member>>> {
    class_access(&state, &current_user, id).await?;
    let members = state
        .cohort_client
        .list_members(id, MemberKind::Student)
        .await?;
    Ok(Json(members))
}

/// Invite and add a student (class staff)
#[utoipa::path(
    post,
    path = "/classes/{id}/students",
    tag = "Roster",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Class ID")),
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Student invited and added", body = Member),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not staff of the class"),
        (status = 409, description = "Email already on the roster"),
        (status = 429, description = "Too many invitations")
    )
)]
pub async fn add_student(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<AddMemberRequest>,
) -> AppResult<(StatusCode, Json<Member>)> {
    staff_access(&state, &current_user, id).await?;
    let member = add_member(&state, id, MemberKind::Student, req).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// Remove a student (class staff)
#[utoipa::path(
    delete,
    path = "/classes/{id}/students/{member_id}",
    tag = "Roster",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Class ID"),
        ("member_id" = Uuid, Path, description = "Student roster ID")
    ),
    responses(
        (status = 204, description = "Student removed"),
        (status = 403, description = "Not staff of the class"),
        (status = 404, description = "Student not found")
    )
)]
pub async fn remove_student(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    staff_access(&state, &current_user, id).await?;
    remove_member(&state, id, MemberKind::Student, member_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn member(email: &str) -> Member {
        Member {
            id: Uuid::new_v4(),
            class_id: Uuid::new_v4(),
            kind: MemberKind::Student,
            user_id: None,
            email: email.to_string(),
            name: "Ada".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_invitation_role_follows_roster_kind() {
        assert_eq!(invite_role(MemberKind::Instructor), Role::Instructor);
        assert_eq!(invite_role(MemberKind::Student), Role::Student);
    }

    #[test]
    fn test_roster_duplicate_check_ignores_case() {
        let roster = vec![member("ada@example.com")];
        assert!(is_on_roster(&roster, "Ada@Example.com"));
        assert!(!is_on_roster(&roster, "grace@example.org"));
    }

    #[test]
    fn test_add_member_request_rejects_bad_email() {
        let req = AddMemberRequest {
            email: "not-an-email".to_string(),
            name: "Ada".to_string(),
        };
        assert!(req.validate().is_err());
    }
}
