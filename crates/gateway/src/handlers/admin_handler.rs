//! Admin handlers for accounts and invitations.

use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
    routing::{delete, get, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use common::{AppError, AppResult};
use domain::{check_role_change, is_valid_role, Invitation, Role, User};

use crate::extractors::ValidatedJson;
use crate::middleware::{require_admin, CurrentUser};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUsersParams {
    /// Page size, at most 100
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// One page of users.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: i32,
}

/// Role change request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetRoleRequest {
    #[validate(length(min = 1, message = "Role cannot be empty"))]
    #[schema(example = "instructor")]
    pub role: String,
}

impl SetRoleRequest {
    /// Unknown role names are rejected rather than mapped to student.
    fn parse_role(&self) -> AppResult<Role> {
        let role = self.role.trim().to_ascii_lowercase();
        if !is_valid_role(&role) {
            return Err(AppError::validation(format!(
                "Role must be one of admin, instructor, student (got '{}')",
                self.role
            )));
        }
        Ok(Role::from(role))
    }
}

/// Create admin routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:user_id/role", put(set_user_role))
        .route("/admin/invitations", get(list_invitations))
        .route("/admin/invitations/:id", delete(revoke_invitation))
}

/// List users (admin only)
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(ListUsersParams),
    responses(
        (status = 200, description = "Users, newest first", body = UserPage),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_users(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(params): Query<ListUsersParams>,
) -> AppResult<Json<UserPage>> {
    require_admin(&current_user)?;
    let (users, total) = state
        .identity_client
        .list_users(params.limit, params.offset)
        .await?;
    Ok(Json(UserPage { users, total }))
}

/// Promote or demote a user (admin only)
#[utoipa::path(
    put,
    path = "/admin/users/{user_id}/role",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("user_id" = String, Path, description = "Identity provider user ID")),
    request_body = SetRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = User),
        (status = 400, description = "Unknown role or self-demotion"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn set_user_role(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ValidatedJson(req): ValidatedJson<SetRoleRequest>,
) -> AppResult<Json<User>> {
    require_admin(&current_user)?;
    let role = req.parse_role()?;
    check_role_change(&current_user.id, &user_id, role)?;

    let user = state.identity_client.set_role(&user_id, role).await?;
    info!("{} set role of {} to {}", current_user.id, user_id, role);
    Ok(Json(user))
}

/// List pending invitations (admin only)
#[utoipa::path(
    get,
    path = "/admin/invitations",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending invitations", body = Vec<Invitation>),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_invitations(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Invitation>>> {
    require_admin(&current_user)?;
    let invitations = state.identity_client.list_invitations().await?;
    Ok(Json(invitations))
}

/// Revoke a pending invitation (admin only)
#[utoipa::path(
    delete,
    path = "/admin/invitations/{id}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Invitation ID")),
    responses(
        (status = 200, description = "Invitation revoked", body = Invitation),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Invitation not found")
    )
)]
pub async fn revoke_invitation(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Invitation>> {
    require_admin(&current_user)?;
    let invitation = state.identity_client.revoke_invitation(&id).await?;
    Ok(Json(invitation))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(role: &str) -> SetRoleRequest {
        SetRoleRequest {
            role: role.to_string(),
        }
    }

    #[test]
    fn test_role_parsing_is_strict() {
        assert_eq!(request("Instructor").parse_role().unwrap(), Role::Instructor);
        assert_eq!(request(" admin ").parse_role().unwrap(), Role::Admin);
        assert!(matches!(
            request("superuser").parse_role(),
            Err(AppError::Validation(_))
        ));
    }
}
