//! Signed-in user profile.

use axum::{
    extract::{Extension, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use common::AppResult;
use domain::{Membership, Role};

use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Profile of the signed-in user.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    #[schema(example = "user_2abcXYZ")]
    pub user_id: String,
    pub email: String,
    pub role: Role,
    /// Roster rows linked to the account by this request
    pub claimed: i32,
    pub memberships: Vec<Membership>,
}

/// Create profile routes
pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// Current user, claiming roster invitations sent to their email
#[utoipa::path(
    get,
    path = "/me",
    tag = "Profile",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user and class memberships", body = MeResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_me(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<MeResponse>> {
    // Session tokens may omit the email claim
    let email = if current_user.email.is_empty() {
        state.identity_client.get_user(&current_user.id).await?.email
    } else {
        current_user.email.clone()
    };

    let (claimed, memberships) = if email.is_empty() {
        let memberships = state
            .cohort_client
            .list_memberships(&current_user.id, None)
            .await?;
        (0, memberships)
    } else {
        state
            .cohort_client
            .claim_memberships(&current_user.id, &email)
            .await?
    };

    if claimed > 0 {
        info!(
            "Linked {} roster entries to user {}",
            claimed, current_user.id
        );
    }

    Ok(Json(MeResponse {
        user_id: current_user.id,
        email,
        role: current_user.role,
        claimed,
        memberships,
    }))
}
