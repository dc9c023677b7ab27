//! Class handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use common::AppResult;
use domain::{Class, ClassUpdate, NewClass, WeekInfo};

use crate::access::class_access;
use crate::extractors::ValidatedJson;
use crate::middleware::{require_admin, CurrentUser};
use crate::state::AppState;

/// Class creation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateClassRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    #[schema(example = "Spring Fellowship 2025")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schema(value_type = String, format = Date, example = "2025-03-03")]
    pub start_date: NaiveDate,
    /// Defaults to the template's duration when `template_id` is set
    #[validate(range(min = 1, max = 52, message = "Duration must be between 1 and 52 weeks"))]
    pub duration_weeks: Option<i32>,
    pub weekly_themes: Option<Vec<String>>,
    pub template_id: Option<Uuid>,
}

/// Class update request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateClassRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    #[validate(range(min = 1, max = 52, message = "Duration must be between 1 and 52 weeks"))]
    pub duration_weeks: Option<i32>,
    pub weekly_themes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListClassesParams {
    /// Include archived classes
    #[serde(default)]
    pub include_archived: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ArchiveParams {
    /// `false` restores an archived class
    #[serde(default = "default_archived")]
    pub archived: bool,
}

fn default_archived() -> bool {
    true
}

impl From<CreateClassRequest> for NewClass {
    fn from(req: CreateClassRequest) -> Self {
        NewClass {
            name: req.name,
            description: req.description,
            start_date: req.start_date,
            duration_weeks: req.duration_weeks,
            weekly_themes: req.weekly_themes,
            template_id: req.template_id,
        }
    }
}

impl From<UpdateClassRequest> for ClassUpdate {
    fn from(req: UpdateClassRequest) -> Self {
        ClassUpdate {
            name: req.name,
            description: req.description,
            start_date: req.start_date,
            duration_weeks: req.duration_weeks,
            weekly_themes: req.weekly_themes,
        }
    }
}

/// Create class routes
pub fn class_routes() -> Router<AppState> {
    Router::new()
        .route("/classes", get(list_classes).post(create_class))
        .route(
            "/classes/:id",
            get(get_class).put(update_class).delete(delete_class),
        )
        .route("/classes/:id/archive", post(archive_class))
        .route("/classes/:id/week", get(get_class_week))
}

/// List classes visible to the caller
#[utoipa::path(
    get,
    path = "/classes",
    tag = "Classes",
    security(("bearer_auth" = [])),
    params(ListClassesParams),
    responses(
        (status = 200, description = "All classes for admins, own classes otherwise", body = Vec<Class>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_classes(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(params): Query<ListClassesParams>,
) -> AppResult<Json<Vec<Class>>> {
    let roster_filter = (!current_user.is_admin()).then(|| current_user.id.clone());
    let classes = state
        .cohort_client
        .list_classes(params.include_archived, roster_filter)
        .await?;
    Ok(Json(classes))
}

/// Create a class (admin only)
#[utoipa::path(
    post,
    path = "/classes",
    tag = "Classes",
    security(("bearer_auth" = [])),
    request_body = CreateClassRequest,
    responses(
        (status = 201, description = "Class created", body = Class),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Template not found")
    )
)]
pub async fn create_class(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateClassRequest>,
) -> AppResult<(StatusCode, Json<Class>)> {
    require_admin(&current_user)?;
    let class = state.cohort_client.create_class(req.into()).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

/// Get a class the caller belongs to
#[utoipa::path(
    get,
    path = "/classes/{id}",
    tag = "Classes",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class", body = Class),
        (status = 403, description = "Not on the class roster"),
        (status = 404, description = "Class not found")
    )
)]
pub async fn get_class(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Class>> {
    class_access(&state, &current_user, id).await?;
    let class = state.cohort_client.get_class(id).await?;
    Ok(Json(class))
}

/// Update a class (admin only)
#[utoipa::path(
    put,
    path = "/classes/{id}",
    tag = "Classes",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Class ID")),
    request_body = UpdateClassRequest,
    responses(
        (status = 200, description = "Class updated", body = Class),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Class not found")
    )
)]
pub async fn update_class(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateClassRequest>,
) -> AppResult<Json<Class>> {
    require_admin(&current_user)?;
    let class = state.cohort_client.update_class(id, req.into()).await?;
    Ok(Json(class))
}

/// Delete a class and everything in it (admin only)
#[utoipa::path(
    delete,
    path = "/classes/{id}",
    tag = "Classes",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 204, description = "Class deleted"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Class not found")
    )
)]
pub async fn delete_class(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&current_user)?;
    let surveys = state.cohort_client.list_surveys(id).await?;
    state.cohort_client.delete_class(id).await?;

    let survey_ids: Vec<Uuid> = surveys.into_iter().map(|s| s.id).collect();
    state.cache.invalidate_results(id, &survey_ids).await;
    state.cache.invalidate_feedback(id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Archive or restore a class (admin only)
#[utoipa::path(
    post,
    path = "/classes/{id}/archive",
    tag = "Classes",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Class ID"),
        ArchiveParams
    ),
    responses(
        (status = 200, description = "Archive flag updated", body = Class),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Class not found")
    )
)]
pub async fn archive_class(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ArchiveParams>,
) -> AppResult<Json<Class>> {
    require_admin(&current_user)?;
    let class = state
        .cohort_client
        .archive_class(id, params.archived)
        .await?;
    Ok(Json(class))
}

/// Current program week and its theme
#[utoipa::path(
    get,
    path = "/classes/{id}/week",
    tag = "Classes",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Where the class is on its calendar today", body = WeekInfo),
        (status = 403, description = "Not on the class roster"),
        (status = 404, description = "Class not found")
    )
)]
pub async fn get_class_week(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<WeekInfo>> {
    class_access(&state, &current_user, id).await?;
    let class = state.cohort_client.get_class(id).await?;
    Ok(Json(class.week_info(Utc::now().date_naive())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_validation() {
        let req: CreateClassRequest = serde_json::from_value(serde_json::json!({
            "name": "Spring Fellowship",
            "start_date": "2025-03-03",
            "duration_weeks": 60
        }))
        .unwrap();
        assert!(req.validate().is_err());

        let req: CreateClassRequest = serde_json::from_value(serde_json::json!({
            "name": "Spring Fellowship",
            "start_date": "2025-03-03"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        let new_class = NewClass::from(req);
        assert_eq!(new_class.description, "");
        assert_eq!(new_class.duration_weeks, None);
    }

    #[test]
    fn test_archive_defaults_to_true() {
        let params: ArchiveParams = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(params.archived);
    }
}
