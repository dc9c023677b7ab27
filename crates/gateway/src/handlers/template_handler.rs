//! Class and fellowship template handlers.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use common::AppResult;
use domain::{
    ClassTemplate, FellowshipTemplate, NewClassTemplate, NewFellowshipTemplate, QuestionDraft,
    SurveyDetail, SurveyKind,
};

use crate::access::staff_access;
use crate::extractors::ValidatedJson;
use crate::middleware::{require_admin, require_staff, CurrentUser};
use crate::state::AppState;

/// Class template creation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateClassTemplateRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    #[schema(example = "12-week fellowship")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 1, max = 52, message = "Duration must be between 1 and 52 weeks"))]
    pub duration_weeks: i32,
    #[serde(default)]
    pub weekly_themes: Vec<String>,
}

/// Fellowship template creation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFellowshipTemplateRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub survey_kind: SurveyKind,
    #[validate(length(min = 1, message = "A fellowship template needs at least one question"))]
    pub questions: Vec<QuestionDraft>,
}

/// Create a survey in a class from a fellowship template
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ApplyTemplateRequest {
    pub class_id: Uuid,
    /// Defaults to the template name
    pub title: Option<String>,
    #[validate(range(min = 1, message = "Week numbers start at 1"))]
    pub week: Option<i32>,
    pub due_at: Option<DateTime<Utc>>,
}

/// Create template routes
pub fn template_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/templates/classes",
            get(list_class_templates).post(create_class_template),
        )
        .route("/templates/classes/:id", delete(delete_class_template))
        .route(
            "/templates/fellowships",
            get(list_fellowship_templates).post(create_fellowship_template),
        )
        .route("/templates/fellowships/:id/apply", post(apply_fellowship_template))
}

/// List class templates (staff)
#[utoipa::path(
    get,
    path = "/templates/classes",
    tag = "Templates",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Class templates", body = Vec<ClassTemplate>),
        (status = 403, description = "Forbidden - Staff only")
    )
)]
pub async fn list_class_templates(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ClassTemplate>>> {
    require_staff(&current_user)?;
    let templates = state.cohort_client.list_class_templates().await?;
    Ok(Json(templates))
}

/// Create a class template (admin only)
#[utoipa::path(
    post,
    path = "/templates/classes",
    tag = "Templates",
    security(("bearer_auth" = [])),
    request_body = CreateClassTemplateRequest,
    responses(
        (status = 201, description = "Template created", body = ClassTemplate),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn create_class_template(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateClassTemplateRequest>,
) -> AppResult<(StatusCode, Json<ClassTemplate>)> {
    require_admin(&current_user)?;
    let template = state
        .cohort_client
        .create_class_template(NewClassTemplate {
            name: req.name,
            description: req.description,
            duration_weeks: req.duration_weeks,
            weekly_themes: req.weekly_themes,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// Delete a class template (admin only)
#[utoipa::path(
    delete,
    path = "/templates/classes/{id}",
    tag = "Templates",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Template ID")),
    responses(
        (status = 204, description = "Template deleted"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Template not found")
    )
)]
pub async fn delete_class_template(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&current_user)?;
    state.cohort_client.delete_class_template(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List fellowship templates (staff)
#[utoipa::path(
    get,
    path = "/templates/fellowships",
    tag = "Templates",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Fellowship templates", body = Vec<FellowshipTemplate>),
        (status = 403, description = "Forbidden - Staff only")
    )
)]
pub async fn list_fellowship_templates(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<FellowshipTemplate>>> {
    require_staff(&current_user)?;
    let templates = state.cohort_client.list_fellowship_templates().await?;
    Ok(Json(templates))
}

/// Create a fellowship template (admin only)
#[utoipa::path(
    post,
    path = "/templates/fellowships",
    tag = "Templates",
    security(("bearer_auth" = [])),
    request_body = CreateFellowshipTemplateRequest,
    responses(
        (status = 201, description = "Template created", body = FellowshipTemplate),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn create_fellowship_template(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateFellowshipTemplateRequest>,
) -> AppResult<(StatusCode, Json<FellowshipTemplate>)> {
    require_admin(&current_user)?;
    let template = state
        .cohort_client
        .create_fellowship_template(NewFellowshipTemplate {
            name: req.name,
            description: req.description,
            survey_kind: req.survey_kind,
            questions: req.questions,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// Create a survey in a class from a fellowship template
#[utoipa::path(
    post,
    path = "/templates/fellowships/{id}/apply",
    tag = "Templates",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Template ID")),
    request_body = ApplyTemplateRequest,
    responses(
        (status = 201, description = "Survey created with the template's questions", body = SurveyDetail),
        (status = 403, description = "Not staff of the class"),
        (status = 404, description = "Template or class not found")
    )
)]
pub async fn apply_fellowship_template(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ApplyTemplateRequest>,
) -> AppResult<(StatusCode, Json<SurveyDetail>)> {
    staff_access(&state, &current_user, req.class_id).await?;
    let detail = state
        .cohort_client
        .apply_fellowship_template(id, req.class_id, req.title, req.week, req.due_at)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}
