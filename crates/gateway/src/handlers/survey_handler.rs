//! Survey, question and response handlers.

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

use common::{AppError, AppResult};
use domain::{
    NewAnswer, NewResponse, NewSurvey, Question, QuestionDraft, QuestionKind, Survey,
    SurveyDetail, SurveyKind, SurveyResponse, SurveyUpdate,
};

use crate::access::{class_access, staff_access, survey_access};
use crate::extractors::ValidatedJson;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Survey creation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSurveyRequest {
    #[validate(length(min = 1, message = "Survey title cannot be empty"))]
    #[schema(example = "Week 3 self-assessment")]
    pub title: String,
    pub kind: SurveyKind,
    #[validate(range(min = 1, message = "Week numbers start at 1"))]
    pub week: Option<i32>,
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub questions: Vec<QuestionDraft>,
}

/// Survey update request; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSurveyRequest {
    #[validate(length(min = 1, message = "Survey title cannot be empty"))]
    pub title: Option<String>,
    pub is_open: Option<bool>,
    #[validate(range(min = 1, message = "Week numbers start at 1"))]
    pub week: Option<i32>,
    pub due_at: Option<DateTime<Utc>>,
    /// Remove the current due date
    #[serde(default)]
    pub clear_due_at: bool,
}

/// Question appended to a survey
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddQuestionRequest {
    #[validate(length(min = 1, message = "Question prompt cannot be empty"))]
    pub prompt: String,
    pub kind: QuestionKind,
    pub competency: Option<String>,
}

/// Survey response submission
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitResponseRequest {
    /// Classmate being rated; required for peer assessments
    pub subject_id: Option<Uuid>,
    #[validate(length(min = 1, message = "A response needs at least one answer"))]
    pub answers: Vec<NewAnswer>,
}

/// Create survey routes
pub fn survey_routes() -> Router<AppState> {
    Router::new()
        .route("/classes/:id/surveys", get(list_surveys).post(create_survey))
        .route(
            "/surveys/:id",
            get(get_survey).put(update_survey).delete(delete_survey),
        )
        .route("/surveys/:id/questions", post(add_question))
        .route("/surveys/:id/questions/:question_id", delete(delete_question))
        .route(
            "/surveys/:id/responses",
            get(list_responses).post(submit_response),
        )
}

/// List surveys of a class
#[utoipa::path(
    get,
    path = "/classes/{id}/surveys",
    tag = "Surveys",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Surveys; open ones only for students", body = Vec<Survey>),
        (status = 403, description = "Not on the class roster")
    )
)]
pub async fn list_surveys(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Survey>>> {
    let access = class_access(&state, &current_user, id).await?;
    let surveys = state
        .cohort_client
        .list_surveys(id)
        .await?
        .into_iter()
        .filter(|s| access.sees(s))
        .collect();
    Ok(Json(surveys))
}

/// Create a survey (class staff)
#[utoipa::path(
    post,
    path = "/classes/{id}/surveys",
    tag = "Surveys",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Class ID")),
    request_body = CreateSurveyRequest,
    responses(
        (status = 201, description = "Survey created", body = SurveyDetail),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not staff of the class")
    )
)]
pub async fn create_survey(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateSurveyRequest>,
) -> AppResult<(StatusCode, Json<SurveyDetail>)> {
    staff_access(&state, &current_user, id).await?;
    let survey = NewSurvey {
        title: req.title,
        kind: req.kind,
        week: req.week,
        due_at: req.due_at,
    };
    let detail = state
        .cohort_client
        .create_survey(id, survey, req.questions)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Get a survey with its questions
#[utoipa::path(
    get,
    path = "/surveys/{id}",
    tag = "Surveys",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Survey ID")),
    responses(
        (status = 200, description = "Survey and ordered questions", body = SurveyDetail),
        (status = 403, description = "Not on the class roster"),
        (status = 404, description = "Survey not found")
    )
)]
pub async fn get_survey(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SurveyDetail>> {
    let (detail, access) = survey_access(&state, &current_user, id).await?;
    if !access.sees(&detail.survey) {
        return Err(AppError::NotFound);
    }
    Ok(Json(detail))
}

/// Update a survey (class staff)
#[utoipa::path(
    put,
    path = "/surveys/{id}",
    tag = "Surveys",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Survey ID")),
    request_body = UpdateSurveyRequest,
    responses(
        (status = 200, description = "Survey updated", body = Survey),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not staff of the class"),
        (status = 404, description = "Survey not found")
    )
)]
pub async fn update_survey(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateSurveyRequest>,
) -> AppResult<Json<Survey>> {
    let (detail, access) = survey_access(&state, &current_user, id).await?;
    access.require_staff()?;

    let update = SurveyUpdate {
        title: req.title,
        is_open: req.is_open,
        week: req.week,
        due_at: req.due_at,
        clear_due_at: req.clear_due_at,
    };
    let survey = state.cohort_client.update_survey(id, update).await?;
    state
        .cache
        .invalidate_results(detail.survey.class_id, &[id])
        .await;
    Ok(Json(survey))
}

/// Delete a survey with its questions and responses (class staff)
#[utoipa::path(
    delete,
    path = "/surveys/{id}",
    tag = "Surveys",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Survey ID")),
    responses(
        (status = 204, description = "Survey deleted"),
        (status = 403, description = "Not staff of the class"),
        (status = 404, description = "Survey not found")
    )
)]
pub async fn delete_survey(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let (detail, access) = survey_access(&state, &current_user, id).await?;
    access.require_staff()?;

    state.cohort_client.delete_survey(id).await?;
    state
        .cache
        .invalidate_results(detail.survey.class_id, &[id])
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// Append a question (class staff)
#[utoipa::path(
    post,
    path = "/surveys/{id}/questions",
    tag = "Surveys",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Survey ID")),
    request_body = AddQuestionRequest,
    responses(
        (status = 201, description = "Question added at the next position", body = Question),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not staff of the class"),
        (status = 404, description = "Survey not found")
    )
)]
pub async fn add_question(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<AddQuestionRequest>,
) -> AppResult<(StatusCode, Json<Question>)> {
    let (detail, access) = survey_access(&state, &current_user, id).await?;
    access.require_staff()?;

    let draft = QuestionDraft {
        prompt: req.prompt,
        kind: req.kind,
        competency: req.competency,
    };
    let question = state.cohort_client.add_question(id, draft).await?;
    state
        .cache
        .invalidate_results(detail.survey.class_id, &[id])
        .await;
    Ok((StatusCode::CREATED, Json(question)))
}

/// Remove a question and its answers (class staff)
#[utoipa::path(
    delete,
    path = "/surveys/{id}/questions/{question_id}",
    tag = "Surveys",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Survey ID"),
        ("question_id" = Uuid, Path, description = "Question ID")
    ),
    responses(
        (status = 204, description = "Question deleted"),
        (status = 403, description = "Not staff of the class"),
        (status = 404, description = "Question not found")
    )
)]
pub async fn delete_question(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path((id, question_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    let (detail, access) = survey_access(&state, &current_user, id).await?;
    access.require_staff()?;

    state.cohort_client.delete_question(id, question_id).await?;
    state
        .cache
        .invalidate_results(detail.survey.class_id, &[id])
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// Submit a response as a student of the survey's class
#[utoipa::path(
    post,
    path = "/surveys/{id}/responses",
    tag = "Surveys",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Survey ID")),
    request_body = SubmitResponseRequest,
    responses(
        (status = 201, description = "Response recorded", body = SurveyResponse),
        (status = 400, description = "Survey closed or answers invalid"),
        (status = 403, description = "Not on the class roster"),
        (status = 409, description = "Already responded")
    )
)]
pub async fn submit_response(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SubmitResponseRequest>,
) -> AppResult<(StatusCode, Json<SurveyResponse>)> {
    let (detail, access) = survey_access(&state, &current_user, id).await?;
    let respondent_id = access.student_id()?;

    let response = NewResponse {
        respondent_id,
        subject_id: req.subject_id,
        answers: req.answers,
    };
    let recorded = state.cohort_client.submit_response(id, response).await?;
    state
        .cache
        .invalidate_results(detail.survey.class_id, &[id])
        .await;
    Ok((StatusCode::CREATED, Json(recorded)))
}

/// List responses with answers (class staff)
#[utoipa::path(
    get,
    path = "/surveys/{id}/responses",
    tag = "Surveys",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Survey ID")),
    responses(
        (status = 200, description = "Responses", body = Vec<SurveyResponse>),
        (status = 403, description = "Not staff of the class"),
        (status = 404, description = "Survey not found")
    )
)]
pub async fn list_responses(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<SurveyResponse>>> {
    let (_, access) = survey_access(&state, &current_user, id).await?;
    access.require_staff()?;

    let responses = state.cohort_client.list_responses(id).await?;
    Ok(Json(responses))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_request_needs_answers() {
        let req: SubmitResponseRequest =
            serde_json::from_value(serde_json::json!({ "answers": [] })).unwrap();
        assert!(req.validate().is_err());

        let req: SubmitResponseRequest = serde_json::from_value(serde_json::json!({
            "answers": [{ "question_id": Uuid::new_v4(), "rating": 4, "text": null }]
        }))
        .unwrap();
        assert!(req.validate().is_ok());
    }
}
