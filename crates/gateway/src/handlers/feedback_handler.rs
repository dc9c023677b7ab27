//! Weekly course feedback handlers.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use common::AppResult;
use domain::analytics::feedback_summary;
use domain::{Feedback, FeedbackSummary, NewFeedback};

use crate::access::{staff_access, student_access};
use crate::extractors::ValidatedJson;
use crate::middleware::{feedback_summary_key, CurrentUser};
use crate::state::AppState;

/// Course feedback submission
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitFeedbackRequest {
    #[validate(range(min = 1, message = "Week numbers start at 1"))]
    #[schema(example = 3)]
    pub week: i32,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    #[schema(example = 4)]
    pub rating: i32,
    #[validate(length(max = 5000, message = "Feedback must be at most 5000 characters"))]
    #[serde(default)]
    pub body: String,
    /// Leave the student off the stored row
    #[serde(default)]
    pub anonymous: bool,
}

/// Feedback rows with their summary.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeedbackReport {
    pub summary: FeedbackSummary,
    pub feedback: Vec<Feedback>,
}

/// Create feedback routes
pub fn feedback_routes() -> Router<AppState> {
    Router::new().route(
        "/classes/:id/feedback",
        get(list_feedback).post(submit_feedback),
    )
}

/// Submit weekly feedback as a student of the class
#[utoipa::path(
    post,
    path = "/classes/{id}/feedback",
    tag = "Feedback",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Class ID")),
    request_body = SubmitFeedbackRequest,
    responses(
        (status = 201, description = "Feedback recorded", body = Feedback),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not on the class roster")
    )
)]
pub async fn submit_feedback(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SubmitFeedbackRequest>,
) -> AppResult<(StatusCode, Json<Feedback>)> {
    let student_id = student_access(&state, &current_user, id).await?;

    let feedback = state
        .cohort_client
        .submit_feedback(
            id,
            NewFeedback {
                student_id: (!req.anonymous).then_some(student_id),
                week: req.week,
                rating: req.rating,
                body: req.body,
            },
        )
        .await?;
    state.cache.invalidate_feedback(id).await;
    Ok((StatusCode::CREATED, Json(feedback)))
}

/// Feedback rows and per-week averages (class staff)
#[utoipa::path(
    get,
    path = "/classes/{id}/feedback",
    tag = "Feedback",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Feedback with summary", body = FeedbackReport),
        (status = 403, description = "Not staff of the class")
    )
)]
pub async fn list_feedback(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<FeedbackReport>> {
    staff_access(&state, &current_user, id).await?;

    let client = state.cohort_client.clone();
    let report = state
        .cache
        .get_or_compute(&feedback_summary_key(id), move || async move {
            let feedback = client.list_feedback(id).await?;
            Ok(FeedbackReport {
                summary: feedback_summary(&feedback),
                feedback,
            })
        })
        .await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_request_validation() {
        let req: SubmitFeedbackRequest =
            serde_json::from_value(serde_json::json!({ "week": 2, "rating": 5 })).unwrap();
        assert!(req.validate().is_ok());
        assert!(!req.anonymous);
        assert_eq!(req.body, "");

        let req: SubmitFeedbackRequest =
            serde_json::from_value(serde_json::json!({ "week": 0, "rating": 5 })).unwrap();
        assert!(req.validate().is_err());

        let req: SubmitFeedbackRequest =
            serde_json::from_value(serde_json::json!({ "week": 1, "rating": 6 })).unwrap();
        assert!(req.validate().is_err());
    }
}
