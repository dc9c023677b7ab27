//! Computed survey results.
//!
//! Summaries and gap analyses are derived from the raw responses on every
//! cache miss and kept in Redis for the results TTL. Writes that change the
//! underlying rows drop the cached copies.

use axum::{
    extract::{Extension, Path, State},
    response::Json,
    routing::get,
    Router,
};
use tracing::warn;
use uuid::Uuid;

use common::AppResult;
use domain::analytics::{gap_analysis, survey_summary};
use domain::{GapAnalysis, SurveySummary};

use crate::access::staff_access;
use crate::middleware::{gap_analysis_key, survey_summary_key, CurrentUser};
use crate::state::AppState;

/// Create results routes
pub fn results_routes() -> Router<AppState> {
    Router::new()
        .route("/surveys/:id/summary", get(get_survey_summary))
        .route("/classes/:id/gap-analysis", get(get_gap_analysis))
}

/// Per-question statistics for a survey (class staff)
#[utoipa::path(
    get,
    path = "/surveys/{id}/summary",
    tag = "Results",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Survey ID")),
    responses(
        (status = 200, description = "Response counts, averages and rating distributions", body = SurveySummary),
        (status = 403, description = "Not staff of the class"),
        (status = 404, description = "Survey not found")
    )
)]
pub async fn get_survey_summary(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SurveySummary>> {
    let detail = state.cohort_client.get_survey(id).await?;
    staff_access(&state, &current_user, detail.survey.class_id).await?;

    let client = state.cohort_client.clone();
    let summary = state
        .cache
        .get_or_compute(&survey_summary_key(id), move || async move {
            let responses = client.list_responses(id).await?;
            Ok(survey_summary(&detail, &responses))
        })
        .await?;
    Ok(Json(summary))
}

/// Self versus peer ratings per student and competency (class staff)
#[utoipa::path(
    get,
    path = "/classes/{id}/gap-analysis",
    tag = "Results",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Gap analysis; gap is self minus peer", body = GapAnalysis),
        (status = 403, description = "Not staff of the class"),
        (status = 404, description = "Class not found")
    )
)]
pub async fn get_gap_analysis(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<GapAnalysis>> {
    staff_access(&state, &current_user, id).await?;

    let client = state.cohort_client.clone();
    let analysis = state
        .cache
        .get_or_compute(&gap_analysis_key(id), move || async move {
            let results = client.class_results(id).await?;
            Ok(gap_analysis(&results))
        })
        .await?;
    Ok(Json(analysis))
}

/// Drop the gap analysis and every survey summary of a class.
///
/// Responses cascade with a removed student, so each summary may change.
pub(crate) async fn invalidate_class_results(state: &AppState, class_id: Uuid) {
    let survey_ids: Vec<Uuid> = match state.cohort_client.list_surveys(class_id).await {
        Ok(surveys) => surveys.into_iter().map(|s| s.id).collect(),
        Err(e) => {
            warn!("Failed to list surveys of class {}: {}", class_id, e);
            Vec::new()
        }
    };
    state.cache.invalidate_results(class_id, &survey_ids).await;
}
