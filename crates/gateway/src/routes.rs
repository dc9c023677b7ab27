//! Route configuration.

use axum::{middleware, Router};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{
    admin_routes, announcement_routes, class_routes, comment_routes, feedback_routes,
    health_routes, me_routes, results_routes, roster_routes, survey_routes, template_routes,
};
use crate::middleware::{auth_middleware, rate_limit_invite_middleware, rate_limit_middleware};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    // Roster additions send invitation emails (stricter rate limit)
    let roster = roster_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        rate_limit_invite_middleware,
    ));

    // Everything below requires a session token
    let api = Router::new()
        .merge(me_routes())
        .merge(class_routes())
        .merge(template_routes())
        .merge(roster)
        .merge(survey_routes())
        .merge(results_routes())
        .merge(comment_routes())
        .merge(feedback_routes())
        .merge(announcement_routes())
        .merge(admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        // Health check (no auth, no rate limit)
        .merge(health_routes())
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header::AUTHORIZATION, Method, Request, StatusCode};
    use chrono::Utc;
    use mockall::predicate::eq;
    use tower::ServiceExt;
    use uuid::Uuid;

    use domain::{
        Comment, CommentStatus, MemberKind, Membership, Role, SessionIdentity, Survey,
        SurveyDetail, SurveyKind,
    };

    use super::*;
    use crate::clients::{MockCohortApi, MockIdentityApi};
    use crate::config::GatewayConfig;
    use crate::middleware::{gap_analysis_key, survey_summary_key, Cache, MockCacheStore};

    fn signed_in(user_id: &str, role: Role) -> MockIdentityApi {
        let user_id = user_id.to_string();
        let mut identity = MockIdentityApi::new();
        identity.expect_verify_token().returning(move |_| {
            Ok(Some(SessionIdentity {
                user_id: user_id.clone(),
                email: format!("{}@example.org", user_id),
                role,
            }))
        });
        identity
    }

    /// Store that never hits and accepts every write.
    fn empty_store() -> MockCacheStore {
        let mut store = MockCacheStore::new();
        store.expect_get().returning(|_| Ok(None));
        store.expect_set_ex().returning(|_, _, _| Ok(()));
        store.expect_delete().returning(|_| Ok(()));
        store.expect_incr_window().returning(|_, _| Ok(1));
        store
    }

    fn app(identity: MockIdentityApi, cohort: MockCohortApi, store: MockCacheStore) -> Router {
        let state = AppState::new(
            Arc::new(identity),
            Arc::new(cohort),
            Arc::new(Cache::new(Arc::new(store), 60)),
            GatewayConfig::default(),
        );
        create_router(state)
    }

    fn request(method: Method, uri: &str, body: Option<&str>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, "Bearer session-token");
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn survey(class_id: Uuid, is_open: bool) -> Survey {
        Survey {
            id: Uuid::new_v4(),
            class_id,
            title: "Week 3 check-in".to_string(),
            kind: SurveyKind::CourseFeedback,
            week: Some(3),
            is_open,
            due_at: None,
            created_at: Utc::now(),
        }
    }

    fn student_of(class_id: Uuid) -> Vec<Membership> {
        vec![Membership {
            class_id,
            member_id: Uuid::new_v4(),
            kind: MemberKind::Student,
        }]
    }

    #[tokio::test]
    async fn test_instructor_cannot_create_class() {
        let mut cohort = MockCohortApi::new();
        cohort.expect_create_class().never();

        let response = app(signed_in("user_2", Role::Instructor), cohort, empty_store())
            .oneshot(request(
                Method::POST,
                "/classes",
                Some(r#"{"name":"Spring Fellowship","start_date":"2025-03-03","duration_weeks":12}"#),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_non_member_cannot_read_class() {
        let class_id = Uuid::new_v4();
        let mut cohort = MockCohortApi::new();
        cohort
            .expect_list_memberships()
            .with(eq("user_3"), eq(Some(class_id)))
            .returning(|_, _| Ok(vec![]));
        cohort.expect_get_class().never();

        let response = app(signed_in("user_3", Role::Student), cohort, empty_store())
            .oneshot(request(Method::GET, &format!("/classes/{}", class_id), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_hidden_survey_is_not_found_for_students() {
        let class_id = Uuid::new_v4();
        let hidden = survey(class_id, false);
        let survey_id = hidden.id;

        let mut cohort = MockCohortApi::new();
        cohort
            .expect_get_survey()
            .with(eq(survey_id))
            .returning(move |_| {
                Ok(SurveyDetail {
                    survey: hidden.clone(),
                    questions: vec![],
                })
            });
        cohort
            .expect_list_memberships()
            .returning(move |_, _| Ok(student_of(class_id)));

        let response = app(signed_in("user_4", Role::Student), cohort, empty_store())
            .oneshot(request(Method::GET, &format!("/surveys/{}", survey_id), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_students_cannot_comment_on_hidden_survey() {
        let class_id = Uuid::new_v4();
        let hidden = survey(class_id, false);
        let survey_id = hidden.id;

        let mut cohort = MockCohortApi::new();
        cohort.expect_get_survey().returning(move |_| {
            Ok(SurveyDetail {
                survey: hidden.clone(),
                questions: vec![],
            })
        });
        cohort
            .expect_list_memberships()
            .returning(move |_, _| Ok(student_of(class_id)));
        cohort.expect_add_comment().never();

        let response = app(signed_in("user_4", Role::Student), cohort, empty_store())
            .oneshot(request(
                Method::POST,
                &format!("/surveys/{}/comments", survey_id),
                Some(r#"{"body":"Too early to say"}"#),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_students_only_list_approved_comments() {
        let class_id = Uuid::new_v4();
        let approved = Comment {
            id: Uuid::new_v4(),
            survey_id: Uuid::new_v4(),
            class_id,
            author_id: Uuid::new_v4(),
            subject_id: None,
            body: "Great week".to_string(),
            status: CommentStatus::Approved,
            created_at: Utc::now(),
            moderated_at: Some(Utc::now()),
        };

        let mut cohort = MockCohortApi::new();
        cohort
            .expect_list_memberships()
            .returning(move |_, _| Ok(student_of(class_id)));
        cohort
            .expect_list_comments()
            .with(eq(class_id), eq(Some(CommentStatus::Approved)))
            .times(1)
            .returning(move |_, _| Ok(vec![approved.clone()]));

        let response = app(signed_in("user_4", Role::Student), cohort, empty_store())
            .oneshot(request(
                Method::GET,
                &format!("/classes/{}/comments?status=pending", class_id),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let comments: Vec<Comment> = serde_json::from_slice(&body).unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].status, CommentStatus::Approved);
    }

    #[tokio::test]
    async fn test_admin_cannot_demote_self() {
        let mut identity = signed_in("user_1", Role::Admin);
        identity.expect_set_role().never();

        let response = app(identity, MockCohortApi::new(), empty_store())
            .oneshot(request(
                Method::PUT,
                "/admin/users/user_1/role",
                Some(r#"{"role":"instructor"}"#),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_removing_student_drops_every_survey_summary() {
        let class_id = Uuid::new_v4();
        let member_id = Uuid::new_v4();
        let surveys = vec![survey(class_id, true), survey(class_id, false)];
        let expected_keys = vec![
            gap_analysis_key(class_id),
            survey_summary_key(surveys[0].id),
            survey_summary_key(surveys[1].id),
        ];

        let mut cohort = MockCohortApi::new();
        cohort
            .expect_remove_member()
            .with(eq(class_id), eq(MemberKind::Student), eq(member_id))
            .times(1)
            .returning(|_, _, _| Ok(()));
        cohort
            .expect_list_surveys()
            .with(eq(class_id))
            .returning(move |_| Ok(surveys.clone()));

        let mut store = MockCacheStore::new();
        store.expect_incr_window().returning(|_, _| Ok(1));
        store
            .expect_delete()
            .with(eq(expected_keys))
            .times(1)
            .returning(|_| Ok(()));

        let response = app(signed_in("user_1", Role::Admin), cohort, store)
            .oneshot(request(
                Method::DELETE,
                &format!("/classes/{}/students/{}", class_id, member_id),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
