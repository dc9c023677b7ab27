//! OpenAPI documentation.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::handlers::admin_handler::{SetRoleRequest, UserPage};
use crate::handlers::announcement_handler::CreateAnnouncementRequest;
use crate::handlers::class_handler::{CreateClassRequest, UpdateClassRequest};
use crate::handlers::comment_handler::CreateCommentRequest;
use crate::handlers::feedback_handler::{FeedbackReport, SubmitFeedbackRequest};
use crate::handlers::health_handler::{HealthResponse, ServiceHealth, ServiceStatus};
use crate::handlers::me_handler::MeResponse;
use crate::handlers::roster_handler::AddMemberRequest;
use crate::handlers::survey_handler::{
    AddQuestionRequest, CreateSurveyRequest, SubmitResponseRequest, UpdateSurveyRequest,
};
use crate::handlers::template_handler::{
    ApplyTemplateRequest, CreateClassTemplateRequest, CreateFellowshipTemplateRequest,
};
use domain::{
    Announcement, Answer, Class, ClassTemplate, Comment, CommentStatus, CompetencyGap, CourseWeek,
    Feedback, FeedbackSummary, FellowshipTemplate, GapAnalysis, Invitation, InvitationStatus,
    Member, MemberKind, Membership, NewAnswer, Question, QuestionDraft, QuestionKind,
    QuestionSummary, Role, StudentGap, Survey, SurveyDetail, SurveyKind, SurveyResponse,
    SurveySummary, User, WeekFeedback, WeekInfo,
};

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health_handler::health_check,
        crate::handlers::me_handler::get_me,
        crate::handlers::class_handler::list_classes,
        crate::handlers::class_handler::create_class,
        crate::handlers::class_handler::get_class,
        crate::handlers::class_handler::update_class,
        crate::handlers::class_handler::delete_class,
        crate::handlers::class_handler::archive_class,
        crate::handlers::class_handler::get_class_week,
        crate::handlers::template_handler::list_class_templates,
        crate::handlers::template_handler::create_class_template,
        crate::handlers::template_handler::delete_class_template,
        crate::handlers::template_handler::list_fellowship_templates,
        crate::handlers::template_handler::create_fellowship_template,
        crate::handlers::template_handler::apply_fellowship_template,
        crate::handlers::roster_handler::list_instructors,
        crate::handlers::roster_handler::add_instructor,
        crate::handlers::roster_handler::remove_instructor,
        crate::handlers::roster_handler::list_students,
        crate::handlers::roster_handler::add_student,
        crate::handlers::roster_handler::remove_student,
        crate::handlers::survey_handler::list_surveys,
        crate::handlers::survey_handler::create_survey,
        crate::handlers::survey_handler::get_survey,
        crate::handlers::survey_handler::update_survey,
        crate::handlers::survey_handler::delete_survey,
        crate::handlers::survey_handler::add_question,
        crate::handlers::survey_handler::delete_question,
        crate::handlers::survey_handler::submit_response,
        crate::handlers::survey_handler::list_responses,
        crate::handlers::results_handler::get_survey_summary,
        crate::handlers::results_handler::get_gap_analysis,
        crate::handlers::comment_handler::create_comment,
        crate::handlers::comment_handler::list_comments,
        crate::handlers::comment_handler::approve_comment,
        crate::handlers::comment_handler::reject_comment,
        crate::handlers::feedback_handler::submit_feedback,
        crate::handlers::feedback_handler::list_feedback,
        crate::handlers::announcement_handler::list_announcements,
        crate::handlers::announcement_handler::create_announcement,
        crate::handlers::announcement_handler::pin_announcement,
        crate::handlers::announcement_handler::unpin_announcement,
        crate::handlers::announcement_handler::delete_announcement,
        crate::handlers::admin_handler::list_users,
        crate::handlers::admin_handler::set_user_role,
        crate::handlers::admin_handler::list_invitations,
        crate::handlers::admin_handler::revoke_invitation,
    ),
    components(
        schemas(
            HealthResponse,
            ServiceStatus,
            ServiceHealth,
            MeResponse,
            CreateClassRequest,
            UpdateClassRequest,
            CreateClassTemplateRequest,
            CreateFellowshipTemplateRequest,
            ApplyTemplateRequest,
            AddMemberRequest,
            CreateSurveyRequest,
            UpdateSurveyRequest,
            AddQuestionRequest,
            SubmitResponseRequest,
            CreateCommentRequest,
            SubmitFeedbackRequest,
            FeedbackReport,
            CreateAnnouncementRequest,
            SetRoleRequest,
            UserPage,
            Role,
            User,
            Invitation,
            InvitationStatus,
            Class,
            ClassTemplate,
            WeekInfo,
            CourseWeek,
            Member,
            MemberKind,
            Membership,
            Survey,
            SurveyKind,
            SurveyDetail,
            Question,
            QuestionKind,
            QuestionDraft,
            FellowshipTemplate,
            SurveyResponse,
            Answer,
            NewAnswer,
            SurveySummary,
            QuestionSummary,
            GapAnalysis,
            StudentGap,
            CompetencyGap,
            Comment,
            CommentStatus,
            Feedback,
            FeedbackSummary,
            WeekFeedback,
            Announcement,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Dependency health"),
        (name = "Profile", description = "Signed-in user"),
        (name = "Classes", description = "Class lifecycle and calendar"),
        (name = "Templates", description = "Class and fellowship templates"),
        (name = "Roster", description = "Instructors and students"),
        (name = "Surveys", description = "Surveys, questions and responses"),
        (name = "Results", description = "Survey summaries and gap analysis"),
        (name = "Comments", description = "Moderated survey comments"),
        (name = "Feedback", description = "Weekly course feedback"),
        (name = "Announcements", description = "Class announcements"),
        (name = "Admin", description = "Accounts, roles and invitations"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes_and_security() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/classes/{id}/gap-analysis"));
        assert!(doc.paths.paths.contains_key("/admin/users/{user_id}/role"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
