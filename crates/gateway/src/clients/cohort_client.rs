//! gRPC client for cohort-service.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
#[cfg(test)]
use mockall::automock;
use tonic::transport::Channel;
use tracing::debug;
use uuid::Uuid;

use super::convert;
use common::wire::format_date;
use common::{AppError, AppResult};
use domain::{
    Announcement, Class, ClassResults, ClassTemplate, ClassUpdate, Comment, CommentStatus,
    Feedback, FellowshipTemplate, Member, MemberKind, Membership, NewAnnouncement, NewClass,
    NewClassTemplate, NewComment, NewFeedback, NewFellowshipTemplate, NewMember, NewResponse,
    NewSurvey, Question, QuestionDraft, Survey, SurveyDetail, SurveyResponse, SurveyUpdate,
};
use proto::cohort as pb;
use proto::{ClassServiceClient, EngagementServiceClient, RosterServiceClient, SurveyServiceClient};

fn opt_timestamp(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|dt| dt.to_rfc3339())
}

fn opt_date(value: Option<NaiveDate>) -> Option<String> {
    value.map(format_date)
}

/// gRPC client wrapper for cohort-service.
///
/// All four services share one channel.
#[derive(Clone)]
pub struct CohortClient {
    classes: ClassServiceClient<Channel>,
    roster: RosterServiceClient<Channel>,
    surveys: SurveyServiceClient<Channel>,
    engagement: EngagementServiceClient<Channel>,
}

/// Calls handlers make on cohort-service.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CohortApi: Send + Sync {
    // =========================================================================
    // Classes
    // =========================================================================
    async fn create_class(&self, class: NewClass) -> AppResult<Class>;

    async fn get_class(&self, id: Uuid) -> AppResult<Class>;

    /// List classes, limited to the user's roster when `user_id` is given.
    async fn list_classes(
        &self,
        include_archived: bool,
        user_id: Option<String>,
    ) -> AppResult<Vec<Class>>;

    async fn update_class(&self, id: Uuid, update: ClassUpdate) -> AppResult<Class>;

    async fn archive_class(&self, id: Uuid, archived: bool) -> AppResult<Class>;

    async fn delete_class(&self, id: Uuid) -> AppResult<()>;

    async fn list_class_templates(&self) -> AppResult<Vec<ClassTemplate>>;

    async fn create_class_template(&self, template: NewClassTemplate) -> AppResult<ClassTemplate>;

    async fn delete_class_template(&self, id: Uuid) -> AppResult<()>;

    // =========================================================================
    // Roster
    // =========================================================================
    async fn add_member(
        &self,
        class_id: Uuid,
        kind: MemberKind,
        member: NewMember,
    ) -> AppResult<Member>;

    async fn list_members(&self, class_id: Uuid, kind: MemberKind) -> AppResult<Vec<Member>>;

    async fn remove_member(
        &self,
        class_id: Uuid,
        kind: MemberKind,
        member_id: Uuid,
    ) -> AppResult<()>;

    /// Places the user holds, optionally in a single class.
    async fn list_memberships(
        &self,
        user_id: &str,
        class_id: Option<Uuid>,
    ) -> AppResult<Vec<Membership>>;

    /// Link roster rows invited under `email` to the user; returns how many were linked.
    async fn claim_memberships(
        &self,
        user_id: &str,
        email: &str,
    ) -> AppResult<(i32, Vec<Membership>)>;

    // =========================================================================
    // Surveys
    // =========================================================================
    async fn create_survey(
        &self,
        class_id: Uuid,
        survey: NewSurvey,
        questions: Vec<QuestionDraft>,
    ) -> AppResult<SurveyDetail>;

    async fn get_survey(&self, id: Uuid) -> AppResult<SurveyDetail>;

    async fn list_surveys(&self, class_id: Uuid) -> AppResult<Vec<Survey>>;

    async fn update_survey(&self, id: Uuid, update: SurveyUpdate) -> AppResult<Survey>;

    async fn delete_survey(&self, id: Uuid) -> AppResult<()>;

    async fn add_question(&self, survey_id: Uuid, question: QuestionDraft) -> AppResult<Question>;

    async fn delete_question(&self, survey_id: Uuid, question_id: Uuid) -> AppResult<()>;

    async fn list_fellowship_templates(&self) -> AppResult<Vec<FellowshipTemplate>>;

    async fn create_fellowship_template(
        &self,
        template: NewFellowshipTemplate,
    ) -> AppResult<FellowshipTemplate>;

    async fn apply_fellowship_template(
        &self,
        template_id: Uuid,
        class_id: Uuid,
        title: Option<String>,
        week: Option<i32>,
        due_at: Option<DateTime<Utc>>,
    ) -> AppResult<SurveyDetail>;

    async fn submit_response(
        &self,
        survey_id: Uuid,
        response: NewResponse,
    ) -> AppResult<SurveyResponse>;

    async fn list_responses(&self, survey_id: Uuid) -> AppResult<Vec<SurveyResponse>>;

    /// Every survey, question, response and student of a class.
    async fn class_results(&self, class_id: Uuid) -> AppResult<ClassResults>;

    // =========================================================================
    // Comments, feedback and announcements
    // =========================================================================
    async fn add_comment(&self, survey_id: Uuid, comment: NewComment) -> AppResult<Comment>;

    async fn get_comment(&self, id: Uuid) -> AppResult<Comment>;

    async fn list_comments(
        &self,
        class_id: Uuid,
        status: Option<CommentStatus>,
    ) -> AppResult<Vec<Comment>>;

    async fn moderate_comment(&self, id: Uuid, status: CommentStatus) -> AppResult<Comment>;

    async fn submit_feedback(&self, class_id: Uuid, feedback: NewFeedback) -> AppResult<Feedback>;

    async fn list_feedback(&self, class_id: Uuid) -> AppResult<Vec<Feedback>>;

    async fn create_announcement(
        &self,
        class_id: Uuid,
        announcement: NewAnnouncement,
    ) -> AppResult<Announcement>;

    async fn get_announcement(&self, id: Uuid) -> AppResult<Announcement>;

    async fn list_announcements(&self, class_id: Uuid) -> AppResult<Vec<Announcement>>;

    async fn set_announcement_pinned(&self, id: Uuid, pinned: bool) -> AppResult<Announcement>;

    async fn delete_announcement(&self, id: Uuid) -> AppResult<()>;
}

impl CohortClient {
    /// Connect to cohort-service.
    pub async fn connect(endpoint: &str) -> Result<Self, tonic::transport::Error> {
        debug!("Connecting to cohort-service at {}", endpoint);
        let channel = tonic::transport::Endpoint::new(endpoint.to_string())?.connect().await?;

        Ok(Self {
            classes: ClassServiceClient::new(channel.clone()),
            roster: RosterServiceClient::new(channel.clone()),
            surveys: SurveyServiceClient::new(channel.clone()),
            engagement: EngagementServiceClient::new(channel),
        })
    }
}

#[async_trait]
impl CohortApi for CohortClient {
    // =========================================================================
    // Classes
    // =========================================================================
    async fn create_class(&self, class: NewClass) -> AppResult<Class> {
        let request = tonic::Request::new(pb::CreateClassRequest {
            name: class.name,
            description: class.description,
            start_date: format_date(class.start_date),
            duration_weeks: class.duration_weeks,
            weekly_themes: class.weekly_themes.map(|items| pb::Themes { items }),
            template_id: class.template_id.map(|id| id.to_string()),
        });

        let mut client = self.classes.clone();
        let response = client.create_class(request).await.map_err(AppError::from)?;
        convert::class(response.into_inner())
    }

    async fn get_class(&self, id: Uuid) -> AppResult<Class> {
        let request = tonic::Request::new(pb::GetClassRequest { id: id.to_string() });

        let mut client = self.classes.clone();
        let response = client.get_class(request).await.map_err(AppError::from)?;
        convert::class(response.into_inner())
    }

    async fn list_classes(
        &self,
        include_archived: bool,
        user_id: Option<String>,
    ) -> AppResult<Vec<Class>> {
        let request = tonic::Request::new(pb::ListClassesRequest {
            include_archived,
            user_id,
        });

        let mut client = self.classes.clone();
        let response = client.list_classes(request).await.map_err(AppError::from)?;
        response
            .into_inner()
            .classes
            .into_iter()
            .map(convert::class)
            .collect()
    }

    async fn update_class(&self, id: Uuid, update: ClassUpdate) -> AppResult<Class> {
        let request = tonic::Request::new(pb::UpdateClassRequest {
            id: id.to_string(),
            name: update.name,
            description: update.description,
            start_date: opt_date(update.start_date),
            duration_weeks: update.duration_weeks,
            weekly_themes: update.weekly_themes.map(|items| pb::Themes { items }),
        });

        let mut client = self.classes.clone();
        let response = client.update_class(request).await.map_err(AppError::from)?;
        convert::class(response.into_inner())
    }

    async fn archive_class(&self, id: Uuid, archived: bool) -> AppResult<Class> {
        let request = tonic::Request::new(pb::ArchiveClassRequest {
            id: id.to_string(),
            archived,
        });

        let mut client = self.classes.clone();
        let response = client.archive_class(request).await.map_err(AppError::from)?;
        convert::class(response.into_inner())
    }

    async fn delete_class(&self, id: Uuid) -> AppResult<()> {
        let request = tonic::Request::new(pb::DeleteClassRequest { id: id.to_string() });

        let mut client = self.classes.clone();
        client.delete_class(request).await.map_err(AppError::from)?;
        Ok(())
    }

    async fn list_class_templates(&self) -> AppResult<Vec<ClassTemplate>> {
        let request = tonic::Request::new(pb::ListClassTemplatesRequest {});

        let mut client = self.classes.clone();
        let response = client
            .list_class_templates(request)
            .await
            .map_err(AppError::from)?;
        response
            .into_inner()
            .templates
            .into_iter()
            .map(convert::class_template)
            .collect()
    }

    async fn create_class_template(&self, template: NewClassTemplate) -> AppResult<ClassTemplate> {
        let request = tonic::Request::new(pb::CreateClassTemplateRequest {
            name: template.name,
            description: template.description,
            duration_weeks: template.duration_weeks,
            weekly_themes: template.weekly_themes,
        });

        let mut client = self.classes.clone();
        let response = client
            .create_class_template(request)
            .await
            .map_err(AppError::from)?;
        convert::class_template(response.into_inner())
    }

    async fn delete_class_template(&self, id: Uuid) -> AppResult<()> {
        let request = tonic::Request::new(pb::DeleteClassTemplateRequest { id: id.to_string() });

        let mut client = self.classes.clone();
        client
            .delete_class_template(request)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }


    // =========================================================================
    // Roster
    // =========================================================================
    async fn add_member(
        &self,
        class_id: Uuid,
        kind: MemberKind,
        member: NewMember,
    ) -> AppResult<Member> {
        let request = tonic::Request::new(pb::AddMemberRequest {
            class_id: class_id.to_string(),
            kind: kind.to_string(),
            email: member.email,
            name: member.name,
        });

        let mut client = self.roster.clone();
        let response = client.add_member(request).await.map_err(AppError::from)?;
        convert::member(response.into_inner())
    }

    async fn list_members(&self, class_id: Uuid, kind: MemberKind) -> AppResult<Vec<Member>> {
        let request = tonic::Request::new(pb::ListMembersRequest {
            class_id: class_id.to_string(),
            kind: kind.to_string(),
        });

        let mut client = self.roster.clone();
        let response = client.list_members(request).await.map_err(AppError::from)?;
        response
            .into_inner()
            .members
            .into_iter()
            .map(convert::member)
            .collect()
    }

    async fn remove_member(
        &self,
        class_id: Uuid,
        kind: MemberKind,
        member_id: Uuid,
    ) -> AppResult<()> {
        let request = tonic::Request::new(pb::RemoveMemberRequest {
            class_id: class_id.to_string(),
            kind: kind.to_string(),
            member_id: member_id.to_string(),
        });

        let mut client = self.roster.clone();
        client.remove_member(request).await.map_err(AppError::from)?;
        Ok(())
    }

    async fn list_memberships(
        &self,
        user_id: &str,
        class_id: Option<Uuid>,
    ) -> AppResult<Vec<Membership>> {
        let request = tonic::Request::new(pb::ListMembershipsRequest {
            user_id: user_id.to_string(),
            class_id: class_id.map(|id| id.to_string()),
        });

        let mut client = self.roster.clone();
        let response = client
            .list_memberships(request)
            .await
            .map_err(AppError::from)?;
        response
            .into_inner()
            .memberships
            .into_iter()
            .map(convert::membership)
            .collect()
    }

    async fn claim_memberships(
        &self,
        user_id: &str,
        email: &str,
    ) -> AppResult<(i32, Vec<Membership>)> {
        let request = tonic::Request::new(pb::ClaimMembershipsRequest {
            user_id: user_id.to_string(),
            email: email.to_string(),
        });

        let mut client = self.roster.clone();
        let response = client
            .claim_memberships(request)
            .await
            .map_err(AppError::from)?
            .into_inner();
        let memberships = response
            .memberships
            .into_iter()
            .map(convert::membership)
            .collect::<AppResult<_>>()?;
        Ok((response.claimed, memberships))
    }


    // =========================================================================
    // Surveys
    // =========================================================================
    async fn create_survey(
        &self,
        class_id: Uuid,
        survey: NewSurvey,
        questions: Vec<QuestionDraft>,
    ) -> AppResult<SurveyDetail> {
        let request = tonic::Request::new(pb::CreateSurveyRequest {
            class_id: class_id.to_string(),
            title: survey.title,
            kind: survey.kind.to_string(),
            week: survey.week,
            due_at: opt_timestamp(survey.due_at),
            questions: questions.into_iter().map(convert::draft_to_proto).collect(),
        });

        let mut client = self.surveys.clone();
        let response = client.create_survey(request).await.map_err(AppError::from)?;
        convert::detail(response.into_inner())
    }

    async fn get_survey(&self, id: Uuid) -> AppResult<SurveyDetail> {
        let request = tonic::Request::new(pb::GetSurveyRequest { id: id.to_string() });

        let mut client = self.surveys.clone();
        let response = client.get_survey(request).await.map_err(AppError::from)?;
        convert::detail(response.into_inner())
    }

    async fn list_surveys(&self, class_id: Uuid) -> AppResult<Vec<Survey>> {
        let request = tonic::Request::new(pb::ListSurveysRequest {
            class_id: class_id.to_string(),
        });

        let mut client = self.surveys.clone();
        let response = client.list_surveys(request).await.map_err(AppError::from)?;
        response
            .into_inner()
            .surveys
            .into_iter()
            .map(convert::survey)
            .collect()
    }

    async fn update_survey(&self, id: Uuid, update: SurveyUpdate) -> AppResult<Survey> {
        let request = tonic::Request::new(pb::UpdateSurveyRequest {
            id: id.to_string(),
            title: update.title,
            is_open: update.is_open,
            week: update.week,
            due_at: opt_timestamp(update.due_at),
            clear_due_at: update.clear_due_at,
        });

        let mut client = self.surveys.clone();
        let response = client.update_survey(request).await.map_err(AppError::from)?;
        convert::survey(response.into_inner())
    }

    async fn delete_survey(&self, id: Uuid) -> AppResult<()> {
        let request = tonic::Request::new(pb::DeleteSurveyRequest { id: id.to_string() });

        let mut client = self.surveys.clone();
        client.delete_survey(request).await.map_err(AppError::from)?;
        Ok(())
    }

    async fn add_question(&self, survey_id: Uuid, question: QuestionDraft) -> AppResult<Question> {
        let request = tonic::Request::new(pb::AddQuestionRequest {
            survey_id: survey_id.to_string(),
            question: Some(convert::draft_to_proto(question)),
        });

        let mut client = self.surveys.clone();
        let response = client.add_question(request).await.map_err(AppError::from)?;
        convert::question(response.into_inner())
    }

    async fn delete_question(&self, survey_id: Uuid, question_id: Uuid) -> AppResult<()> {
        let request = tonic::Request::new(pb::DeleteQuestionRequest {
            survey_id: survey_id.to_string(),
            question_id: question_id.to_string(),
        });

        let mut client = self.surveys.clone();
        client.delete_question(request).await.map_err(AppError::from)?;
        Ok(())
    }

    async fn list_fellowship_templates(&self) -> AppResult<Vec<FellowshipTemplate>> {
        let request = tonic::Request::new(pb::ListFellowshipTemplatesRequest {});

        let mut client = self.surveys.clone();
        let response = client
            .list_fellowship_templates(request)
            .await
            .map_err(AppError::from)?;
        response
            .into_inner()
            .templates
            .into_iter()
            .map(convert::fellowship_template)
            .collect()
    }

    async fn create_fellowship_template(
        &self,
        template: NewFellowshipTemplate,
    ) -> AppResult<FellowshipTemplate> {
        let request = tonic::Request::new(pb::CreateFellowshipTemplateRequest {
            name: template.name,
            description: template.description,
            survey_kind: template.survey_kind.to_string(),
            questions: template
                .questions
                .into_iter()
                .map(convert::draft_to_proto)
                .collect(),
        });

        let mut client = self.surveys.clone();
        let response = client
            .create_fellowship_template(request)
            .await
            .map_err(AppError::from)?;
        convert::fellowship_template(response.into_inner())
    }

    async fn apply_fellowship_template(
        &self,
        template_id: Uuid,
        class_id: Uuid,
        title: Option<String>,
        week: Option<i32>,
        due_at: Option<DateTime<Utc>>,
    ) -> AppResult<SurveyDetail> {
        let request = tonic::Request::new(pb::ApplyFellowshipTemplateRequest {
            template_id: template_id.to_string(),
            class_id: class_id.to_string(),
            title,
            week,
            due_at: opt_timestamp(due_at),
        });

        let mut client = self.surveys.clone();
        let response = client
            .apply_fellowship_template(request)
            .await
            .map_err(AppError::from)?;
        convert::detail(response.into_inner())
    }

    async fn submit_response(
        &self,
        survey_id: Uuid,
        response: NewResponse,
    ) -> AppResult<SurveyResponse> {
        let request = tonic::Request::new(pb::SubmitResponseRequest {
            survey_id: survey_id.to_string(),
            respondent_id: response.respondent_id.to_string(),
            subject_id: response.subject_id.map(|id| id.to_string()),
            answers: response
                .answers
                .into_iter()
                .map(|a| pb::AnswerInput {
                    question_id: a.question_id.to_string(),
                    rating: a.rating,
                    text: a.text,
                })
                .collect(),
        });

        let mut client = self.surveys.clone();
        let response = client
            .submit_response(request)
            .await
            .map_err(AppError::from)?;
        convert::response(response.into_inner())
    }

    async fn list_responses(&self, survey_id: Uuid) -> AppResult<Vec<SurveyResponse>> {
        let request = tonic::Request::new(pb::ListResponsesRequest {
            survey_id: survey_id.to_string(),
        });

        let mut client = self.surveys.clone();
        let response = client.list_responses(request).await.map_err(AppError::from)?;
        response
            .into_inner()
            .responses
            .into_iter()
            .map(convert::response)
            .collect()
    }

    async fn class_results(&self, class_id: Uuid) -> AppResult<ClassResults> {
        let request = tonic::Request::new(pb::GetClassResultsRequest {
            class_id: class_id.to_string(),
        });

        let mut client = self.surveys.clone();
        let response = client
            .get_class_results(request)
            .await
            .map_err(AppError::from)?;
        convert::class_results(response.into_inner())
    }


    // =========================================================================
    // Comments, feedback and announcements
    // =========================================================================
    async fn add_comment(&self, survey_id: Uuid, comment: NewComment) -> AppResult<Comment> {
        let request = tonic::Request::new(pb::AddCommentRequest {
            survey_id: survey_id.to_string(),
            author_id: comment.author_id.to_string(),
            subject_id: comment.subject_id.map(|id| id.to_string()),
            body: comment.body,
        });

        let mut client = self.engagement.clone();
        let response = client.add_comment(request).await.map_err(AppError::from)?;
        convert::comment(response.into_inner())
    }

    async fn get_comment(&self, id: Uuid) -> AppResult<Comment> {
        let request = tonic::Request::new(pb::GetCommentRequest { id: id.to_string() });

        let mut client = self.engagement.clone();
        let response = client.get_comment(request).await.map_err(AppError::from)?;
        convert::comment(response.into_inner())
    }

    async fn list_comments(
        &self,
        class_id: Uuid,
        status: Option<CommentStatus>,
    ) -> AppResult<Vec<Comment>> {
        let request = tonic::Request::new(pb::ListCommentsRequest {
            class_id: class_id.to_string(),
            status: status.map(|s| s.to_string()),
        });

        let mut client = self.engagement.clone();
        let response = client.list_comments(request).await.map_err(AppError::from)?;
        response
            .into_inner()
            .comments
            .into_iter()
            .map(convert::comment)
            .collect()
    }

    async fn moderate_comment(&self, id: Uuid, status: CommentStatus) -> AppResult<Comment> {
        let request = tonic::Request::new(pb::ModerateCommentRequest {
            id: id.to_string(),
            status: status.to_string(),
        });

        let mut client = self.engagement.clone();
        let response = client
            .moderate_comment(request)
            .await
            .map_err(AppError::from)?;
        convert::comment(response.into_inner())
    }

    async fn submit_feedback(&self, class_id: Uuid, feedback: NewFeedback) -> AppResult<Feedback> {
        let request = tonic::Request::new(pb::SubmitFeedbackRequest {
            class_id: class_id.to_string(),
            student_id: feedback.student_id.map(|id| id.to_string()),
            week: feedback.week,
            rating: feedback.rating,
            body: feedback.body,
        });

        let mut client = self.engagement.clone();
        let response = client
            .submit_feedback(request)
            .await
            .map_err(AppError::from)?;
        convert::feedback(response.into_inner())
    }

    async fn list_feedback(&self, class_id: Uuid) -> AppResult<Vec<Feedback>> {
        let request = tonic::Request::new(pb::ListFeedbackRequest {
            class_id: class_id.to_string(),
        });

        let mut client = self.engagement.clone();
        let response = client.list_feedback(request).await.map_err(AppError::from)?;
        response
            .into_inner()
            .feedback
            .into_iter()
            .map(convert::feedback)
            .collect()
    }

    async fn create_announcement(
        &self,
        class_id: Uuid,
        announcement: NewAnnouncement,
    ) -> AppResult<Announcement> {
        let request = tonic::Request::new(pb::CreateAnnouncementRequest {
            class_id: class_id.to_string(),
            title: announcement.title,
            body: announcement.body,
            author_user_id: announcement.author_user_id,
            pinned: announcement.pinned,
        });

        let mut client = self.engagement.clone();
        let response = client
            .create_announcement(request)
            .await
            .map_err(AppError::from)?;
        convert::announcement(response.into_inner())
    }

    async fn get_announcement(&self, id: Uuid) -> AppResult<Announcement> {
        let request = tonic::Request::new(pb::GetAnnouncementRequest { id: id.to_string() });

        let mut client = self.engagement.clone();
        let response = client
            .get_announcement(request)
            .await
            .map_err(AppError::from)?;
        convert::announcement(response.into_inner())
    }

    async fn list_announcements(&self, class_id: Uuid) -> AppResult<Vec<Announcement>> {
        let request = tonic::Request::new(pb::ListAnnouncementsRequest {
            class_id: class_id.to_string(),
        });

        let mut client = self.engagement.clone();
        let response = client
            .list_announcements(request)
            .await
            .map_err(AppError::from)?;
        response
            .into_inner()
            .announcements
            .into_iter()
            .map(convert::announcement)
            .collect()
    }

    async fn set_announcement_pinned(&self, id: Uuid, pinned: bool) -> AppResult<Announcement> {
        let request = tonic::Request::new(pb::SetAnnouncementPinnedRequest {
            id: id.to_string(),
            pinned,
        });

        let mut client = self.engagement.clone();
        let response = client
            .set_announcement_pinned(request)
            .await
            .map_err(AppError::from)?;
        convert::announcement(response.into_inner())
    }

    async fn delete_announcement(&self, id: Uuid) -> AppResult<()> {
        let request = tonic::Request::new(pb::DeleteAnnouncementRequest { id: id.to_string() });

        let mut client = self.engagement.clone();
        client
            .delete_announcement(request)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
