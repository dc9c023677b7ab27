//! Engagement service - survey comments, weekly feedback, announcements.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use common::{AppError, AppResult, OptionExt};
use domain::engagement::sort_announcements;
use domain::{
    Announcement, Comment, CommentStatus, Feedback, MemberKind, NewAnnouncement, NewComment,
    NewFeedback,
};

use crate::repository::{
    ClassRepository, EngagementRepository, RosterRepository, SurveyRepository,
};

/// Engagement service trait for dependency injection.
#[async_trait]
pub trait EngagementService: Send + Sync {
    /// Leave a comment on a survey; it starts out pending moderation
    async fn add_comment(&self, survey_id: Uuid, comment: NewComment) -> AppResult<Comment>;

    async fn get_comment(&self, id: Uuid) -> AppResult<Comment>;

    async fn list_comments(
        &self,
        class_id: Uuid,
        status: Option<CommentStatus>,
    ) -> AppResult<Vec<Comment>>;

    /// Approve or reject a comment
    async fn moderate_comment(&self, id: Uuid, status: CommentStatus) -> AppResult<Comment>;

    async fn submit_feedback(&self, class_id: Uuid, feedback: NewFeedback) -> AppResult<Feedback>;

    async fn list_feedback(&self, class_id: Uuid) -> AppResult<Vec<Feedback>>;

    async fn create_announcement(
        &self,
        class_id: Uuid,
        announcement: NewAnnouncement,
    ) -> AppResult<Announcement>;

    async fn get_announcement(&self, id: Uuid) -> AppResult<Announcement>;

    /// Pinned first, then newest first
    async fn list_announcements(&self, class_id: Uuid) -> AppResult<Vec<Announcement>>;

    async fn set_announcement_pinned(&self, id: Uuid, pinned: bool) -> AppResult<Announcement>;

    async fn delete_announcement(&self, id: Uuid) -> AppResult<()>;
}

/// Concrete implementation of EngagementService using repositories.
pub struct EngagementManager {
    classes: Arc<dyn ClassRepository>,
    roster: Arc<dyn RosterRepository>,
    surveys: Arc<dyn SurveyRepository>,
    engagement: Arc<dyn EngagementRepository>,
}

impl EngagementManager {
    pub fn new(
        classes: Arc<dyn ClassRepository>,
        roster: Arc<dyn RosterRepository>,
        surveys: Arc<dyn SurveyRepository>,
        engagement: Arc<dyn EngagementRepository>,
    ) -> Self {
        Self {
            classes,
            roster,
            surveys,
            engagement,
        }
    }

    async fn student_in(&self, class_id: Uuid, student_id: Uuid) -> AppResult<bool> {
        Ok(self
            .roster
            .find(MemberKind::Student, student_id)
            .await?
            .is_some_and(|m| m.class_id == class_id))
    }
}

#[async_trait]
impl EngagementService for EngagementManager {
    async fn add_comment(&self, survey_id: Uuid, comment: NewComment) -> AppResult<Comment> {
        let comment = comment.validate()?;
        let survey = self.surveys.find(survey_id).await?.ok_or_not_found()?;

        if !self.student_in(survey.class_id, comment.author_id).await? {
            return Err(AppError::Forbidden);
        }
        if let Some(subject_id) = comment.subject_id {
            if !self.student_in(survey.class_id, subject_id).await? {
                return Err(AppError::validation(
                    "The person commented on is not a student in this class",
                ));
            }
        }

        self.engagement
            .create_comment(survey_id, survey.class_id, comment)
            .await
    }

    async fn get_comment(&self, id: Uuid) -> AppResult<Comment> {
        self.engagement.find_comment(id).await?.ok_or_not_found()
    }

    async fn list_comments(
        &self,
        class_id: Uuid,
        status: Option<CommentStatus>,
    ) -> AppResult<Vec<Comment>> {
        self.engagement.list_comments(class_id, status).await
    }

    async fn moderate_comment(&self, id: Uuid, status: CommentStatus) -> AppResult<Comment> {
        let mut comment = self.get_comment(id).await?;
        comment.moderate(status)?;

        let comment = self.engagement.save_comment(comment).await?;
        tracing::info!(comment_id = %id, status = %comment.status, "Comment moderated");
        Ok(comment)
    }

    async fn submit_feedback(&self, class_id: Uuid, feedback: NewFeedback) -> AppResult<Feedback> {
        let feedback = feedback.validate()?;
        self.classes.find_by_id(class_id).await?.ok_or_not_found()?;

        if let Some(student_id) = feedback.student_id {
            if !self.student_in(class_id, student_id).await? {
                return Err(AppError::Forbidden);
            }
        }

        self.engagement.create_feedback(class_id, feedback).await
    }

    async fn list_feedback(&self, class_id: Uuid) -> AppResult<Vec<Feedback>> {
        self.engagement.list_feedback(class_id).await
    }

    async fn create_announcement(
        &self,
        class_id: Uuid,
        announcement: NewAnnouncement,
    ) -> AppResult<Announcement> {
        let announcement = announcement.validate()?;
        self.classes.find_by_id(class_id).await?.ok_or_not_found()?;
        self.engagement
            .create_announcement(class_id, announcement)
            .await
    }

    async fn get_announcement(&self, id: Uuid) -> AppResult<Announcement> {
        self.engagement.find_announcement(id).await?.ok_or_not_found()
    }

    async fn list_announcements(&self, class_id: Uuid) -> AppResult<Vec<Announcement>> {
        let mut announcements = self.engagement.list_announcements(class_id).await?;
        sort_announcements(&mut announcements);
        Ok(announcements)
    }

    async fn set_announcement_pinned(&self, id: Uuid, pinned: bool) -> AppResult<Announcement> {
        self.engagement.set_announcement_pinned(id, pinned).await
    }

    async fn delete_announcement(&self, id: Uuid) -> AppResult<()> {
        self.engagement.delete_announcement(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};
    use domain::{Class, Member, Survey, SurveyKind};
    use mockall::predicate::eq;

    use crate::repository::{
        MockClassRepository, MockEngagementRepository, MockRosterRepository, MockSurveyRepository,
    };

    fn student(id: Uuid, class_id: Uuid) -> Member {
        Member {
            id,
            class_id,
            kind: MemberKind::Student,
            user_id: Some("user_s".to_string()),
            email: "s@example.com".to_string(),
            name: "Student".to_string(),
            created_at: Utc::now(),
        }
    }

    fn survey(id: Uuid, class_id: Uuid) -> Survey {
        Survey {
            id,
            class_id,
            title: "Retro".to_string(),
            kind: SurveyKind::CourseFeedback,
            week: None,
            is_open: true,
            due_at: None,
            created_at: Utc::now(),
        }
    }

    fn comment(class_id: Uuid, status: CommentStatus) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            survey_id: Uuid::new_v4(),
            class_id,
            author_id: Uuid::new_v4(),
            subject_id: None,
            body: "Loved the pairing sessions".to_string(),
            status,
            created_at: Utc::now(),
            moderated_at: None,
        }
    }

    fn class(id: Uuid) -> Class {
        Class {
            id,
            name: "Fall".to_string(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            duration_weeks: 8,
            weekly_themes: Vec::new(),
            template_id: None,
            archived: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn manager(
        classes: MockClassRepository,
        roster: MockRosterRepository,
        surveys: MockSurveyRepository,
        engagement: MockEngagementRepository,
    ) -> EngagementManager {
        EngagementManager::new(
            Arc::new(classes),
            Arc::new(roster),
            Arc::new(surveys),
            Arc::new(engagement),
        )
    }

    #[tokio::test]
    async fn test_comment_is_filed_under_survey_class() {
        let class_id = Uuid::new_v4();
        let survey_id = Uuid::new_v4();
        let author = Uuid::new_v4();

        let mut surveys = MockSurveyRepository::new();
        surveys
            .expect_find()
            .with(eq(survey_id))
            .returning(move |id| Ok(Some(survey(id, class_id))));

        let mut roster = MockRosterRepository::new();
        roster
            .expect_find()
            .with(eq(MemberKind::Student), eq(author))
            .returning(move |_, id| Ok(Some(student(id, class_id))));

        let mut engagement = MockEngagementRepository::new();
        engagement
            .expect_create_comment()
            .with(eq(survey_id), eq(class_id), mockall::predicate::always())
            .returning(move |_, class_id, new| {
                let mut c = comment(class_id, CommentStatus::Pending);
                c.author_id = new.author_id;
                c.body = new.body;
                Ok(c)
            });

        let created = manager(MockClassRepository::new(), roster, surveys, engagement)
            .add_comment(
                survey_id,
                NewComment {
                    author_id: author,
                    subject_id: None,
                    body: "  Loved the pairing sessions ".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(created.status, CommentStatus::Pending);
        assert_eq!(created.body, "Loved the pairing sessions");
    }

    #[tokio::test]
    async fn test_comment_from_outside_class_forbidden() {
        let class_id = Uuid::new_v4();

        let mut surveys = MockSurveyRepository::new();
        surveys
            .expect_find()
            .returning(move |id| Ok(Some(survey(id, class_id))));

        let mut roster = MockRosterRepository::new();
        roster
            .expect_find()
            .returning(|_, id| Ok(Some(student(id, Uuid::new_v4()))));

        let mut engagement = MockEngagementRepository::new();
        engagement.expect_create_comment().never();

        let result = manager(MockClassRepository::new(), roster, surveys, engagement)
            .add_comment(
                Uuid::new_v4(),
                NewComment {
                    author_id: Uuid::new_v4(),
                    subject_id: None,
                    body: "hello".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_moderate_comment_approves() {
        let class_id = Uuid::new_v4();
        let pending = comment(class_id, CommentStatus::Pending);
        let id = pending.id;

        let mut engagement = MockEngagementRepository::new();
        engagement
            .expect_find_comment()
            .with(eq(id))
            .returning(move |_| Ok(Some(pending.clone())));
        engagement
            .expect_save_comment()
            .withf(|c| c.status == CommentStatus::Approved && c.moderated_at.is_some())
            .returning(|c| Ok(c));

        let moderated = manager(
            MockClassRepository::new(),
            MockRosterRepository::new(),
            MockSurveyRepository::new(),
            engagement,
        )
        .moderate_comment(id, CommentStatus::Approved)
        .await
        .unwrap();

        assert_eq!(moderated.status, CommentStatus::Approved);
    }

    #[tokio::test]
    async fn test_anonymous_feedback_skips_roster() {
        let class_id = Uuid::new_v4();

        let mut classes = MockClassRepository::new();
        classes
            .expect_find_by_id()
            .with(eq(class_id))
            .returning(|id| Ok(Some(class(id))));

        let mut roster = MockRosterRepository::new();
        roster.expect_find().never();

        let mut engagement = MockEngagementRepository::new();
        engagement
            .expect_create_feedback()
            .returning(|class_id, new| {
                Ok(Feedback {
                    id: Uuid::new_v4(),
                    class_id,
                    student_id: new.student_id,
                    week: new.week,
                    rating: new.rating,
                    body: new.body,
                    created_at: Utc::now(),
                })
            });

        let feedback = manager(classes, roster, MockSurveyRepository::new(), engagement)
            .submit_feedback(
                class_id,
                NewFeedback {
                    student_id: None,
                    week: 2,
                    rating: 5,
                    body: "Great pacing".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(feedback.student_id, None);
        assert_eq!(feedback.rating, 5);
    }

    #[tokio::test]
    async fn test_list_announcements_pinned_first() {
        let class_id = Uuid::new_v4();
        let make = |title: &str, pinned: bool, age: i64| Announcement {
            id: Uuid::new_v4(),
            class_id,
            title: title.to_string(),
            body: "body".to_string(),
            author_user_id: "user_admin".to_string(),
            pinned,
            created_at: Utc::now() - Duration::hours(age),
        };
        let rows = vec![make("recent", false, 1), make("pinned", true, 30)];

        let mut engagement = MockEngagementRepository::new();
        engagement
            .expect_list_announcements()
            .returning(move |_| Ok(rows.clone()));

        let list = manager(
            MockClassRepository::new(),
            MockRosterRepository::new(),
            MockSurveyRepository::new(),
            engagement,
        )
        .list_announcements(class_id)
        .await
        .unwrap();

        assert_eq!(list[0].title, "pinned");
        assert_eq!(list[1].title, "recent");
    }
}
