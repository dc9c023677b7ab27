//! Comment, feedback and announcement persistence.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::class_announcement::{self, Entity as AnnouncementEntity};
use super::entities::feedback::{self, Entity as FeedbackEntity};
use super::entities::survey_comment::{self, Entity as CommentEntity};
use super::update_error;
use common::{AppError, AppResult};
use domain::{
    Announcement, Comment, CommentStatus, Feedback, NewAnnouncement, NewComment, NewFeedback,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Engagement repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EngagementRepository: Send + Sync {
    /// Insert a pending comment
    async fn create_comment(
        &self,
        survey_id: Uuid,
        class_id: Uuid,
        comment: NewComment,
    ) -> AppResult<Comment>;

    async fn find_comment(&self, id: Uuid) -> AppResult<Option<Comment>>;

    /// Comments of a class, newest first, optionally with one status
    async fn list_comments(
        &self,
        class_id: Uuid,
        status: Option<CommentStatus>,
    ) -> AppResult<Vec<Comment>>;

    /// Persist status and moderation time
    async fn save_comment(&self, comment: Comment) -> AppResult<Comment>;

    async fn create_feedback(&self, class_id: Uuid, feedback: NewFeedback) -> AppResult<Feedback>;

    /// Feedback of a class ordered by week, then submission time
    async fn list_feedback(&self, class_id: Uuid) -> AppResult<Vec<Feedback>>;

    async fn create_announcement(
        &self,
        class_id: Uuid,
        announcement: NewAnnouncement,
    ) -> AppResult<Announcement>;

    async fn find_announcement(&self, id: Uuid) -> AppResult<Option<Announcement>>;

    /// Announcements of a class, pinned first, newest first
    async fn list_announcements(&self, class_id: Uuid) -> AppResult<Vec<Announcement>>;

    async fn set_announcement_pinned(&self, id: Uuid, pinned: bool) -> AppResult<Announcement>;

    async fn delete_announcement(&self, id: Uuid) -> AppResult<()>;
}

/// SeaORM implementation of EngagementRepository
pub struct EngagementStore {
    db: DatabaseConnection,
}

impl EngagementStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EngagementRepository for EngagementStore {
    async fn create_comment(
        &self,
        survey_id: Uuid,
        class_id: Uuid,
        comment: NewComment,
    ) -> AppResult<Comment> {
        let model = survey_comment::ActiveModel {
            id: Set(Uuid::new_v4()),
            survey_id: Set(survey_id),
            class_id: Set(class_id),
            author_id: Set(comment.author_id),
            subject_id: Set(comment.subject_id),
            body: Set(comment.body),
            status: Set(CommentStatus::Pending.as_str().to_string()),
            created_at: Set(Utc::now()),
            moderated_at: Set(None),
        }
        .insert(&self.db)
        .await?;

        Ok(Comment::try_from(model)?)
    }

    async fn find_comment(&self, id: Uuid) -> AppResult<Option<Comment>> {
        let result = CommentEntity::find_by_id(id).one(&self.db).await?;
        result
            .map(|m| Comment::try_from(m).map_err(AppError::from))
            .transpose()
    }

    async fn list_comments(
        &self,
        class_id: Uuid,
        status: Option<CommentStatus>,
    ) -> AppResult<Vec<Comment>> {
        let mut query = CommentEntity::find().filter(survey_comment::Column::ClassId.eq(class_id));
        if let Some(status) = status {
            query = query.filter(survey_comment::Column::Status.eq(status.as_str()));
        }

        query
            .order_by_desc(survey_comment::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| Comment::try_from(m).map_err(AppError::from))
            .collect()
    }

    async fn save_comment(&self, comment: Comment) -> AppResult<Comment> {
        let model = survey_comment::ActiveModel {
            id: Set(comment.id),
            status: Set(comment.status.as_str().to_string()),
            moderated_at: Set(comment.moderated_at),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(update_error)?;

        Ok(Comment::try_from(model)?)
    }

    async fn create_feedback(&self, class_id: Uuid, input: NewFeedback) -> AppResult<Feedback> {
        let model = feedback::ActiveModel {
            id: Set(Uuid::new_v4()),
            class_id: Set(class_id),
            student_id: Set(input.student_id),
            week: Set(input.week),
            rating: Set(input.rating),
            body: Set(input.body),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;

        Ok(Feedback::from(model))
    }

    async fn list_feedback(&self, class_id: Uuid) -> AppResult<Vec<Feedback>> {
        let models = FeedbackEntity::find()
            .filter(feedback::Column::ClassId.eq(class_id))
            .order_by_asc(feedback::Column::Week)
            .order_by_asc(feedback::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Feedback::from).collect())
    }

    async fn create_announcement(
        &self,
        class_id: Uuid,
        announcement: NewAnnouncement,
    ) -> AppResult<Announcement> {
        let model = class_announcement::ActiveModel {
            id: Set(Uuid::new_v4()),
            class_id: Set(class_id),
            title: Set(announcement.title),
            body: Set(announcement.body),
            author_user_id: Set(announcement.author_user_id),
            pinned: Set(announcement.pinned),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;

        Ok(Announcement::from(model))
    }

    async fn find_announcement(&self, id: Uuid) -> AppResult<Option<Announcement>> {
        let result = AnnouncementEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(Announcement::from))
    }

    async fn list_announcements(&self, class_id: Uuid) -> AppResult<Vec<Announcement>> {
        let models = AnnouncementEntity::find()
            .filter(class_announcement::Column::ClassId.eq(class_id))
            .order_by_desc(class_announcement::Column::Pinned)
            .order_by_desc(class_announcement::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Announcement::from).collect())
    }

    async fn set_announcement_pinned(&self, id: Uuid, pinned: bool) -> AppResult<Announcement> {
        let model = class_announcement::ActiveModel {
            id: Set(id),
            pinned: Set(pinned),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(update_error)?;

        Ok(Announcement::from(model))
    }

    async fn delete_announcement(&self, id: Uuid) -> AppResult<()> {
        let result = AnnouncementEntity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
