//! Class and class template persistence.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::class::{self, ActiveModel, Entity as ClassEntity};
use super::entities::class_template::{self, Entity as ClassTemplateEntity};
use super::entities::themes_to_json;
use super::update_error;
use common::{AppError, AppResult};
use domain::{Class, ClassTemplate, NewClassTemplate, ValidNewClass};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Class repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ClassRepository: Send + Sync {
    /// Find class by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Class>>;

    /// List classes ordered by start date, optionally limited to `ids`
    async fn list(&self, include_archived: bool, ids: Option<Vec<Uuid>>) -> AppResult<Vec<Class>>;

    /// Insert a validated class
    async fn create(&self, class: ValidNewClass) -> AppResult<Class>;

    /// Persist every editable field of `class`
    async fn save(&self, class: Class) -> AppResult<Class>;

    /// Set or clear the archived flag
    async fn set_archived(&self, id: Uuid, archived: bool) -> AppResult<Class>;

    /// Delete a class and, through cascades, everything in it
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    async fn find_template(&self, id: Uuid) -> AppResult<Option<ClassTemplate>>;

    async fn list_templates(&self) -> AppResult<Vec<ClassTemplate>>;

    async fn create_template(&self, template: NewClassTemplate) -> AppResult<ClassTemplate>;

    async fn delete_template(&self, id: Uuid) -> AppResult<()>;
}

/// SeaORM implementation of ClassRepository
pub struct ClassStore {
    db: DatabaseConnection,
}

impl ClassStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ClassRepository for ClassStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Class>> {
        let result = ClassEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Class::from))
    }

    async fn list(&self, include_archived: bool, ids: Option<Vec<Uuid>>) -> AppResult<Vec<Class>> {
        let mut query = ClassEntity::find();
        if !include_archived {
            query = query.filter(class::Column::Archived.eq(false));
        }
        if let Some(ids) = ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            query = query.filter(class::Column::Id.is_in(ids));
        }

        let models = query
            .order_by_desc(class::Column::StartDate)
            .order_by_asc(class::Column::Name)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(Class::from).collect())
    }

    async fn create(&self, class: ValidNewClass) -> AppResult<Class> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(class.name),
            description: Set(class.description),
            start_date: Set(class.start_date),
            duration_weeks: Set(class.duration_weeks),
            weekly_themes: Set(themes_to_json(&class.weekly_themes)),
            template_id: Set(class.template_id),
            archived: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await.map_err(AppError::from)?;
        Ok(Class::from(model))
    }

    async fn save(&self, class: Class) -> AppResult<Class> {
        let active_model = ActiveModel {
            id: Set(class.id),
            name: Set(class.name),
            description: Set(class.description),
            start_date: Set(class.start_date),
            duration_weeks: Set(class.duration_weeks),
            weekly_themes: Set(themes_to_json(&class.weekly_themes)),
            updated_at: Set(class.updated_at),
            ..Default::default()
        };

        let model = active_model.update(&self.db).await.map_err(update_error)?;
        Ok(Class::from(model))
    }

    async fn set_archived(&self, id: Uuid, archived: bool) -> AppResult<Class> {
        let active_model = ActiveModel {
            id: Set(id),
            archived: Set(archived),
            updated_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        let model = active_model.update(&self.db).await.map_err(update_error)?;
        Ok(Class::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = ClassEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    async fn find_template(&self, id: Uuid) -> AppResult<Option<ClassTemplate>> {
        let result = ClassTemplateEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(ClassTemplate::from))
    }

    async fn list_templates(&self) -> AppResult<Vec<ClassTemplate>> {
        let models = ClassTemplateEntity::find()
            .order_by_asc(class_template::Column::Name)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(ClassTemplate::from).collect())
    }

    async fn create_template(&self, template: NewClassTemplate) -> AppResult<ClassTemplate> {
        let active_model = class_template::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(template.name),
            description: Set(template.description),
            duration_weeks: Set(template.duration_weeks),
            weekly_themes: Set(themes_to_json(&template.weekly_themes)),
            created_at: Set(chrono::Utc::now()),
        };

        let model = active_model.insert(&self.db).await.map_err(AppError::from)?;
        Ok(ClassTemplate::from(model))
    }

    async fn delete_template(&self, id: Uuid) -> AppResult<()> {
        let result = ClassTemplateEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
