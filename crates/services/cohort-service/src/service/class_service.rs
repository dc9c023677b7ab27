//! Class service - classes and class templates.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use common::{AppResult, OptionExt};
use domain::{Class, ClassTemplate, ClassUpdate, NewClass, NewClassTemplate};

use crate::repository::{ClassRepository, RosterRepository};

/// Class service trait for dependency injection.
#[async_trait]
pub trait ClassService: Send + Sync {
    /// Create a class, filling duration and themes from a template when given
    async fn create_class(&self, class: NewClass) -> AppResult<Class>;

    async fn get_class(&self, id: Uuid) -> AppResult<Class>;

    /// List classes; with `user_id`, only those the user is on the roster of
    async fn list_classes(
        &self,
        include_archived: bool,
        user_id: Option<String>,
    ) -> AppResult<Vec<Class>>;

    async fn update_class(&self, id: Uuid, update: ClassUpdate) -> AppResult<Class>;

    async fn archive_class(&self, id: Uuid, archived: bool) -> AppResult<Class>;

    async fn delete_class(&self, id: Uuid) -> AppResult<()>;

    async fn list_templates(&self) -> AppResult<Vec<ClassTemplate>>;

    async fn create_template(&self, template: NewClassTemplate) -> AppResult<ClassTemplate>;

    async fn delete_template(&self, id: Uuid) -> AppResult<()>;
}

/// Concrete implementation of ClassService using repositories.
pub struct ClassManager {
    classes: Arc<dyn ClassRepository>,
    roster: Arc<dyn RosterRepository>,
}

impl ClassManager {
    pub fn new(classes: Arc<dyn ClassRepository>, roster: Arc<dyn RosterRepository>) -> Self {
        Self { classes, roster }
    }
}

#[async_trait]
impl ClassService for ClassManager {
    async fn create_class(&self, mut class: NewClass) -> AppResult<Class> {
        if let Some(template_id) = class.template_id {
            let template = self
                .classes
                .find_template(template_id)
                .await?
                .ok_or_not_found()?;
            class.apply_template(&template);
        }

        let class = self.classes.create(class.validate()?).await?;
        tracing::info!(class_id = %class.id, name = %class.name, "Class created");
        Ok(class)
    }

    async fn get_class(&self, id: Uuid) -> AppResult<Class> {
        self.classes.find_by_id(id).await?.ok_or_not_found()
    }

    async fn list_classes(
        &self,
        include_archived: bool,
        user_id: Option<String>,
    ) -> AppResult<Vec<Class>> {
        let ids = match user_id {
            Some(user_id) => {
                let mut ids: Vec<Uuid> = self
                    .roster
                    .memberships(&user_id, None)
                    .await?
                    .into_iter()
                    .map(|m| m.class_id)
                    .collect();
                ids.sort();
                ids.dedup();
                Some(ids)
            }
            None => None,
        };

        self.classes.list(include_archived, ids).await
    }

    async fn update_class(&self, id: Uuid, update: ClassUpdate) -> AppResult<Class> {
        let mut class = self.get_class(id).await?;
        update.apply_to(&mut class)?;
        self.classes.save(class).await
    }

    async fn archive_class(&self, id: Uuid, archived: bool) -> AppResult<Class> {
        self.classes.set_archived(id, archived).await
    }

    async fn delete_class(&self, id: Uuid) -> AppResult<()> {
        self.classes.delete(id).await?;
        tracing::info!(class_id = %id, "Class deleted");
        Ok(())
    }

    async fn list_templates(&self) -> AppResult<Vec<ClassTemplate>> {
        self.classes.list_templates().await
    }

    async fn create_template(&self, template: NewClassTemplate) -> AppResult<ClassTemplate> {
        self.classes.create_template(template.validate()?).await
    }

    async fn delete_template(&self, id: Uuid) -> AppResult<()> {
        self.classes.delete_template(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use common::AppError;
    use domain::{MemberKind, Membership};
    use mockall::predicate::eq;

    use crate::repository::{MockClassRepository, MockRosterRepository};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
    }

    fn stored(id: Uuid, weeks: i32, themes: Vec<String>) -> Class {
        Class {
            id,
            name: "Fall Fellowship".to_string(),
            description: String::new(),
            start_date: start(),
            duration_weeks: weeks,
            weekly_themes: themes,
            template_id: None,
            archived: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn template() -> ClassTemplate {
        ClassTemplate {
            id: Uuid::new_v4(),
            name: "Six week sprint".to_string(),
            description: "Standard sprint".to_string(),
            duration_weeks: 6,
            weekly_themes: vec!["Kickoff".to_string(), "Discovery".to_string()],
            created_at: Utc::now(),
        }
    }

    fn manager(classes: MockClassRepository, roster: MockRosterRepository) -> ClassManager {
        ClassManager::new(Arc::new(classes), Arc::new(roster))
    }

    #[tokio::test]
    async fn test_create_class_copies_template_calendar() {
        let template = template();
        let template_id = template.id;

        let mut classes = MockClassRepository::new();
        let found = template.clone();
        classes
            .expect_find_template()
            .with(eq(template_id))
            .returning(move |_| Ok(Some(found.clone())));
        classes.expect_create().returning(move |valid| {
            assert_eq!(valid.duration_weeks, 6);
            assert_eq!(valid.weekly_themes, vec!["Kickoff", "Discovery"]);
            assert_eq!(valid.template_id, Some(template_id));
            Ok(stored(Uuid::new_v4(), valid.duration_weeks, valid.weekly_themes))
        });

        let class = manager(classes, MockRosterRepository::new())
            .create_class(NewClass {
                name: "Fall Fellowship".to_string(),
                description: String::new(),
                start_date: start(),
                duration_weeks: None,
                weekly_themes: None,
                template_id: Some(template_id),
            })
            .await
            .unwrap();

        assert_eq!(class.duration_weeks, 6);
    }

    #[tokio::test]
    async fn test_create_class_with_unknown_template() {
        let mut classes = MockClassRepository::new();
        classes.expect_find_template().returning(|_| Ok(None));
        classes.expect_create().never();

        let result = manager(classes, MockRosterRepository::new())
            .create_class(NewClass {
                name: "Fall Fellowship".to_string(),
                description: String::new(),
                start_date: start(),
                duration_weeks: Some(8),
                weekly_themes: None,
                template_id: Some(Uuid::new_v4()),
            })
            .await;

        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_create_class_requires_duration() {
        let mut classes = MockClassRepository::new();
        classes.expect_create().never();

        let result = manager(classes, MockRosterRepository::new())
            .create_class(NewClass {
                name: "Fall Fellowship".to_string(),
                description: String::new(),
                start_date: start(),
                duration_weeks: None,
                weekly_themes: None,
                template_id: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_classes_for_user_uses_memberships() {
        let class_id = Uuid::new_v4();

        let mut roster = MockRosterRepository::new();
        roster
            .expect_memberships()
            .with(eq("user_2x"), eq(None))
            .returning(move |_, _| {
                Ok(vec![
                    Membership {
                        class_id,
                        member_id: Uuid::new_v4(),
                        kind: MemberKind::Instructor,
                    },
                    Membership {
                        class_id,
                        member_id: Uuid::new_v4(),
                        kind: MemberKind::Student,
                    },
                ])
            });

        let mut classes = MockClassRepository::new();
        classes
            .expect_list()
            .with(eq(false), eq(Some(vec![class_id])))
            .returning(move |_, _| Ok(vec![stored(class_id, 8, Vec::new())]));

        let list = manager(classes, roster)
            .list_classes(false, Some("user_2x".to_string()))
            .await
            .unwrap();

        assert_eq!(list.len(), 1);
    }

    #[tokio::test]
    async fn test_list_all_classes_skips_roster() {
        let mut roster = MockRosterRepository::new();
        roster.expect_memberships().never();

        let mut classes = MockClassRepository::new();
        classes
            .expect_list()
            .with(eq(true), eq(None))
            .returning(|_, _| Ok(Vec::new()));

        let list = manager(classes, roster).list_classes(true, None).await.unwrap();
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_update_class_rejects_too_many_themes() {
        let id = Uuid::new_v4();

        let mut classes = MockClassRepository::new();
        classes
            .expect_find_by_id()
            .with(eq(id))
            .returning(move |_| Ok(Some(stored(id, 2, Vec::new()))));
        classes.expect_save().never();

        let result = manager(classes, MockRosterRepository::new())
            .update_class(
                id,
                ClassUpdate {
                    weekly_themes: Some(vec!["a".into(), "b".into(), "c".into()]),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
