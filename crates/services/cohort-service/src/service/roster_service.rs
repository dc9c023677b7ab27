//! Roster service - instructors, students and sign-in claiming.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::validation::normalize_email;
use domain::{Member, MemberKind, Membership, NewMember};

use crate::repository::{ClassRepository, RosterRepository};

/// Roster service trait for dependency injection.
#[async_trait]
pub trait RosterService: Send + Sync {
    /// Add an invited person to a class roster
    async fn add_member(&self, class_id: Uuid, kind: MemberKind, member: NewMember)
        -> AppResult<Member>;

    async fn list_members(&self, class_id: Uuid, kind: MemberKind) -> AppResult<Vec<Member>>;

    async fn remove_member(&self, class_id: Uuid, kind: MemberKind, member_id: Uuid)
        -> AppResult<()>;

    async fn list_memberships(
        &self,
        user_id: &str,
        class_id: Option<Uuid>,
    ) -> AppResult<Vec<Membership>>;

    /// Link rows invited under `email` to the signed-in user.
    ///
    /// Returns the number of newly linked rows and all memberships afterwards.
    async fn claim_memberships(
        &self,
        user_id: &str,
        email: &str,
    ) -> AppResult<(u64, Vec<Membership>)>;
}

/// Concrete implementation of RosterService using repositories.
pub struct RosterManager {
    classes: Arc<dyn ClassRepository>,
    roster: Arc<dyn RosterRepository>,
}

impl RosterManager {
    pub fn new(classes: Arc<dyn ClassRepository>, roster: Arc<dyn RosterRepository>) -> Self {
        Self { classes, roster }
    }
}

#[async_trait]
impl RosterService for RosterManager {
    async fn add_member(
        &self,
        class_id: Uuid,
        kind: MemberKind,
        member: NewMember,
    ) -> AppResult<Member> {
        let member = member.validate()?;

        if self.classes.find_by_id(class_id).await?.is_none() {
            return Err(AppError::NotFound);
        }

        if self
            .roster
            .find_by_email(class_id, kind, &member.email)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!("{} with this email", capitalize(kind))));
        }

        let member = self.roster.create(class_id, kind, member).await?;
        tracing::info!(class_id = %class_id, kind = %kind, member_id = %member.id, "Member added");
        Ok(member)
    }

    async fn list_members(&self, class_id: Uuid, kind: MemberKind) -> AppResult<Vec<Member>> {
        self.roster.list(class_id, kind).await
    }

    async fn remove_member(
        &self,
        class_id: Uuid,
        kind: MemberKind,
        member_id: Uuid,
    ) -> AppResult<()> {
        self.roster.delete(class_id, kind, member_id).await
    }

    async fn list_memberships(
        &self,
        user_id: &str,
        class_id: Option<Uuid>,
    ) -> AppResult<Vec<Membership>> {
        self.roster.memberships(user_id, class_id).await
    }

    async fn claim_memberships(
        &self,
        user_id: &str,
        email: &str,
    ) -> AppResult<(u64, Vec<Membership>)> {
        if user_id.trim().is_empty() {
            return Err(AppError::validation("User ID is required"));
        }

        // Tokens without an email claim can still read existing links
        let claimed = match normalize_email(email) {
            Ok(email) => self.roster.claim(user_id, &email).await?,
            Err(_) => 0,
        };
        if claimed > 0 {
            tracing::info!(user_id = %user_id, claimed, "Roster invitations claimed");
        }

        let memberships = self.roster.memberships(user_id, None).await?;
        Ok((claimed, memberships))
    }
}

fn capitalize(kind: MemberKind) -> &'static str {
    match kind {
        MemberKind::Instructor => "Instructor",
        MemberKind::Student => "Student",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use domain::Class;
    use mockall::predicate::eq;

    use crate::repository::{MockClassRepository, MockRosterRepository};

    fn class(id: Uuid) -> Class {
        Class {
            id,
            name: "Fall Fellowship".to_string(),
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

    fn member(class_id: Uuid, kind: MemberKind, email: &str) -> Member {
        Member {
            id: Uuid::new_v4(),
            class_id,
            kind,
            user_id: None,
            email: email.to_string(),
            name: "Ada Lovelace".to_string(),
            created_at: Utc::now(),
        }
    }

    fn classes_with(class_id: Uuid) -> MockClassRepository {
        let mut classes = MockClassRepository::new();
        classes
            .expect_find_by_id()
            .with(eq(class_id))
            .returning(|id| Ok(Some(class(id))));
        classes
    }

    #[tokio::test]
    async fn test_add_member_normalizes_email() {
        let class_id = Uuid::new_v4();

        let mut roster = MockRosterRepository::new();
        roster
            .expect_find_by_email()
            .with(eq(class_id), eq(MemberKind::Student), eq("ada@example.com"))
            .returning(|_, _, _| Ok(None));
        roster
            .expect_create()
            .returning(|class_id, kind, new| Ok(member(class_id, kind, &new.email)));

        let service = RosterManager::new(Arc::new(classes_with(class_id)), Arc::new(roster));
        let added = service
            .add_member(
                class_id,
                MemberKind::Student,
                NewMember {
                    email: "  Ada@Example.COM ".to_string(),
                    name: "Ada Lovelace".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(added.email, "ada@example.com");
        assert_eq!(added.kind, MemberKind::Student);
    }

    #[tokio::test]
    async fn test_add_member_duplicate_email_conflicts() {
        let class_id = Uuid::new_v4();

        let mut roster = MockRosterRepository::new();
        roster
            .expect_find_by_email()
            .returning(|class_id, kind, email| Ok(Some(member(class_id, kind, email))));
        roster.expect_create().never();

        let service = RosterManager::new(Arc::new(classes_with(class_id)), Arc::new(roster));
        let result = service
            .add_member(
                class_id,
                MemberKind::Instructor,
                NewMember {
                    email: "grace@example.com".to_string(),
                    name: "Grace Hopper".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_add_member_rejects_bad_email_before_lookup() {
        let mut classes = MockClassRepository::new();
        classes.expect_find_by_id().never();

        let service = RosterManager::new(Arc::new(classes), Arc::new(MockRosterRepository::new()));
        let result = service
            .add_member(
                Uuid::new_v4(),
                MemberKind::Student,
                NewMember {
                    email: "not-an-email".to_string(),
                    name: "Someone".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_member_to_missing_class() {
        let mut classes = MockClassRepository::new();
        classes.expect_find_by_id().returning(|_| Ok(None));

        let service = RosterManager::new(Arc::new(classes), Arc::new(MockRosterRepository::new()));
        let result = service
            .add_member(
                Uuid::new_v4(),
                MemberKind::Student,
                NewMember {
                    email: "ada@example.com".to_string(),
                    name: "Ada".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_claim_memberships_links_then_lists() {
        let class_id = Uuid::new_v4();

        let mut roster = MockRosterRepository::new();
        roster
            .expect_claim()
            .with(eq("user_abc"), eq("ada@example.com"))
            .times(1)
            .returning(|_, _| Ok(2));
        roster
            .expect_memberships()
            .with(eq("user_abc"), eq(None))
            .returning(move |_, _| {
                Ok(vec![Membership {
                    class_id,
                    member_id: Uuid::new_v4(),
                    kind: MemberKind::Student,
                }])
            });

        let service = RosterManager::new(Arc::new(MockClassRepository::new()), Arc::new(roster));
        let (claimed, memberships) = service
            .claim_memberships("user_abc", "Ada@Example.com")
            .await
            .unwrap();

        assert_eq!(claimed, 2);
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].class_id, class_id);
    }

    #[tokio::test]
    async fn test_claim_without_email_only_lists() {
        let mut roster = MockRosterRepository::new();
        roster.expect_claim().never();
        roster.expect_memberships().returning(|_, _| Ok(Vec::new()));

        let service = RosterManager::new(Arc::new(MockClassRepository::new()), Arc::new(roster));
        let (claimed, memberships) = service.claim_memberships("user_abc", "").await.unwrap();

        assert_eq!(claimed, 0);
        assert!(memberships.is_empty());
    }
}
