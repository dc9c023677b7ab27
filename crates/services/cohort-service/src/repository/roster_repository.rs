//! Instructor and student roster persistence.
//!
//! The two rosters are separate tables with the same shape; every method
//! takes a `MemberKind` to pick one.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::instructor::{self, Entity as InstructorEntity};
use super::entities::student::{self, Entity as StudentEntity};
use common::{AppError, AppResult};
use domain::{Member, MemberKind, Membership, NewMember};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Roster repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RosterRepository: Send + Sync {
    /// Find member by ID in one roster
    async fn find(&self, kind: MemberKind, id: Uuid) -> AppResult<Option<Member>>;

    /// Find member of a class by normalized email
    async fn find_by_email(
        &self,
        class_id: Uuid,
        kind: MemberKind,
        email: &str,
    ) -> AppResult<Option<Member>>;

    /// List a class roster ordered by name
    async fn list(&self, class_id: Uuid, kind: MemberKind) -> AppResult<Vec<Member>>;

    /// Insert a validated member
    async fn create(&self, class_id: Uuid, kind: MemberKind, member: NewMember) -> AppResult<Member>;

    /// Remove a member from a class roster
    async fn delete(&self, class_id: Uuid, kind: MemberKind, id: Uuid) -> AppResult<()>;

    /// Rows linked to an identity provider user, optionally within one class
    async fn memberships(&self, user_id: &str, class_id: Option<Uuid>)
        -> AppResult<Vec<Membership>>;

    /// Link unclaimed rows invited under `email` to `user_id`; returns rows changed
    async fn claim(&self, user_id: &str, email: &str) -> AppResult<u64>;
}

/// SeaORM implementation of RosterRepository
pub struct RosterStore {
    db: DatabaseConnection,
}

impl RosterStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RosterRepository for RosterStore {
    async fn find(&self, kind: MemberKind, id: Uuid) -> AppResult<Option<Member>> {
        let result = match kind {
            MemberKind::Instructor => InstructorEntity::find_by_id(id)
                .one(&self.db)
                .await?
                .map(Member::from),
            MemberKind::Student => StudentEntity::find_by_id(id)
                .one(&self.db)
                .await?
                .map(Member::from),
        };

        Ok(result)
    }

    async fn find_by_email(
        &self,
        class_id: Uuid,
        kind: MemberKind,
        email: &str,
    ) -> AppResult<Option<Member>> {
        let result = match kind {
            MemberKind::Instructor => InstructorEntity::find()
                .filter(instructor::Column::ClassId.eq(class_id))
                .filter(instructor::Column::Email.eq(email))
                .one(&self.db)
                .await?
                .map(Member::from),
            MemberKind::Student => StudentEntity::find()
                .filter(student::Column::ClassId.eq(class_id))
                .filter(student::Column::Email.eq(email))
                .one(&self.db)
                .await?
                .map(Member::from),
        };

        Ok(result)
    }

    async fn list(&self, class_id: Uuid, kind: MemberKind) -> AppResult<Vec<Member>> {
        let members = match kind {
            MemberKind::Instructor => InstructorEntity::find()
                .filter(instructor::Column::ClassId.eq(class_id))
                .order_by_asc(instructor::Column::Name)
                .all(&self.db)
                .await?
                .into_iter()
                .map(Member::from)
                .collect(),
            MemberKind::Student => StudentEntity::find()
                .filter(student::Column::ClassId.eq(class_id))
                .order_by_asc(student::Column::Name)
                .all(&self.db)
                .await?
                .into_iter()
                .map(Member::from)
                .collect(),
        };

        Ok(members)
    }

    async fn create(&self, class_id: Uuid, kind: MemberKind, member: NewMember) -> AppResult<Member> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let model = match kind {
            MemberKind::Instructor => instructor::ActiveModel {
                id: Set(id),
                class_id: Set(class_id),
                user_id: Set(None),
                email: Set(member.email),
                name: Set(member.name),
                created_at: Set(now),
            }
            .insert(&self.db)
            .await
            .map(Member::from),
            MemberKind::Student => student::ActiveModel {
                id: Set(id),
                class_id: Set(class_id),
                user_id: Set(None),
                email: Set(member.email),
                name: Set(member.name),
                created_at: Set(now),
            }
            .insert(&self.db)
            .await
            .map(Member::from),
        };

        model.map_err(AppError::from)
    }

    async fn delete(&self, class_id: Uuid, kind: MemberKind, id: Uuid) -> AppResult<()> {
        let result = match kind {
            MemberKind::Instructor => {
                InstructorEntity::delete_many()
                    .filter(instructor::Column::Id.eq(id))
                    .filter(instructor::Column::ClassId.eq(class_id))
                    .exec(&self.db)
                    .await?
            }
            MemberKind::Student => {
                StudentEntity::delete_many()
                    .filter(student::Column::Id.eq(id))
                    .filter(student::Column::ClassId.eq(class_id))
                    .exec(&self.db)
                    .await?
            }
        };

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    async fn memberships(
        &self,
        user_id: &str,
        class_id: Option<Uuid>,
    ) -> AppResult<Vec<Membership>> {
        let mut instructors = InstructorEntity::find().filter(instructor::Column::UserId.eq(user_id));
        let mut students = StudentEntity::find().filter(student::Column::UserId.eq(user_id));
        if let Some(class_id) = class_id {
            instructors = instructors.filter(instructor::Column::ClassId.eq(class_id));
            students = students.filter(student::Column::ClassId.eq(class_id));
        }

        let mut memberships: Vec<Membership> = instructors
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| Membership {
                class_id: m.class_id,
                member_id: m.id,
                kind: MemberKind::Instructor,
            })
            .collect();

        memberships.extend(students.all(&self.db).await?.into_iter().map(|m| Membership {
            class_id: m.class_id,
            member_id: m.id,
            kind: MemberKind::Student,
        }));

        Ok(memberships)
    }

    async fn claim(&self, user_id: &str, email: &str) -> AppResult<u64> {
        let instructors = InstructorEntity::update_many()
            .col_expr(instructor::Column::UserId, Expr::value(user_id))
            .filter(instructor::Column::Email.eq(email))
            .filter(instructor::Column::UserId.is_null())
            .exec(&self.db)
            .await?;

        let students = StudentEntity::update_many()
            .col_expr(student::Column::UserId, Expr::value(user_id))
            .filter(student::Column::Email.eq(email))
            .filter(student::Column::UserId.is_null())
            .exec(&self.db)
            .await?;

        Ok(instructors.rows_affected + students.rows_affected)
    }
}
