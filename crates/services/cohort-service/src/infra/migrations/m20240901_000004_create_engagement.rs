//! Migration: Create comments, weekly feedback and announcements.

use sea_orm_migration::prelude::*;

use super::m20240901_000001_create_classes::Classes;
use super::m20240901_000002_create_rosters::{Member, Roster};
use super::m20240901_000003_create_surveys::Surveys;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SurveyComments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SurveyComments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SurveyComments::SurveyId).uuid().not_null())
                    .col(ColumnDef::new(SurveyComments::ClassId).uuid().not_null())
                    .col(ColumnDef::new(SurveyComments::AuthorId).uuid().not_null())
                    .col(ColumnDef::new(SurveyComments::SubjectId).uuid().null())
                    .col(ColumnDef::new(SurveyComments::Body).text().not_null())
                    .col(
                        ColumnDef::new(SurveyComments::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(SurveyComments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SurveyComments::ModeratedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_survey_comments_survey")
                            .from(SurveyComments::Table, SurveyComments::SurveyId)
                            .to(Surveys::Table, Surveys::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_survey_comments_class")
                            .from(SurveyComments::Table, SurveyComments::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_survey_comments_author")
                            .from(SurveyComments::Table, SurveyComments::AuthorId)
                            .to(Roster::Students, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_survey_comments_class_status")
                    .table(SurveyComments::Table)
                    .col(SurveyComments::ClassId)
                    .col(SurveyComments::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Feedback::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Feedback::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Feedback::ClassId).uuid().not_null())
                    .col(ColumnDef::new(Feedback::StudentId).uuid().null())
                    .col(ColumnDef::new(Feedback::Week).integer().not_null())
                    .col(ColumnDef::new(Feedback::Rating).integer().not_null())
                    .col(ColumnDef::new(Feedback::Body).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Feedback::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feedback_class")
                            .from(Feedback::Table, Feedback::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feedback_student")
                            .from(Feedback::Table, Feedback::StudentId)
                            .to(Roster::Students, Member::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ClassAnnouncements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClassAnnouncements::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClassAnnouncements::ClassId).uuid().not_null())
                    .col(ColumnDef::new(ClassAnnouncements::Title).string().not_null())
                    .col(ColumnDef::new(ClassAnnouncements::Body).text().not_null())
                    .col(ColumnDef::new(ClassAnnouncements::AuthorUserId).string().not_null())
                    .col(
                        ColumnDef::new(ClassAnnouncements::Pinned)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ClassAnnouncements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_class_announcements_class")
                            .from(ClassAnnouncements::Table, ClassAnnouncements::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClassAnnouncements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Feedback::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SurveyComments::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SurveyComments {
    Table,
    Id,
    SurveyId,
    ClassId,
    AuthorId,
    SubjectId,
    Body,
    Status,
    CreatedAt,
    ModeratedAt,
}

#[derive(Iden)]
enum Feedback {
    Table,
    Id,
    ClassId,
    StudentId,
    Week,
    Rating,
    Body,
    CreatedAt,
}

#[derive(Iden)]
enum ClassAnnouncements {
    Table,
    Id,
    ClassId,
    Title,
    Body,
    AuthorUserId,
    Pinned,
    CreatedAt,
}
