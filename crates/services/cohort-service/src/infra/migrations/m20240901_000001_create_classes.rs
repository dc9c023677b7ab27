//! Migration: Create classes and the two template tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClassTemplates::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ClassTemplates::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ClassTemplates::Name).string().not_null())
                    .col(
                        ColumnDef::new(ClassTemplates::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(ClassTemplates::DurationWeeks).integer().not_null())
                    .col(ColumnDef::new(ClassTemplates::WeeklyThemes).json_binary().not_null())
                    .col(
                        ColumnDef::new(ClassTemplates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Classes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Classes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Classes::Name).string().not_null())
                    .col(ColumnDef::new(Classes::Description).text().not_null().default(""))
                    .col(ColumnDef::new(Classes::StartDate).date().not_null())
                    .col(ColumnDef::new(Classes::DurationWeeks).integer().not_null())
                    .col(ColumnDef::new(Classes::WeeklyThemes).json_binary().not_null())
                    .col(ColumnDef::new(Classes::TemplateId).uuid().null())
                    .col(
                        ColumnDef::new(Classes::Archived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Classes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Classes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_classes_template")
                            .from(Classes::Table, Classes::TemplateId)
                            .to(ClassTemplates::Table, ClassTemplates::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_classes_start_date")
                    .table(Classes::Table)
                    .col(Classes::StartDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FellowshipTemplates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FellowshipTemplates::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FellowshipTemplates::Name).string().not_null())
                    .col(
                        ColumnDef::new(FellowshipTemplates::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(FellowshipTemplates::SurveyKind).string().not_null())
                    .col(ColumnDef::new(FellowshipTemplates::Questions).json_binary().not_null())
                    .col(
                        ColumnDef::new(FellowshipTemplates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FellowshipTemplates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Classes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ClassTemplates::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Classes {
    Table,
    Id,
    Name,
    Description,
    StartDate,
    DurationWeeks,
    WeeklyThemes,
    TemplateId,
    Archived,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ClassTemplates {
    Table,
    Id,
    Name,
    Description,
    DurationWeeks,
    WeeklyThemes,
    CreatedAt,
}

#[derive(Iden)]
enum FellowshipTemplates {
    Table,
    Id,
    Name,
    Description,
    SurveyKind,
    Questions,
    CreatedAt,
}
