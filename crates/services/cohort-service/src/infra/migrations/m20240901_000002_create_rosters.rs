//! Migration: Create the instructor and student rosters.
//!
//! Both tables share one shape. A row is created when someone is invited by
//! email and gains a `user_id` once that person signs in.

use sea_orm_migration::prelude::*;

use super::m20240901_000001_create_classes::Classes;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [Roster::Instructors, Roster::Students] {
            create_roster(manager, table).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [Roster::Students, Roster::Instructors] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

async fn create_roster(manager: &SchemaManager<'_>, table: Roster) -> Result<(), DbErr> {
    let name = table.to_string();

    manager
        .create_table(
            Table::create()
                .table(table)
                .if_not_exists()
                .col(ColumnDef::new(Member::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Member::ClassId).uuid().not_null())
                .col(ColumnDef::new(Member::UserId).string().null())
                .col(ColumnDef::new(Member::Email).string().not_null())
                .col(ColumnDef::new(Member::Name).string().not_null())
                .col(
                    ColumnDef::new(Member::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null(),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name(format!("fk_{}_class", name))
                        .from(table, Member::ClassId)
                        .to(Classes::Table, Classes::Id)
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .to_owned(),
        )
        .await?;

    // One invitation per email per class
    manager
        .create_index(
            Index::create()
                .name(format!("idx_{}_class_email", name))
                .table(table)
                .col(Member::ClassId)
                .col(Member::Email)
                .unique()
                .to_owned(),
        )
        .await?;

    manager
        .create_index(
            Index::create()
                .name(format!("idx_{}_user_id", name))
                .table(table)
                .col(Member::UserId)
                .to_owned(),
        )
        .await
}

#[derive(Iden, Clone, Copy)]
pub enum Roster {
    Instructors,
    Students,
}

#[derive(Iden)]
pub enum Member {
    Id,
    ClassId,
    UserId,
    Email,
    Name,
    CreatedAt,
}
