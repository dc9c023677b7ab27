//! Migration: Create surveys, questions, responses and answers.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

use super::m20240901_000001_create_classes::Classes;
use super::m20240901_000002_create_rosters::{Member, Roster};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Surveys::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Surveys::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Surveys::ClassId).uuid().not_null())
                    .col(ColumnDef::new(Surveys::Title).string().not_null())
                    .col(ColumnDef::new(Surveys::Kind).string().not_null())
                    .col(ColumnDef::new(Surveys::Week).integer().null())
                    .col(ColumnDef::new(Surveys::IsOpen).boolean().not_null().default(true))
                    .col(ColumnDef::new(Surveys::DueAt).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Surveys::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_surveys_class")
                            .from(Surveys::Table, Surveys::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SurveyQuestions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SurveyQuestions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SurveyQuestions::SurveyId).uuid().not_null())
                    .col(ColumnDef::new(SurveyQuestions::Position).integer().not_null())
                    .col(ColumnDef::new(SurveyQuestions::Prompt).text().not_null())
                    .col(ColumnDef::new(SurveyQuestions::Kind).string().not_null())
                    .col(ColumnDef::new(SurveyQuestions::Competency).string().null())
                    .col(
                        ColumnDef::new(SurveyQuestions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_survey_questions_survey")
                            .from(SurveyQuestions::Table, SurveyQuestions::SurveyId)
                            .to(Surveys::Table, Surveys::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SurveyResponses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SurveyResponses::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SurveyResponses::SurveyId).uuid().not_null())
                    .col(ColumnDef::new(SurveyResponses::RespondentId).uuid().not_null())
                    .col(ColumnDef::new(SurveyResponses::SubjectId).uuid().null())
                    .col(
                        ColumnDef::new(SurveyResponses::SubmittedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_survey_responses_survey")
                            .from(SurveyResponses::Table, SurveyResponses::SurveyId)
                            .to(Surveys::Table, Surveys::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_survey_responses_respondent")
                            .from(SurveyResponses::Table, SurveyResponses::RespondentId)
                            .to(Roster::Students, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_survey_responses_subject")
                            .from(SurveyResponses::Table, SurveyResponses::SubjectId)
                            .to(Roster::Students, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One response per respondent and subject
        manager
            .create_index(
                Index::create()
                    .name("idx_survey_responses_unique")
                    .table(SurveyResponses::Table)
                    .col(SurveyResponses::SurveyId)
                    .col(SurveyResponses::RespondentId)
                    .col(SurveyResponses::SubjectId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Postgres treats NULL subjects as distinct in the index above
        manager
            .get_connection()
            .execute_unprepared(UNIQUE_SUBJECTLESS_RESPONSE)
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SurveyAnswers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SurveyAnswers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(SurveyAnswers::ResponseId).uuid().not_null())
                    .col(ColumnDef::new(SurveyAnswers::QuestionId).uuid().not_null())
                    .col(ColumnDef::new(SurveyAnswers::Rating).integer().null())
                    .col(ColumnDef::new(SurveyAnswers::Text).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_survey_answers_response")
                            .from(SurveyAnswers::Table, SurveyAnswers::ResponseId)
                            .to(SurveyResponses::Table, SurveyResponses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_survey_answers_question")
                            .from(SurveyAnswers::Table, SurveyAnswers::QuestionId)
                            .to(SurveyQuestions::Table, SurveyQuestions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_survey_answers_response_question")
                    .table(SurveyAnswers::Table)
                    .col(SurveyAnswers::ResponseId)
                    .col(SurveyAnswers::QuestionId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SurveyAnswers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SurveyResponses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SurveyQuestions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Surveys::Table).to_owned())
            .await
    }
}

/// One course-feedback response per respondent.
const UNIQUE_SUBJECTLESS_RESPONSE: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
     idx_survey_responses_unique_subjectless \
     ON survey_responses (survey_id, respondent_id) \
     WHERE subject_id IS NULL";

#[derive(Iden)]
pub enum Surveys {
    Table,
    Id,
    ClassId,
    Title,
    Kind,
    Week,
    IsOpen,
    DueAt,
    CreatedAt,
}

#[derive(Iden)]
enum SurveyQuestions {
    Table,
    Id,
    SurveyId,
    Position,
    Prompt,
    Kind,
    Competency,
    CreatedAt,
}

#[derive(Iden)]
enum SurveyResponses {
    Table,
    Id,
    SurveyId,
    RespondentId,
    SubjectId,
    SubmittedAt,
}

#[derive(Iden)]
enum SurveyAnswers {
    Table,
    Id,
    ResponseId,
    QuestionId,
    Rating,
    Text,
}
