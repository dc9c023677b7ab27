//! Fellowship template database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::{FellowshipTemplate, QuestionDraft, SurveyKind};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "fellowship_templates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub survey_kind: String,
    /// JSON array of `{prompt, kind, competency}` drafts
    #[sea_orm(column_type = "JsonBinary")]
    pub questions: Json,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for FellowshipTemplate {
    type Error = DbErr;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let survey_kind = SurveyKind::parse(&model.survey_kind)
            .map_err(|e| DbErr::Type(e.to_string()))?;
        let questions: Vec<QuestionDraft> = serde_json::from_value(model.questions)
            .map_err(|e| DbErr::Json(e.to_string()))?;

        Ok(FellowshipTemplate {
            id: model.id,
            name: model.name,
            description: model.description,
            survey_kind,
            questions,
            created_at: model.created_at,
        })
    }
}
