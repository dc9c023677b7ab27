//! Survey question database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::{Question, QuestionKind};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "survey_questions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub survey_id: Uuid,
    pub position: i32,
    pub prompt: String,
    pub kind: String,
    pub competency: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Question {
    type Error = DbErr;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Question {
            id: model.id,
            survey_id: model.survey_id,
            position: model.position,
            prompt: model.prompt,
            kind: QuestionKind::parse(&model.kind).map_err(|e| DbErr::Type(e.to_string()))?,
            competency: model.competency,
        })
    }
}
