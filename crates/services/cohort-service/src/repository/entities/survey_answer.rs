//! Survey answer database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::Answer;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "survey_answers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub response_id: Uuid,
    pub question_id: Uuid,
    pub rating: Option<i32>,
    pub text: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Answer {
    fn from(model: Model) -> Self {
        Answer {
            id: model.id,
            response_id: model.response_id,
            question_id: model.question_id,
            rating: model.rating,
            text: model.text,
        }
    }
}
