//! Weekly course feedback database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::Feedback;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "feedback")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub class_id: Uuid,
    /// NULL for anonymous feedback
    pub student_id: Option<Uuid>,
    pub week: i32,
    pub rating: i32,
    pub body: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Feedback {
    fn from(model: Model) -> Self {
        Feedback {
            id: model.id,
            class_id: model.class_id,
            student_id: model.student_id,
            week: model.week,
            rating: model.rating,
            body: model.body,
            created_at: model.created_at,
        }
    }
}
