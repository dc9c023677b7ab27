//! Survey comment database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::{Comment, CommentStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "survey_comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub survey_id: Uuid,
    pub class_id: Uuid,
    pub author_id: Uuid,
    pub subject_id: Option<Uuid>,
    pub body: String,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub moderated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Comment {
    type Error = DbErr;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Comment {
            id: model.id,
            survey_id: model.survey_id,
            class_id: model.class_id,
            author_id: model.author_id,
            subject_id: model.subject_id,
            body: model.body,
            status: CommentStatus::parse(&model.status).map_err(|e| DbErr::Type(e.to_string()))?,
            created_at: model.created_at,
            moderated_at: model.moderated_at,
        })
    }
}
