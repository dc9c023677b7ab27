//! Survey database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::{Survey, SurveyKind};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "surveys")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub class_id: Uuid,
    pub title: String,
    pub kind: String,
    pub week: Option<i32>,
    pub is_open: bool,
    pub due_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Survey {
    type Error = DbErr;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Survey {
            id: model.id,
            class_id: model.class_id,
            title: model.title,
            kind: SurveyKind::parse(&model.kind).map_err(|e| DbErr::Type(e.to_string()))?,
            week: model.week,
            is_open: model.is_open,
            due_at: model.due_at,
            created_at: model.created_at,
        })
    }
}
