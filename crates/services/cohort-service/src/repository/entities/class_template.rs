//! Class template database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::ClassTemplate;

use super::themes_from_json;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "class_templates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub duration_weeks: i32,
    #[sea_orm(column_type = "JsonBinary")]
    pub weekly_themes: Json,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ClassTemplate {
    fn from(model: Model) -> Self {
        ClassTemplate {
            id: model.id,
            name: model.name,
            description: model.description,
            duration_weeks: model.duration_weeks,
            weekly_themes: themes_from_json(model.weekly_themes),
            created_at: model.created_at,
        }
    }
}
