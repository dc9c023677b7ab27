//! Class database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::Class;

use super::themes_from_json;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub start_date: Date,
    pub duration_weeks: i32,
    #[sea_orm(column_type = "JsonBinary")]
    pub weekly_themes: Json,
    pub template_id: Option<Uuid>,
    pub archived: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Class {
    fn from(model: Model) -> Self {
        Class {
            id: model.id,
            name: model.name,
            description: model.description,
            start_date: model.start_date,
            duration_weeks: model.duration_weeks,
            weekly_themes: themes_from_json(model.weekly_themes),
            template_id: model.template_id,
            archived: model.archived,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
