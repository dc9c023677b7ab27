//! Class announcement database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::Announcement;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "class_announcements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub class_id: Uuid,
    pub title: String,
    pub body: String,
    pub author_user_id: String,
    pub pinned: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Announcement {
    fn from(model: Model) -> Self {
        Announcement {
            id: model.id,
            class_id: model.class_id,
            title: model.title,
            body: model.body,
            author_user_id: model.author_user_id,
            pinned: model.pinned,
            created_at: model.created_at,
        }
    }
}
