//! Student roster database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::{Member, MemberKind};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub class_id: Uuid,
    /// Identity provider user, set once the invite is claimed
    pub user_id: Option<String>,
    pub email: String,
    pub name: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Member {
    fn from(model: Model) -> Self {
        Member {
            id: model.id,
            class_id: model.class_id,
            kind: MemberKind::Student,
            user_id: model.user_id,
            email: model.email,
            name: model.name,
            created_at: model.created_at,
        }
    }
}
