use sea_orm::entity::prelude::*;

use crate::domain::{FileRecord, Visibility};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_user_id: Option<Uuid>,
    pub original_name: String,
    #[sea_orm(unique)]
    pub path: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub visibility: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerUserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for FileRecord {
    fn from(model: Model) -> Self {
        FileRecord {
            id: model.id,
            owner_user_id: model.owner_user_id,
            original_name: model.original_name,
            path: model.path,
            content_type: model.content_type,
            size_bytes: model.size_bytes,
            visibility: Visibility::from_stored(&model.visibility),
            created_at: model.created_at,
        }
    }
}
