//! Lesson progress database entity. At most one row per `(user_id, lesson_id)`.

use sea_orm::entity::prelude::*;

use crate::domain::ProgressRecord;
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "progress")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub status: String,
    #[sea_orm(column_type = "Double", nullable)]
    pub score: Option<f64>,
    pub completed_at: Option<DateTimeUtc>,
    pub last_viewed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::lesson::Entity",
        from = "Column::LessonId",
        to = "super::lesson::Column::Id",
        on_delete = "Cascade"
    )]
    Lesson,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::lesson::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lesson.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for ProgressRecord {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(ProgressRecord {
            id: model.id,
            user_id: model.user_id,
            lesson_id: model.lesson_id,
            status: model.status.parse()?,
            score: model.score,
            completed_at: model.completed_at,
            last_viewed_at: model.last_viewed_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
