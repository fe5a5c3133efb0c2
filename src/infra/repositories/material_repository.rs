use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::material::{self, ActiveModel, Entity as MaterialEntity};
use crate::domain::{Material, NewMaterial};
use crate::errors::{AppError, AppResult};

pub struct MaterialRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> MaterialRepository<'c, C> {
    pub(crate) fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Material>> {
        let result = MaterialEntity::find_by_id(id)
            .one(self.conn)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Material::from))
    }

    pub async fn list_for_lesson(&self, lesson_id: Uuid) -> AppResult<Vec<Material>> {
        let models = MaterialEntity::find()
            .filter(material::Column::LessonId.eq(lesson_id))
            .order_by_asc(material::Column::CreatedAt)
            .all(self.conn)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(Material::from).collect())
    }

    pub async fn create(&self, lesson_id: Uuid, input: NewMaterial) -> AppResult<Material> {
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            lesson_id: Set(lesson_id),
            title: Set(input.title),
            file_id: Set(input.file_id),
            url: Set(input.url),
            created_at: Set(Utc::now()),
        };

        let model = active_model.insert(self.conn).await.map_err(AppError::from)?;
        Ok(Material::from(model))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = MaterialEntity::delete_by_id(id)
            .exec(self.conn)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
