use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};
use uuid::Uuid;

use super::entities::profile::{ActiveModel, Entity as ProfileEntity};
use crate::domain::{Profile, UpdateProfile};
use crate::errors::{AppError, AppResult};

pub struct ProfileRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> ProfileRepository<'c, C> {
    pub(crate) fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let result = ProfileEntity::find_by_id(user_id)
            .one(self.conn)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Profile::from))
    }

    /// Create the profile on first write, otherwise patch the given fields.
    pub async fn upsert(&self, user_id: Uuid, changes: UpdateProfile) -> AppResult<Profile> {
        let now = Utc::now();
        let existing = ProfileEntity::find_by_id(user_id)
            .one(self.conn)
            .await
            .map_err(AppError::from)?;

        let model = match existing {
            Some(model) => {
                let mut active: ActiveModel = model.into();
                if let Some(full_name) = changes.full_name {
                    active.full_name = Set(Some(full_name));
                }
                if let Some(bio) = changes.bio {
                    active.bio = Set(Some(bio));
                }
                if let Some(avatar) = changes.avatar_file_id {
                    active.avatar_file_id = Set(avatar);
                }
                active.updated_at = Set(now);
                active.update(self.conn).await?
            }
            None => {
                ActiveModel {
                    user_id: Set(user_id),
                    full_name: Set(changes.full_name),
                    bio: Set(changes.bio),
                    avatar_file_id: Set(changes.avatar_file_id.flatten()),
                    updated_at: Set(now),
                }
                .insert(self.conn)
                .await?
            }
        };

        Ok(Profile::from(model))
    }
}
