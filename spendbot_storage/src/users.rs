//! `UserStore` over the `users` table.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use spendbot_core::{StoreError, User, UserStore};
use spendbot_entities::users;
use tracing::info;
use uuid::Uuid;

use crate::{LedgerStorage, backend, convert};

impl LedgerStorage {
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<users::Model>, StoreError> {
        users::Entity::find()
            .filter(users::Column::PhoneNumber.eq(phone_number))
            .one(&self.db)
            .await
            .map_err(backend)
    }
}

#[async_trait]
impl UserStore for LedgerStorage {
    async fn get_or_create(&self, phone_number: &str) -> Result<User, StoreError> {
        if let Some(model) = self.find_by_phone(phone_number).await? {
            return Ok(convert::user_from_model(model));
        }

        let model = users::ActiveModel {
            id: Set(Uuid::now_v7()),
            phone_number: Set(phone_number.to_string()),
            telegram_chat_id: Set(None),
            billing_day: Set(1),
            created_at: Set(Utc::now().naive_utc()),
        };
        let inserted = model.insert(&self.db).await.map_err(backend)?;

        info!(user = %inserted.id, "user created");
        Ok(convert::user_from_model(inserted))
    }

    async fn find_by_chat(&self, chat_id: &str) -> Result<Option<User>, StoreError> {
        let found = users::Entity::find()
            .filter(users::Column::TelegramChatId.eq(chat_id))
            .one(&self.db)
            .await
            .map_err(backend)?;

        Ok(found.map(convert::user_from_model))
    }

    async fn link_chat(&self, phone_number: &str, chat_id: &str) -> Result<User, StoreError> {
        let updated = if let Some(existing) = self.find_by_phone(phone_number).await? {
            let mut active: users::ActiveModel = existing.into();
            active.telegram_chat_id = Set(Some(chat_id.to_string()));
            active.update(&self.db).await.map_err(backend)?
        } else {
            users::ActiveModel {
                id: Set(Uuid::now_v7()),
                phone_number: Set(phone_number.to_string()),
                telegram_chat_id: Set(Some(chat_id.to_string())),
                billing_day: Set(1),
                created_at: Set(Utc::now().naive_utc()),
            }
            .insert(&self.db)
            .await
            .map_err(backend)?
        };

        info!(user = %updated.id, "chat linked");
        Ok(convert::user_from_model(updated))
    }

    async fn set_billing_day(&self, user_id: Uuid, day: u32) -> Result<User, StoreError> {
        let existing = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(backend)?
            .ok_or(StoreError::NotFound(user_id))?;

        let mut active: users::ActiveModel = existing.into();
        active.billing_day = Set(i32::try_from(day).unwrap_or(1));
        let updated = active.update(&self.db).await.map_err(backend)?;

        Ok(convert::user_from_model(updated))
    }
}
