//! `ContextStore` over the `conversation_states` table.
//!
//! Expiry is lazy: an over-age row is deleted on the read that finds it.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use spendbot_core::{ContextSnapshot, ContextStore, StoreError, merge_payloads};
use spendbot_entities::conversation_states;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{LedgerStorage, backend};

#[async_trait]
impl ContextStore for LedgerStorage {
    async fn get(&self, user_id: Uuid) -> Result<Option<ContextSnapshot>, StoreError> {
        let Some(model) = conversation_states::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(backend)?
        else {
            return Ok(None);
        };

        let Ok(payload) = serde_json::from_str(&model.data) else {
            // A payload we cannot read is as good as expired.
            warn!(user = %user_id, "dropping unreadable conversation state");
            self.clear(user_id).await?;
            return Ok(None);
        };

        let snapshot = ContextSnapshot {
            payload,
            updated_at: model.updated_at.and_utc(),
        };
        if snapshot.is_fresh(Utc::now()) {
            Ok(Some(snapshot))
        } else {
            debug!(user = %user_id, "conversation state expired, deleting");
            self.clear(user_id).await?;
            Ok(None)
        }
    }

    async fn merge(
        &self,
        user_id: Uuid,
        partial: &serde_json::Value,
    ) -> Result<serde_json::Value, StoreError> {
        let previous = self.get(user_id).await?.map(|s| s.payload);
        let merged = merge_payloads(previous, partial);
        let data = serde_json::to_string(&merged)
            .map_err(|e| StoreError::Backend(anyhow::Error::from(e)))?;
        let now = Utc::now().naive_utc();

        if conversation_states::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(backend)?
            .is_some()
        {
            conversation_states::ActiveModel {
                user_id: Set(user_id),
                data: Set(data),
                updated_at: Set(now),
            }
            .update(&self.db)
            .await
            .map_err(backend)?;
        } else {
            conversation_states::ActiveModel {
                user_id: Set(user_id),
                data: Set(data),
                updated_at: Set(now),
            }
            .insert(&self.db)
            .await
            .map_err(backend)?;
        }

        debug!(user = %user_id, "conversation state merged");
        Ok(merged)
    }

    async fn clear(&self, user_id: Uuid) -> Result<(), StoreError> {
        conversation_states::Entity::delete_by_id(user_id)
            .exec(&self.db)
            .await
            .map_err(backend)?;

        Ok(())
    }
}
