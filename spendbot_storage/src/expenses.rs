//! `ExpenseStore` over the `expenses` table.
//!
//! Surrogate keys are UUID v7, so ordering by id is insertion order;
//! this is what backs `latest_by_insertion`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use spendbot_core::{Expense, ExpenseChanges, ExpenseStore, NewExpense, StoreError};
use spendbot_entities::expenses;
use tracing::info;
use uuid::Uuid;

use crate::{LedgerStorage, backend, convert};

#[async_trait]
impl ExpenseStore for LedgerStorage {
    async fn create(&self, expense: NewExpense) -> Result<Expense, StoreError> {
        let model = expenses::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(expense.user_id),
            item: Set(expense.item),
            amount: Set(expense.amount),
            category: Set(expense.category),
            location: Set(expense.location),
            expense_date: Set(expense.expense_date.naive_utc()),
            created_at: Set(Utc::now().naive_utc()),
        };
        let inserted = model.insert(&self.db).await.map_err(backend)?;

        info!(id = %inserted.id, "expense created");
        Ok(convert::expense_from_model(inserted))
    }

    async fn latest_by_creation(&self, user_id: Uuid) -> Result<Option<Expense>, StoreError> {
        let found = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id))
            .order_by_desc(expenses::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(backend)?;

        Ok(found.map(convert::expense_from_model))
    }

    async fn latest_by_insertion(&self, user_id: Uuid) -> Result<Option<Expense>, StoreError> {
        let found = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id))
            .order_by_desc(expenses::Column::Id)
            .one(&self.db)
            .await
            .map_err(backend)?;

        Ok(found.map(convert::expense_from_model))
    }

    async fn recent_window(&self, user_id: Uuid, limit: u64) -> Result<Vec<Expense>, StoreError> {
        let rows = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id))
            .order_by_desc(expenses::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(backend)?;

        Ok(rows.into_iter().map(convert::expense_from_model).collect())
    }

    async fn created_since(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
    ) -> Result<Vec<Expense>, StoreError> {
        let rows = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id))
            .filter(expenses::Column::CreatedAt.gte(from.naive_utc()))
            .order_by_desc(expenses::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(backend)?;

        Ok(rows.into_iter().map(convert::expense_from_model).collect())
    }

    async fn list_all(&self, user_id: Uuid) -> Result<Vec<Expense>, StoreError> {
        let rows = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id))
            .order_by_desc(expenses::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(backend)?;

        Ok(rows.into_iter().map(convert::expense_from_model).collect())
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: ExpenseChanges,
    ) -> Result<Expense, StoreError> {
        let existing = expenses::Entity::find_by_id(id)
            .filter(expenses::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(backend)?
            .ok_or(StoreError::NotFound(id))?;

        let mut active: expenses::ActiveModel = existing.into();
        if let Some(item) = changes.item {
            active.item = Set(item);
        }
        if let Some(amount) = changes.amount {
            active.amount = Set(amount);
        }
        if let Some(location) = changes.location {
            active.location = Set(Some(location));
        }
        if let Some(date) = changes.expense_date {
            active.expense_date = Set(date.naive_utc());
        }
        let updated = active.update(&self.db).await.map_err(backend)?;

        info!(id = %updated.id, "expense updated");
        Ok(convert::expense_from_model(updated))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        // Idempotent: zero affected rows is not an error.
        expenses::Entity::delete_many()
            .filter(expenses::Column::UserId.eq(user_id))
            .filter(expenses::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(backend)?;

        Ok(())
    }

    async fn delete_many(&self, user_id: Uuid, ids: &[Uuid]) -> Result<u64, StoreError> {
        let result = expenses::Entity::delete_many()
            .filter(expenses::Column::UserId.eq(user_id))
            .filter(expenses::Column::Id.is_in(ids.to_vec()))
            .exec(&self.db)
            .await
            .map_err(backend)?;

        Ok(result.rows_affected)
    }

    async fn delete_all(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let result = expenses::Entity::delete_many()
            .filter(expenses::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(backend)?;

        info!(user = %user_id, count = result.rows_affected, "ledger wiped");
        Ok(result.rows_affected)
    }
}
