//! Store contracts consumed by the resolver.
//!
//! Every ledger operation takes the owning user and must filter on it;
//! no input may reach another user's rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::context::ContextSnapshot;
use crate::error::StoreError;
use crate::model::{Expense, ExpenseChanges, NewExpense, User};

/// Durable per-user collection of expense records.
///
/// "Most recent" exists in two deliberately distinct flavors:
/// [`Self::latest_by_creation`] orders by the creation timestamp, while
/// [`Self::latest_by_insertion`] orders by surrogate key and so breaks
/// creation-time ties by insertion order.
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn create(&self, expense: NewExpense) -> Result<Expense, StoreError>;

    async fn latest_by_creation(&self, user_id: Uuid) -> Result<Option<Expense>, StoreError>;

    async fn latest_by_insertion(&self, user_id: Uuid) -> Result<Option<Expense>, StoreError>;

    /// Up to `limit` records, most recent creation first.
    async fn recent_window(&self, user_id: Uuid, limit: u64) -> Result<Vec<Expense>, StoreError>;

    /// All records created at or after `from`, most recent creation first.
    async fn created_since(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
    ) -> Result<Vec<Expense>, StoreError>;

    /// The full history, most recent creation first.
    async fn list_all(&self, user_id: Uuid) -> Result<Vec<Expense>, StoreError>;

    /// Fails with [`StoreError::NotFound`] when the record no longer
    /// exists under this user.
    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: ExpenseChanges,
    ) -> Result<Expense, StoreError>;

    /// Idempotent: deleting an absent record is not an error.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError>;

    /// Returns the number of records actually deleted.
    async fn delete_many(&self, user_id: Uuid, ids: &[Uuid]) -> Result<u64, StoreError>;

    /// Returns the number of records deleted.
    async fn delete_all(&self, user_id: Uuid) -> Result<u64, StoreError>;
}

/// Per-user ephemeral conversation context with a 5-minute validity
/// window (see [`crate::CONTEXT_TTL`]).
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// An expired context is treated as absent and proactively deleted
    /// (lazy expiry; no background sweeper).
    async fn get(&self, user_id: Uuid) -> Result<Option<ContextSnapshot>, StoreError>;

    /// Upserts the shallow union of the previous payload (if still valid)
    /// and `partial`, new values winning; returns the merged payload.
    async fn merge(
        &self,
        user_id: Uuid,
        partial: &serde_json::Value,
    ) -> Result<serde_json::Value, StoreError>;

    /// Idempotent delete; never errors when absent.
    async fn clear(&self, user_id: Uuid) -> Result<(), StoreError>;
}

/// Registration and lookup of users, keyed by phone number.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Created on first contact with `billing_day = 1`.
    async fn get_or_create(&self, phone_number: &str) -> Result<User, StoreError>;

    async fn find_by_chat(&self, chat_id: &str) -> Result<Option<User>, StoreError>;

    /// Upserts the user and binds the chat to it.
    async fn link_chat(&self, phone_number: &str, chat_id: &str) -> Result<User, StoreError>;

    /// `day` must already be validated to 1–31 by the caller.
    async fn set_billing_day(&self, user_id: Uuid, day: u32) -> Result<User, StoreError>;
}
