//! Domain model shared by every crate in the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category recorded when the classifier supplies none.
pub const DEFAULT_CATEGORY: &str = "General";

/// Minimum trimmed item-name length for an expense to be created.
pub const MIN_ITEM_LEN: usize = 2;

/// A registered user, keyed by a stable phone number.
///
/// The identity is immutable once created; the billing-cycle anchor day
/// and the linked chat are mutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub phone_number: String,
    pub telegram_chat_id: Option<String>,
    /// Day of month (1–31) anchoring the billing cycle.
    pub billing_day: u32,
    pub created_at: DateTime<Utc>,
}

/// A single ledger record, exclusively owned by one [`User`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub item: String,
    pub amount: f64,
    pub category: String,
    pub location: Option<String>,
    /// When the purchase happened, as opposed to when it was logged.
    /// Never strictly in the future at the time it was written.
    pub expense_date: DateTime<Utc>,
    /// Set once at insertion, monotonic per user.
    pub created_at: DateTime<Utc>,
}

/// Input for [`crate::ExpenseStore::create`]: a validated, normalized
/// entry ready for persistence.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub user_id: Uuid,
    pub item: String,
    pub amount: f64,
    pub category: String,
    pub location: Option<String>,
    pub expense_date: DateTime<Utc>,
}

/// Partial update applied to an existing expense. Unset fields are left
/// untouched by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseChanges {
    pub item: Option<String>,
    pub amount: Option<f64>,
    pub location: Option<String>,
    pub expense_date: Option<DateTime<Utc>>,
}

impl ExpenseChanges {
    /// True when no field is set, i.e. the update would be a no-op.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.item.is_none()
            && self.amount.is_none()
            && self.location.is_none()
            && self.expense_date.is_none()
    }
}
