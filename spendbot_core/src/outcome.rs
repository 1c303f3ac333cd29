//! Normalized per-turn outcomes handed to the presentation layer.
//!
//! The core never renders human-facing text; each variant carries just
//! the data a presentation layer needs to do so.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::Expense;
use crate::report::ExpenseReport;

/// Why an individual `add_expense` entry was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EntryFailure {
    /// Item name trims to fewer than [`crate::MIN_ITEM_LEN`] characters.
    ItemTooShort { item: String },
    /// Resolved effective date is strictly in the future.
    FutureDate { item: String, date: DateTime<Utc> },
}

/// The result of resolving one intent against the ledger.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// At least one entry was considered; `count` is the number actually
    /// persisted and `failures` reports the skipped ones.
    Saved {
        count: usize,
        records: Vec<Expense>,
        failures: Vec<EntryFailure>,
    },
    Listing(ExpenseReport),
    Updated {
        record: Expense,
    },
    Deleted {
        record: Expense,
    },
    DeletedMany {
        count: u64,
    },
    /// Full ledger reset.
    Cleared {
        count: u64,
    },
    /// The classifier needs more information; `question` is its own
    /// wording, when it supplied one.
    ClarificationNeeded {
        question: Option<String>,
    },
    NotFound {
        term: String,
    },
    /// An update carried a date strictly in the future; nothing was
    /// applied.
    FutureDate {
        date: DateTime<Utc>,
    },
    /// Nothing to do: empty ledger for a `*_last` action, or an update
    /// with no recognized fields.
    NoChange,
    Unrecognized,
}
