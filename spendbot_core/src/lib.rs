#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]

use async_trait::async_trait;

pub mod context;
pub mod error;
pub mod intent;
pub mod matching;
pub mod model;
pub mod outcome;
pub mod report;
pub mod resolver;
pub mod store;

pub use context::{CONTEXT_TTL, ContextSnapshot, merge_payloads};
pub use error::{ResolveError, StoreError};
pub use intent::{ExpenseEntry, Intent, UpdateSlots};
pub use model::{DEFAULT_CATEGORY, Expense, ExpenseChanges, MIN_ITEM_LEN, NewExpense, User};
pub use outcome::{EntryFailure, Outcome};
pub use report::ExpenseReport;
pub use resolver::{IntentResolver, RECENT_WINDOW};
pub use store::{ContextStore, ExpenseStore, UserStore};

/// External natural-language classifier: raw text plus the active context
/// payload in, structured intent out.
///
/// Implementations must fail closed: any transport or parse failure yields
/// [`Intent::Unknown`] instead of an error. Nothing past this boundary
/// ever sees a classifier failure.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str, context: Option<&serde_json::Value>) -> Intent;
}
