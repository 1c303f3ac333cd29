//! sea-orm implementations of the core store traits.
//!
//! One [`LedgerStorage`] value implements
//! [`spendbot_core::ExpenseStore`], [`spendbot_core::ContextStore`] and
//! [`spendbot_core::UserStore`] over a single database connection.

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
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]

mod context;
mod convert;
mod expenses;
mod users;

use sea_orm::{Database, DatabaseConnection, DbErr};
use spendbot_core::StoreError;
use tracing::info;

/// Storage over the `users`, `expenses` and `conversation_states`
/// tables. Cheap to clone; every operation is a single atomic statement.
#[derive(Clone)]
pub struct LedgerStorage {
    db: DatabaseConnection,
}

impl LedgerStorage {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to ledger database");
        let db = Database::connect(database_url).await?;
        info!("Ledger storage initialized");
        Ok(Self { db })
    }

    /// Wrap an existing connection (tests, pooled setups).
    #[must_use]
    pub const fn with_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

pub(crate) fn backend(err: DbErr) -> StoreError {
    StoreError::Backend(err.into())
}
