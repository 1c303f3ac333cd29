//! The intent resolver: a pure dispatcher keyed on the intent's action
//! tag, consuming one structured intent per turn and applying the
//! resulting mutation to the ledger.
//!
//! Turns from the same user are expected to arrive sequentially; the
//! resolver does not serialize concurrent turns itself. Two overlapping
//! turns for one user can race on the conversation-state merge and on
//! "most recent expense" selection. Context and ledger are mutated by
//! separate single store operations, so a crash in between can leave a
//! stale context behind; that is acceptable because context is advisory
//! and TTL-bounded, never authoritative over ledger state.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ResolveError, StoreError};
use crate::intent::{ExpenseEntry, Intent, UpdateSlots};
use crate::matching;
use crate::model::{DEFAULT_CATEGORY, Expense, ExpenseChanges, MIN_ITEM_LEN, NewExpense, User};
use crate::outcome::{EntryFailure, Outcome};
use crate::report::{self, ExpenseReport};
use crate::store::{ContextStore, ExpenseStore};

/// Size of the most-recent-first window scanned by search-based actions.
pub const RECENT_WINDOW: u64 = 50;

/// Stateful intent-resolution and ledger-mutation engine.
pub struct IntentResolver {
    expenses: Arc<dyn ExpenseStore>,
    context: Arc<dyn ContextStore>,
}

impl IntentResolver {
    #[must_use]
    pub fn new(expenses: Arc<dyn ExpenseStore>, context: Arc<dyn ContextStore>) -> Self {
        Self { expenses, context }
    }

    /// Resolve one intent for one user, evaluated against the current
    /// wall clock.
    pub async fn resolve(&self, user: &User, intent: Intent) -> Result<Outcome, ResolveError> {
        self.resolve_at(user, intent, Utc::now()).await
    }

    /// Same as [`Self::resolve`], with an injected evaluation time so
    /// date validation is testable.
    pub async fn resolve_at(
        &self,
        user: &User,
        intent: Intent,
        now: DateTime<Utc>,
    ) -> Result<Outcome, ResolveError> {
        debug!(user = %user.id, action = intent.action_name(), "resolving intent");

        match intent {
            Intent::AddExpense { expenses } => self.add_expenses(user, expenses, now).await,
            Intent::ListExpenses => self.list_expenses(user, now).await,
            Intent::UpdateExpense {
                search_term,
                update,
            } => self.update_matching(user, search_term, update, now).await,
            Intent::UpdateLastExpense { update } => self.update_last(user, update, now).await,
            Intent::DeleteLastExpense => self.delete_last(user).await,
            Intent::DeleteSpecificExpense {
                search_term,
                delete_all,
            } => self.delete_matching(user, search_term, delete_all).await,
            Intent::ResetData => self.reset_data(user).await,
            Intent::AskForInfo {
                question,
                partial_data,
            } => self.ask_for_info(user, question, partial_data).await,
            // No mutation; conversation state is deliberately left
            // untouched so an in-flight clarification can still land.
            Intent::Unknown => Ok(Outcome::Unrecognized),
        }
    }

    async fn add_expenses(
        &self,
        user: &User,
        entries: Vec<ExpenseEntry>,
        now: DateTime<Utc>,
    ) -> Result<Outcome, ResolveError> {
        let mut records: Vec<Expense> = Vec::new();
        let mut failures: Vec<EntryFailure> = Vec::new();

        for entry in entries {
            let item = entry.item.trim().to_string();
            if item.chars().count() < MIN_ITEM_LEN {
                failures.push(EntryFailure::ItemTooShort { item });
                continue;
            }

            // Unparseable dates fall back to now; only a date we can
            // actually read as future is grounds for rejection.
            let expense_date = entry
                .date
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or(now);
            if expense_date > now {
                failures.push(EntryFailure::FutureDate {
                    item,
                    date: expense_date,
                });
                continue;
            }

            let record = self
                .expenses
                .create(NewExpense {
                    user_id: user.id,
                    item,
                    amount: entry.amount.unwrap_or(0.0).max(0.0),
                    category: non_empty(entry.category)
                        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
                    location: normalize_location(entry.location),
                    expense_date,
                })
                .await?;
            records.push(record);
        }

        // The turn is resolved once anything was persisted.
        if !records.is_empty() {
            self.context.clear(user.id).await?;
        }

        info!(
            user = %user.id,
            saved = records.len(),
            skipped = failures.len(),
            "add_expense applied"
        );
        Ok(Outcome::Saved {
            count: records.len(),
            records,
            failures,
        })
    }

    async fn list_expenses(&self, user: &User, now: DateTime<Utc>) -> Result<Outcome, ResolveError> {
        let start = report::cycle_start(now.date_naive(), user.billing_day);
        let from = start.and_time(NaiveTime::MIN).and_utc();

        let cycle = self.expenses.created_since(user.id, from).await?;
        let all = self.expenses.list_all(user.id).await?;

        let listing = ExpenseReport {
            cycle_start: start,
            cycle_total: cycle.iter().map(|e| e.amount).sum(),
            total: all.iter().map(|e| e.amount).sum(),
            groups: report::group_by_day(&cycle),
        };

        self.context.clear(user.id).await?;
        Ok(Outcome::Listing(listing))
    }

    async fn update_matching(
        &self,
        user: &User,
        search_term: Option<String>,
        update: UpdateSlots,
        now: DateTime<Utc>,
    ) -> Result<Outcome, ResolveError> {
        let outcome = match required_term(search_term) {
            None => Outcome::Unrecognized,
            Some(term) => {
                let window = self.expenses.recent_window(user.id, RECENT_WINDOW).await?;
                match matching::find_first(&term, &window).map(|e| e.id) {
                    None => Outcome::NotFound { term },
                    Some(target) => self.apply_update(user, target, update, now, &term).await?,
                }
            }
        };

        // Match outcome does not matter: this action is terminal.
        self.context.clear(user.id).await?;
        Ok(outcome)
    }

    async fn update_last(
        &self,
        user: &User,
        update: UpdateSlots,
        now: DateTime<Utc>,
    ) -> Result<Outcome, ResolveError> {
        let outcome = match self.expenses.latest_by_insertion(user.id).await? {
            None => Outcome::NoChange,
            Some(target) => {
                self.apply_update(user, target.id, update, now, &target.item)
                    .await?
            }
        };

        self.context.clear(user.id).await?;
        Ok(outcome)
    }

    /// Shared update-application rules for both update actions.
    async fn apply_update(
        &self,
        user: &User,
        target: Uuid,
        update: UpdateSlots,
        now: DateTime<Utc>,
        term: &str,
    ) -> Result<Outcome, ResolveError> {
        let changes = match build_changes(update, now) {
            Err(date) => return Ok(Outcome::FutureDate { date }),
            Ok(changes) if changes.is_empty() => return Ok(Outcome::NoChange),
            Ok(changes) => changes,
        };

        match self.expenses.update(user.id, target, changes).await {
            Ok(record) => Ok(Outcome::Updated { record }),
            // Deleted out from under us between lookup and write.
            Err(StoreError::NotFound(_)) => Ok(Outcome::NotFound {
                term: term.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_last(&self, user: &User) -> Result<Outcome, ResolveError> {
        let outcome = match self.expenses.latest_by_insertion(user.id).await? {
            None => Outcome::NoChange,
            Some(record) => {
                self.expenses.delete(user.id, record.id).await?;
                Outcome::Deleted { record }
            }
        };

        self.context.clear(user.id).await?;
        Ok(outcome)
    }

    async fn delete_matching(
        &self,
        user: &User,
        search_term: Option<String>,
        delete_all: bool,
    ) -> Result<Outcome, ResolveError> {
        let outcome = match required_term(search_term) {
            None => Outcome::Unrecognized,
            Some(term) => {
                let window = self.expenses.recent_window(user.id, RECENT_WINDOW).await?;
                let matches: Vec<Expense> = matching::find_matches(&term, &window)
                    .into_iter()
                    .cloned()
                    .collect();

                if delete_all && !matches.is_empty() {
                    let ids: Vec<Uuid> = matches.iter().map(|e| e.id).collect();
                    let count = self.expenses.delete_many(user.id, &ids).await?;
                    info!(user = %user.id, count, "bulk delete by term");
                    Outcome::DeletedMany { count }
                } else if let Some(record) = matches.into_iter().next() {
                    // Window is most-recent-first, so the first match is
                    // the most recent one.
                    self.expenses.delete(user.id, record.id).await?;
                    Outcome::Deleted { record }
                } else {
                    Outcome::NotFound { term }
                }
            }
        };

        self.context.clear(user.id).await?;
        Ok(outcome)
    }

    async fn reset_data(&self, user: &User) -> Result<Outcome, ResolveError> {
        // Destructive and immediate, by specification: no confirmation
        // round-trip.
        let count = self.expenses.delete_all(user.id).await?;
        self.context.clear(user.id).await?;
        warn!(user = %user.id, count, "ledger reset");
        Ok(Outcome::Cleared { count })
    }

    async fn ask_for_info(
        &self,
        user: &User,
        question: Option<String>,
        partial_data: Option<serde_json::Value>,
    ) -> Result<Outcome, ResolveError> {
        if let Some(partial) = partial_data {
            if partial.as_object().is_some_and(|map| !map.is_empty()) {
                let merged = self.context.merge(user.id, &partial).await?;
                debug!(user = %user.id, payload = %merged, "context merged");
            }
        }

        // The one action that must survive to the next turn: context is
        // deliberately not cleared.
        Ok(Outcome::ClarificationNeeded {
            question: non_empty(question),
        })
    }
}

/// A non-empty trimmed search term, or `None`.
fn required_term(term: Option<String>) -> Option<String> {
    term.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// A trimmed non-empty string, or `None`.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Map the classifier's "unknown"/empty location marker to absent.
fn normalize_location(location: Option<String>) -> Option<String> {
    non_empty(location).filter(|l| !l.eq_ignore_ascii_case("unknown"))
}

/// Build a partial update from whichever slots are present and non-empty.
///
/// A parseable date strictly in the future aborts the whole update
/// (`Err` carries the offending date); an unparseable date leaves the
/// field unset.
fn build_changes(update: UpdateSlots, now: DateTime<Utc>) -> Result<ExpenseChanges, DateTime<Utc>> {
    let mut changes = ExpenseChanges {
        amount: update.new_amount.map(|a| a.max(0.0)),
        item: non_empty(update.new_item),
        location: non_empty(update.new_location),
        expense_date: None,
    };

    if let Some(parsed) = update.new_date.as_deref().and_then(parse_timestamp) {
        if parsed > now {
            return Err(parsed);
        }
        changes.expense_date = Some(parsed);
    }

    Ok(changes)
}

/// Parse a classifier-supplied timestamp: RFC 3339 first, then a couple
/// of laxer shapes models actually emit.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(parsed.and_utc());
    }
    raw.parse::<NaiveDate>()
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}
