//! End-to-end resolver behavior against in-memory store implementations.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use std::sync::Mutex;
use uuid::Uuid;

use spendbot_core::{
    ContextSnapshot, ContextStore, EntryFailure, Expense, ExpenseChanges, ExpenseStore, Intent,
    IntentResolver, NewExpense, Outcome, StoreError, User, merge_payloads,
};

#[derive(Default)]
struct MemExpenseStore {
    rows: Mutex<Vec<Expense>>,
}

impl MemExpenseStore {
    fn of_user(&self, user_id: Uuid) -> Vec<Expense> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl ExpenseStore for MemExpenseStore {
    async fn create(&self, expense: NewExpense) -> Result<Expense, StoreError> {
        let record = Expense {
            id: Uuid::now_v7(),
            user_id: expense.user_id,
            item: expense.item,
            amount: expense.amount,
            category: expense.category,
            location: expense.location,
            expense_date: expense.expense_date,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn latest_by_creation(&self, user_id: Uuid) -> Result<Option<Expense>, StoreError> {
        let mut rows = self.of_user(user_id);
        rows.sort_by_key(|e| e.created_at);
        Ok(rows.pop())
    }

    async fn latest_by_insertion(&self, user_id: Uuid) -> Result<Option<Expense>, StoreError> {
        let mut rows = self.of_user(user_id);
        rows.sort_by_key(|e| e.id);
        Ok(rows.pop())
    }

    async fn recent_window(&self, user_id: Uuid, limit: u64) -> Result<Vec<Expense>, StoreError> {
        let mut rows = self.of_user(user_id);
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(usize::try_from(limit).unwrap());
        Ok(rows)
    }

    async fn created_since(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
    ) -> Result<Vec<Expense>, StoreError> {
        let mut rows = self.of_user(user_id);
        rows.retain(|e| e.created_at >= from);
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_all(&self, user_id: Uuid) -> Result<Vec<Expense>, StoreError> {
        let mut rows = self.of_user(user_id);
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: ExpenseChanges,
    ) -> Result<Expense, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|e| e.id == id && e.user_id == user_id)
            .ok_or(StoreError::NotFound(id))?;
        if let Some(item) = changes.item {
            row.item = item;
        }
        if let Some(amount) = changes.amount {
            row.amount = amount;
        }
        if let Some(location) = changes.location {
            row.location = Some(location);
        }
        if let Some(date) = changes.expense_date {
            row.expense_date = date;
        }
        Ok(row.clone())
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        self.rows
            .lock()
            .unwrap()
            .retain(|e| !(e.id == id && e.user_id == user_id));
        Ok(())
    }

    async fn delete_many(&self, user_id: Uuid, ids: &[Uuid]) -> Result<u64, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|e| !(e.user_id == user_id && ids.contains(&e.id)));
        Ok((before - rows.len()) as u64)
    }

    async fn delete_all(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|e| e.user_id != user_id);
        Ok((before - rows.len()) as u64)
    }
}

/// In-memory context store with the same TTL and merge rules as the
/// database-backed one.
#[derive(Default)]
struct MemContextStore {
    slot: Mutex<Option<ContextSnapshot>>,
}

impl MemContextStore {
    fn payload(&self) -> Option<serde_json::Value> {
        self.slot.lock().unwrap().as_ref().map(|s| s.payload.clone())
    }

    fn put(&self, payload: serde_json::Value, updated_at: DateTime<Utc>) {
        *self.slot.lock().unwrap() = Some(ContextSnapshot {
            payload,
            updated_at,
        });
    }
}

#[async_trait]
impl ContextStore for MemContextStore {
    async fn get(&self, _user_id: Uuid) -> Result<Option<ContextSnapshot>, StoreError> {
        let mut slot = self.slot.lock().unwrap();
        match slot.as_ref() {
            Some(snapshot) if snapshot.is_fresh(Utc::now()) => Ok(Some(snapshot.clone())),
            Some(_) => {
                // Lazy expiry on read.
                *slot = None;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn merge(
        &self,
        user_id: Uuid,
        partial: &serde_json::Value,
    ) -> Result<serde_json::Value, StoreError> {
        let previous = self.get(user_id).await?.map(|s| s.payload);
        let merged = merge_payloads(previous, partial);
        self.put(merged.clone(), Utc::now());
        Ok(merged)
    }

    async fn clear(&self, _user_id: Uuid) -> Result<(), StoreError> {
        *self.slot.lock().unwrap() = None;
        Ok(())
    }
}

struct Fixture {
    expenses: Arc<MemExpenseStore>,
    context: Arc<MemContextStore>,
    resolver: IntentResolver,
    user: User,
}

fn fixture() -> Fixture {
    let expenses = Arc::new(MemExpenseStore::default());
    let context = Arc::new(MemContextStore::default());
    let resolver = IntentResolver::new(expenses.clone(), context.clone());
    let user = User {
        id: Uuid::now_v7(),
        phone_number: "+15550001111".to_string(),
        telegram_chat_id: None,
        billing_day: 1,
        created_at: Utc::now(),
    };
    Fixture {
        expenses,
        context,
        resolver,
        user,
    }
}

fn add_intent(raw: serde_json::Value) -> Intent {
    serde_json::from_value(raw).unwrap()
}

async fn seed(fx: &Fixture, item: &str, amount: f64) -> Expense {
    fx.expenses
        .create(NewExpense {
            user_id: fx.user.id,
            item: item.to_string(),
            amount,
            category: "General".to_string(),
            location: None,
            expense_date: Utc::now(),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn add_expense_persists_valid_entries_with_defaults() {
    let fx = fixture();
    let intent = add_intent(json!({
        "action": "add_expense",
        "expenses": [{"item": "coffee", "amount": 15}]
    }));

    let outcome = fx.resolver.resolve(&fx.user, intent).await.unwrap();
    let Outcome::Saved {
        count,
        records,
        failures,
    } = outcome
    else {
        panic!("expected Saved");
    };

    assert_eq!(count, 1);
    assert!(failures.is_empty());
    assert_eq!(records[0].item, "coffee");
    assert_eq!(records[0].amount, 15.0);
    assert_eq!(records[0].category, "General");
    assert_eq!(records[0].location, None);
    assert_eq!(fx.expenses.len(), 1);
}

#[tokio::test]
async fn add_expense_skips_short_items_and_future_dates() {
    let fx = fixture();
    let future = Utc::now() + Duration::days(3);
    let intent = add_intent(json!({
        "action": "add_expense",
        "expenses": [
            {"item": "x", "amount": 5},
            {"item": "rocket", "amount": 9000, "date": future.to_rfc3339()},
            {"item": "pizza", "amount": 50, "location": "unknown"}
        ]
    }));

    let outcome = fx.resolver.resolve(&fx.user, intent).await.unwrap();
    let Outcome::Saved {
        count,
        records,
        failures,
    } = outcome
    else {
        panic!("expected Saved");
    };

    assert_eq!(count, 1);
    assert_eq!(records[0].item, "pizza");
    assert_eq!(records[0].location, None);
    assert_eq!(failures.len(), 2);
    assert!(matches!(
        &failures[0],
        EntryFailure::ItemTooShort { item } if item == "x"
    ));
    match &failures[1] {
        EntryFailure::FutureDate { item, date } => {
            assert_eq!(item, "rocket");
            assert_eq!(date.date_naive(), future.date_naive());
        }
        other => panic!("expected FutureDate, got {other:?}"),
    }
    assert_eq!(fx.expenses.len(), 1);
}

#[tokio::test]
async fn add_expense_with_all_entries_failing_saves_nothing_and_keeps_context() {
    let fx = fixture();
    fx.context
        .merge(fx.user.id, &json!({"item": "jeans"}))
        .await
        .unwrap();

    let intent = add_intent(json!({
        "action": "add_expense",
        "expenses": [{"item": "a"}]
    }));
    let outcome = fx.resolver.resolve(&fx.user, intent).await.unwrap();

    let Outcome::Saved { count, .. } = outcome else {
        panic!("expected Saved");
    };
    assert_eq!(count, 0);
    assert_eq!(fx.expenses.len(), 0);
    // No success, so the pending clarification survives.
    assert!(fx.context.payload().is_some());
}

#[tokio::test]
async fn add_expense_success_clears_context() {
    let fx = fixture();
    fx.context
        .merge(fx.user.id, &json!({"item": "jeans"}))
        .await
        .unwrap();

    let intent = add_intent(json!({
        "action": "add_expense",
        "expenses": [{"item": "jeans", "amount": 300}]
    }));
    fx.resolver.resolve(&fx.user, intent).await.unwrap();
    assert!(fx.context.payload().is_none());
}

#[tokio::test]
async fn list_expenses_reports_cycle_and_totals() {
    let fx = fixture();
    seed(&fx, "coffee", 15.0).await;
    seed(&fx, "pizza", 50.0).await;

    let outcome = fx
        .resolver
        .resolve(&fx.user, Intent::ListExpenses)
        .await
        .unwrap();
    let Outcome::Listing(report) = outcome else {
        panic!("expected Listing");
    };

    assert_eq!(report.total, 65.0);
    assert_eq!(report.cycle_total, 65.0);
    assert_eq!(report.groups.len(), 1);
    let entries = &report.groups[0].months[0].days[0].entries;
    assert_eq!(entries.len(), 2);
    // Most recent creation first.
    assert_eq!(entries[0].item, "pizza");
    assert_eq!(entries[1].item, "coffee");
}

#[tokio::test]
async fn update_expense_matches_most_recent_and_applies_slots() {
    let fx = fixture();
    seed(&fx, "Jeans (old)", 100.0).await;
    let newer = seed(&fx, "jeans'", 200.0).await;

    let intent = add_intent(json!({
        "action": "update_expense",
        "search_term": "JEANS",
        "new_amount": 300,
        "new_location": "Zara"
    }));
    let outcome = fx.resolver.resolve(&fx.user, intent).await.unwrap();

    let Outcome::Updated { record } = outcome else {
        panic!("expected Updated");
    };
    assert_eq!(record.id, newer.id);
    assert_eq!(record.amount, 300.0);
    assert_eq!(record.location.as_deref(), Some("Zara"));
}

#[tokio::test]
async fn update_expense_miss_returns_not_found_without_mutation() {
    let fx = fixture();
    let seeded = seed(&fx, "coffee", 15.0).await;

    let intent = add_intent(json!({
        "action": "update_expense",
        "search_term": "jeans",
        "new_amount": 300
    }));
    let outcome = fx.resolver.resolve(&fx.user, intent).await.unwrap();

    let Outcome::NotFound { term } = outcome else {
        panic!("expected NotFound");
    };
    assert_eq!(term, "jeans");
    assert_eq!(fx.expenses.of_user(fx.user.id), vec![seeded]);
}

#[tokio::test]
async fn update_expense_future_date_aborts_whole_update() {
    let fx = fixture();
    let seeded = seed(&fx, "coffee", 15.0).await;
    let future = Utc::now() + Duration::days(1);

    let intent = add_intent(json!({
        "action": "update_expense",
        "search_term": "coffee",
        "new_amount": 99,
        "new_date": future.to_rfc3339()
    }));
    let outcome = fx.resolver.resolve(&fx.user, intent).await.unwrap();

    assert!(matches!(outcome, Outcome::FutureDate { .. }));
    // Not partially applied.
    assert_eq!(fx.expenses.of_user(fx.user.id), vec![seeded]);
}

#[tokio::test]
async fn update_expense_with_nothing_recognized_is_no_change() {
    let fx = fixture();
    seed(&fx, "coffee", 15.0).await;

    let intent = add_intent(json!({
        "action": "update_expense",
        "search_term": "coffee",
        "new_item": "   ",
        "new_date": "sometime"
    }));
    let outcome = fx.resolver.resolve(&fx.user, intent).await.unwrap();
    assert!(matches!(outcome, Outcome::NoChange));
}

#[tokio::test]
async fn update_expense_clears_context_even_on_miss() {
    let fx = fixture();
    fx.context
        .merge(fx.user.id, &json!({"item": "jeans"}))
        .await
        .unwrap();

    let intent = add_intent(json!({
        "action": "update_expense",
        "search_term": "nothing-like-this",
        "new_amount": 1
    }));
    fx.resolver.resolve(&fx.user, intent).await.unwrap();
    assert!(fx.context.payload().is_none());
}

#[tokio::test]
async fn update_last_targets_insertion_order() {
    let fx = fixture();
    seed(&fx, "first", 1.0).await;
    let last = seed(&fx, "second", 2.0).await;

    let intent = add_intent(json!({
        "action": "update_last_expense",
        "new_amount": 100
    }));
    let outcome = fx.resolver.resolve(&fx.user, intent).await.unwrap();

    let Outcome::Updated { record } = outcome else {
        panic!("expected Updated");
    };
    assert_eq!(record.id, last.id);
    assert_eq!(record.amount, 100.0);
}

#[tokio::test]
async fn update_last_on_empty_ledger_is_no_change() {
    let fx = fixture();
    let intent = add_intent(json!({
        "action": "update_last_expense",
        "new_amount": 100
    }));
    let outcome = fx.resolver.resolve(&fx.user, intent).await.unwrap();
    assert!(matches!(outcome, Outcome::NoChange));
}

#[tokio::test]
async fn delete_last_on_empty_ledger_is_no_change() {
    let fx = fixture();
    let outcome = fx
        .resolver
        .resolve(&fx.user, Intent::DeleteLastExpense)
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::NoChange));
    assert_eq!(fx.expenses.len(), 0);
}

#[tokio::test]
async fn delete_last_removes_most_recently_inserted() {
    let fx = fixture();
    let kept = seed(&fx, "keep me", 1.0).await;
    let doomed = seed(&fx, "delete me", 2.0).await;

    let outcome = fx
        .resolver
        .resolve(&fx.user, Intent::DeleteLastExpense)
        .await
        .unwrap();

    let Outcome::Deleted { record } = outcome else {
        panic!("expected Deleted");
    };
    assert_eq!(record.id, doomed.id);
    assert_eq!(fx.expenses.of_user(fx.user.id), vec![kept]);
}

#[tokio::test]
async fn delete_specific_single_removes_most_recent_match() {
    let fx = fixture();
    seed(&fx, "jeans old", 1.0).await;
    let newest = seed(&fx, "jeans new", 2.0).await;
    seed(&fx, "coffee", 3.0).await;

    let intent = add_intent(json!({
        "action": "delete_specific_expense",
        "search_term": "jeans"
    }));
    let outcome = fx.resolver.resolve(&fx.user, intent).await.unwrap();

    let Outcome::Deleted { record } = outcome else {
        panic!("expected Deleted");
    };
    assert_eq!(record.id, newest.id);
    assert_eq!(fx.expenses.len(), 2);
}

#[tokio::test]
async fn delete_specific_all_removes_every_match() {
    let fx = fixture();
    seed(&fx, "jeans a", 1.0).await;
    seed(&fx, "jeans b", 2.0).await;
    seed(&fx, "Jeans c", 3.0).await;
    seed(&fx, "coffee", 4.0).await;

    let intent = add_intent(json!({
        "action": "delete_specific_expense",
        "search_term": "jeans",
        "delete_all": true
    }));
    let outcome = fx.resolver.resolve(&fx.user, intent).await.unwrap();

    let Outcome::DeletedMany { count } = outcome else {
        panic!("expected DeletedMany");
    };
    assert_eq!(count, 3);
    assert_eq!(fx.expenses.len(), 1);
}

#[tokio::test]
async fn delete_specific_miss_is_not_found() {
    let fx = fixture();
    seed(&fx, "coffee", 1.0).await;

    let intent = add_intent(json!({
        "action": "delete_specific_expense",
        "search_term": "jeans"
    }));
    let outcome = fx.resolver.resolve(&fx.user, intent).await.unwrap();
    assert!(matches!(outcome, Outcome::NotFound { .. }));
    assert_eq!(fx.expenses.len(), 1);
}

#[tokio::test]
async fn reset_data_wipes_ledger_and_context() {
    let fx = fixture();
    seed(&fx, "coffee", 1.0).await;
    seed(&fx, "pizza", 2.0).await;
    fx.context
        .merge(fx.user.id, &json!({"item": "jeans"}))
        .await
        .unwrap();

    let outcome = fx
        .resolver
        .resolve(&fx.user, Intent::ResetData)
        .await
        .unwrap();

    let Outcome::Cleared { count } = outcome else {
        panic!("expected Cleared");
    };
    assert_eq!(count, 2);
    assert_eq!(fx.expenses.len(), 0);
    assert!(fx.context.payload().is_none());
}

#[tokio::test]
async fn ask_for_info_merges_partial_slots_and_keeps_context() {
    let fx = fixture();
    fx.context
        .merge(fx.user.id, &json!({"item": "jeans"}))
        .await
        .unwrap();

    let intent = add_intent(json!({
        "action": "ask_for_info",
        "question": "How much did the jeans cost?",
        "partial_data": {"amount": 300}
    }));
    let outcome = fx.resolver.resolve(&fx.user, intent).await.unwrap();

    let Outcome::ClarificationNeeded { question } = outcome else {
        panic!("expected ClarificationNeeded");
    };
    assert_eq!(question.as_deref(), Some("How much did the jeans cost?"));
    assert_eq!(
        fx.context.payload(),
        Some(json!({"item": "jeans", "amount": 300}))
    );
}

#[tokio::test]
async fn unknown_intent_touches_nothing() {
    let fx = fixture();
    seed(&fx, "coffee", 1.0).await;
    fx.context
        .merge(fx.user.id, &json!({"item": "jeans"}))
        .await
        .unwrap();

    let outcome = fx.resolver.resolve(&fx.user, Intent::Unknown).await.unwrap();

    assert!(matches!(outcome, Outcome::Unrecognized));
    assert_eq!(fx.expenses.len(), 1);
    assert!(fx.context.payload().is_some());
}

#[tokio::test]
async fn expired_context_is_absent_and_lazily_deleted() {
    let fx = fixture();
    fx.context.put(
        json!({"item": "jeans"}),
        Utc::now() - Duration::minutes(6),
    );
    assert!(fx.context.get(fx.user.id).await.unwrap().is_none());
    // The expired row was removed on read.
    assert!(fx.context.slot.lock().unwrap().is_none());

    fx.context.put(
        json!({"item": "jeans"}),
        Utc::now() - Duration::minutes(4),
    );
    assert!(fx.context.get(fx.user.id).await.unwrap().is_some());
}

#[tokio::test]
async fn ledger_operations_stay_scoped_to_their_user() {
    let fx = fixture();
    let stranger = Uuid::now_v7();
    fx.expenses
        .create(NewExpense {
            user_id: stranger,
            item: "jeans".to_string(),
            amount: 10.0,
            category: "General".to_string(),
            location: None,
            expense_date: Utc::now(),
        })
        .await
        .unwrap();

    let intent = add_intent(json!({
        "action": "delete_specific_expense",
        "search_term": "jeans",
        "delete_all": true
    }));
    let outcome = fx.resolver.resolve(&fx.user, intent).await.unwrap();

    // The other user's record is invisible to this user's turn.
    assert!(matches!(outcome, Outcome::NotFound { .. }));
    assert_eq!(fx.expenses.len(), 1);
}
