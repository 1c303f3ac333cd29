//! Conversation-context rules: freshness window and slot merging.
//!
//! The durable key-value record itself lives behind
//! [`crate::ContextStore`]; the validity and merge semantics are pure
//! functions here so they can be tested without a database.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// How long a stored context stays valid. Expense logging is a rapid-fire
/// activity; letting stale partial intents linger risks silently merging
/// unrelated future messages into an old, abandoned correction.
pub const CONTEXT_TTL: Duration = Duration::from_secs(5 * 60);

/// A conversation context as read from the store: the partial-intent slot
/// payload plus the instant it was last written.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSnapshot {
    pub payload: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl ContextSnapshot {
    /// Whether this context is still within the validity window at `now`.
    ///
    /// A snapshot with an `updated_at` in the future counts as fresh; the
    /// window only ever shrinks with elapsed time.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.updated_at);
        age.to_std().map_or(true, |age| age < CONTEXT_TTL)
    }
}

/// Shallow union of a previous payload (if any) and new partial slots,
/// new values winning on key conflict.
///
/// Non-object payloads on either side are treated as empty maps, so the
/// result is always a JSON object.
#[must_use]
pub fn merge_payloads(
    previous: Option<serde_json::Value>,
    partial: &serde_json::Value,
) -> serde_json::Value {
    let mut merged = match previous {
        Some(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    if let serde_json::Value::Object(new_slots) = partial {
        for (key, value) in new_slots {
            merged.insert(key.clone(), value.clone());
        }
    }
    serde_json::Value::Object(merged)
}
