//! Structured intents produced by the external classifier.
//!
//! The action set is closed: anything the classifier emits outside it
//! deserializes to [`Intent::Unknown`] via `#[serde(other)]`, which is
//! also the fail-closed value on parse errors upstream.

use serde::Deserialize;

/// One candidate expense entry inside an `add_expense` intent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseEntry {
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Effective purchase timestamp as an ISO string, when the classifier
    /// resolved one from the text ("yesterday at 5", ...).
    #[serde(default)]
    pub date: Option<String>,
}

/// The update slots shared by `update_expense` and `update_last_expense`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSlots {
    #[serde(default)]
    pub new_amount: Option<f64>,
    #[serde(default)]
    pub new_item: Option<String>,
    #[serde(default)]
    pub new_location: Option<String>,
    #[serde(default)]
    pub new_date: Option<String>,
}

impl UpdateSlots {
    /// True when the classifier filled none of the update slots.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.new_amount.is_none()
            && self.new_item.is_none()
            && self.new_location.is_none()
            && self.new_date.is_none()
    }
}

/// A structured intent, consumed once per turn by the resolver.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Intent {
    AddExpense {
        #[serde(default)]
        expenses: Vec<ExpenseEntry>,
    },
    ListExpenses,
    UpdateExpense {
        #[serde(default)]
        search_term: Option<String>,
        #[serde(flatten)]
        update: UpdateSlots,
    },
    UpdateLastExpense {
        #[serde(flatten)]
        update: UpdateSlots,
    },
    DeleteLastExpense,
    DeleteSpecificExpense {
        #[serde(default)]
        search_term: Option<String>,
        #[serde(default)]
        delete_all: bool,
    },
    ResetData,
    AskForInfo {
        #[serde(default)]
        question: Option<String>,
        #[serde(default)]
        partial_data: Option<serde_json::Value>,
    },
    #[serde(other)]
    Unknown,
}

impl Intent {
    /// Action tag, for logging.
    #[must_use]
    pub const fn action_name(&self) -> &'static str {
        match self {
            Self::AddExpense { .. } => "add_expense",
            Self::ListExpenses => "list_expenses",
            Self::UpdateExpense { .. } => "update_expense",
            Self::UpdateLastExpense { .. } => "update_last_expense",
            Self::DeleteLastExpense => "delete_last_expense",
            Self::DeleteSpecificExpense { .. } => "delete_specific_expense",
            Self::ResetData => "reset_data",
            Self::AskForInfo { .. } => "ask_for_info",
            Self::Unknown => "unknown",
        }
    }
}
