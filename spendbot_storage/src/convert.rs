//! Conversions between entity models and the core domain types.

use spendbot_core::{Expense, User};
use spendbot_entities::{expenses, users};

pub(crate) fn expense_from_model(model: expenses::Model) -> Expense {
    Expense {
        id: model.id,
        user_id: model.user_id,
        item: model.item,
        amount: model.amount,
        category: model.category,
        location: model.location,
        expense_date: model.expense_date.and_utc(),
        created_at: model.created_at.and_utc(),
    }
}

pub(crate) fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        phone_number: model.phone_number,
        telegram_chat_id: model.telegram_chat_id,
        billing_day: u32::try_from(model.billing_day).unwrap_or(1).clamp(1, 31),
        created_at: model.created_at.and_utc(),
    }
}
