use crate::format::format_outcome;
use crate::{Command, Error, ExpenseBot, Result};
use spendbot_core::{Outcome, User};
use teloxide::prelude::*;
use teloxide::types::{
    ButtonRequest, Contact, KeyboardButton, KeyboardMarkup, KeyboardRemove, ParseMode,
};
use tracing::{info, warn};

fn contact_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new([[
        KeyboardButton::new("📱 Share number to verify").request(ButtonRequest::Contact)
    ]])
    .resize_keyboard()
    .one_time_keyboard()
}

/// Handle bot commands
pub async fn handle_command(bot: &ExpenseBot, msg: &Message, cmd: Command) -> Result<()> {
    let username = msg
        .from
        .as_ref()
        .and_then(|u| u.username.as_deref())
        .unwrap_or("unknown");

    match cmd {
        Command::Start => {
            info!("[@{username}] Command: /start");
            bot.bot
                .send_message(msg.chat.id, Command::welcome_text())
                .parse_mode(ParseMode::Html)
                .reply_markup(contact_keyboard())
                .await?;
        }
        Command::Help => {
            info!("[@{username}] Command: /help");
            bot.bot
                .send_message(msg.chat.id, Command::help_text())
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Command::Billing { day } => {
            info!("[@{username}] Command: /billing {day:?}");
            let Some(day) = day else {
                bot.bot
                    .send_message(msg.chat.id, "Usage: /billing <day>, where day is 1-31.")
                    .await?;
                return Ok(());
            };
            let Some(user) = bot.users.find_by_chat(&msg.chat.id.0.to_string()).await? else {
                bot.bot
                    .send_message(
                        msg.chat.id,
                        "⚠️ I don't recognize you yet. Tap the button below.",
                    )
                    .reply_markup(contact_keyboard())
                    .await?;
                return Ok(());
            };
            let updated = bot.users.set_billing_day(user.id, day).await?;
            bot.bot
                .send_message(
                    msg.chat.id,
                    format!(
                        "✅ Billing cycle now starts on day {} of the month.",
                        updated.billing_day
                    ),
                )
                .await?;
        }
    }

    Ok(())
}

/// Secure registration: the shared contact must belong to the sender.
async fn handle_contact(bot: &ExpenseBot, msg: &Message, contact: &Contact) -> Result<()> {
    let sender = msg.from.as_ref().map(|u| u.id);
    if contact.user_id.is_none() || contact.user_id != sender {
        bot.bot
            .send_message(
                msg.chat.id,
                "❌ Security check failed: only your own number works.",
            )
            .await?;
        return Ok(());
    }

    let mut phone = contact.phone_number.clone();
    if !phone.starts_with('+') {
        phone.insert(0, '+');
    }

    let user = bot
        .users
        .link_chat(&phone, &msg.chat.id.0.to_string())
        .await?;
    info!(user = %user.id, "registered telegram chat");

    bot.bot
        .send_message(
            msg.chat.id,
            format!(
                "✅ You're registered!\nVerified number: {phone}\n\
                 The keyboard is gone, you can start typing."
            ),
        )
        .reply_markup(KeyboardRemove::new())
        .await?;

    Ok(())
}

async fn run_turn(bot: &ExpenseBot, user: &User, text: &str) -> Result<Outcome> {
    let context = bot.context.get(user.id).await?;
    let intent = bot
        .classifier
        .classify(text, context.as_ref().map(|c| &c.payload))
        .await;
    Ok(bot.resolver.resolve(user, intent).await?)
}

/// Handle any incoming message (contact shares, commands, regular text)
pub async fn handle_message(bot: ExpenseBot, msg: Message) -> Result<()> {
    let chat_id = msg.chat.id.0;
    if !bot.is_allowed(chat_id) {
        return Err(Error::Unauthorized(chat_id));
    }

    if let Some(contact) = msg.contact() {
        return handle_contact(&bot, &msg, contact).await;
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };
    if let Some(cmd) = Command::parse_from_text(text) {
        return handle_command(&bot, &msg, cmd).await;
    }

    let username = msg
        .from
        .as_ref()
        .and_then(|u| u.username.as_deref())
        .unwrap_or("unknown");
    info!("[@{username}] Message: {text}");

    let Some(user) = bot.users.find_by_chat(&chat_id.to_string()).await? else {
        bot.bot
            .send_message(
                msg.chat.id,
                "⚠️ I don't recognize you yet. Tap the button below.",
            )
            .reply_markup(contact_keyboard())
            .await?;
        return Ok(());
    };

    // Placeholder first; the final reply edits it in place.
    let placeholder = bot.bot.send_message(msg.chat.id, "🤔 Analyzing...").await?;

    let reply = match run_turn(&bot, &user, text.trim()).await {
        Ok(outcome) => format_outcome(&outcome),
        Err(e) => {
            warn!("[@{username}] turn failed: {e}");
            "⚠️ Something went wrong. Please try again.".to_string()
        }
    };

    bot.bot
        .edit_message_text(msg.chat.id, placeholder.id, reply)
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}
