use crate::{Command, Result};
use spendbot_core::{ContextStore, IntentClassifier, IntentResolver, UserStore};
use std::{sync::Arc, time::Duration};
use teloxide::prelude::*;
use tokio::time::sleep;
use tracing::{info, warn};

/// The Telegram expense bot: one resolver turn per incoming message.
#[derive(Clone)]
pub struct ExpenseBot {
    /// Teloxide bot instance
    pub bot: Bot,
    pub(crate) classifier: Arc<dyn IntentClassifier>,
    pub(crate) resolver: Arc<IntentResolver>,
    pub(crate) users: Arc<dyn UserStore>,
    pub(crate) context: Arc<dyn ContextStore>,
    /// Allowed chat IDs; empty means everyone
    allowed_chats: Vec<i64>,
}

impl ExpenseBot {
    #[must_use]
    pub fn new(
        token: String,
        classifier: Arc<dyn IntentClassifier>,
        resolver: Arc<IntentResolver>,
        users: Arc<dyn UserStore>,
        context: Arc<dyn ContextStore>,
        allowed_chats: Vec<i64>,
    ) -> Self {
        Self {
            bot: Bot::new(token),
            classifier,
            resolver,
            users,
            context,
            allowed_chats,
        }
    }

    /// Check if a chat is allowed
    #[must_use]
    pub fn is_allowed(&self, chat_id: i64) -> bool {
        self.allowed_chats.is_empty() || self.allowed_chats.contains(&chat_id)
    }

    /// Test connection to Telegram API with exponential backoff retry.
    /// Starts at 2s, increases by 2s each attempt, max 10s delay.
    /// Retries indefinitely until connection succeeds.
    async fn test_connection(&self) -> Result<()> {
        const INITIAL_DELAY_SECS: u64 = 2;
        const MAX_DELAY_SECS: u64 = 10;

        let mut attempt = 1u64;
        loop {
            match self.bot.get_me().await {
                Ok(bot_user) => {
                    info!(
                        "Connected to Telegram API: @{} (id: {})",
                        bot_user
                            .user
                            .username
                            .unwrap_or_else(|| "no username".to_string()),
                        bot_user.user.id
                    );
                    return Ok(());
                }
                Err(e) => {
                    let delay_secs = (INITIAL_DELAY_SECS * attempt).min(MAX_DELAY_SECS);

                    warn!("Connection attempt {attempt} failed: {e}. Retrying in {delay_secs}s...");

                    // Only show detailed help on first failure
                    if attempt == 1 {
                        warn!("This may be due to:");
                        warn!("  - Network connectivity issues");
                        warn!("  - Firewall blocking api.telegram.org");
                        warn!("  - Invalid bot token");
                        warn!("  - Telegram API being temporarily unavailable");
                    }

                    sleep(Duration::from_secs(delay_secs)).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Run the bot
    pub async fn run(self) -> Result<()> {
        use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
        use teloxide::dptree;
        use teloxide::types::Update;

        // Test connection with exponential backoff retry before starting dispatcher
        self.test_connection().await?;

        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!("Failed to publish command list: {e}");
        }

        let bot = self.bot.clone();

        let schema = dptree::entry().branch(Update::filter_message().endpoint({
            let bot_clone = self.clone();
            move |_bot: Bot, msg: teloxide::types::Message| {
                let bot_clone = bot_clone.clone();
                async move { crate::handler::handle_message(bot_clone, msg).await }
            }
        }));

        Dispatcher::builder(bot, schema)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}
