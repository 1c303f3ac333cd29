use crate::command::CommandStrategy;
use spendbot_config::Config;
use spendbot_core::{ContextStore, ExpenseStore, IntentClassifier, IntentResolver, UserStore};
use spendbot_storage::LedgerStorage;
use spendbot_telegram::ExpenseBot;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Connect to the ledger database with exponential backoff retry.
///
/// # Retry Behavior
/// - First retry: 1s
/// - Second retry: 2s
/// - Third and beyond: 3s (capped)
/// - Retries indefinitely until connection succeeds
pub(super) async fn connect_storage_with_retry(database_url: &str) -> anyhow::Result<LedgerStorage> {
    const MAX_DELAY: Duration = Duration::from_secs(3);
    const INITIAL_DELAY: Duration = Duration::from_secs(1);

    let mut attempt = 0u32;
    let mut delay = INITIAL_DELAY;

    loop {
        attempt += 1;
        match LedgerStorage::connect(database_url).await {
            Ok(storage) => {
                info!("Ledger storage connected successfully on attempt {attempt}");
                return Ok(storage);
            }
            Err(e) => {
                warn!(
                    "Failed to connect to database (attempt {attempt}): {e}. Retrying in {}s...",
                    delay.as_secs()
                );
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Input for Telegram bot command.
pub struct TelegramInput {
    /// Optional bot token (overrides config)
    pub token: Option<String>,
    /// Optional allowed chat IDs (overrides config)
    pub allow_from: Option<Vec<i64>>,
}

/// Strategy for running the Telegram bot.
pub struct TelegramStrategy;

impl CommandStrategy for TelegramStrategy {
    type Input = TelegramInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        if !config.telegram.enabled {
            anyhow::bail!("Telegram is not enabled in config. Set \"telegram.enabled\": true");
        }

        let token = if let Some(t) = input.token {
            t
        } else if !config.telegram.token.is_empty() {
            config.telegram.token.clone()
        } else {
            anyhow::bail!("Telegram bot token not configured. Set \"telegram.token\" in config");
        };

        let allow_from = input
            .allow_from
            .unwrap_or_else(|| config.telegram.allow_from.clone());

        info!("Starting Telegram bot...");

        let classifier: Arc<dyn IntentClassifier> = Arc::new(super::build_classifier(&config));

        let storage = connect_storage_with_retry(&config.database.url).await?;
        let expenses: Arc<dyn ExpenseStore> = Arc::new(storage.clone());
        let context: Arc<dyn ContextStore> = Arc::new(storage.clone());
        let users: Arc<dyn UserStore> = Arc::new(storage);

        let resolver = Arc::new(IntentResolver::new(expenses, Arc::clone(&context)));

        let bot = ExpenseBot::new(token, classifier, resolver, users, context, allow_from);

        info!("Telegram bot is running. Press Ctrl+C to stop.");
        bot.run().await?;

        Ok(())
    }
}
