use crate::command::CommandStrategy;
use spendbot_config::Config;
use spendbot_core::{ContextStore, ExpenseStore, IntentClassifier, IntentResolver, UserStore};
use std::sync::Arc;
use tracing::info;

/// Input for the one-shot prompt command.
pub struct PromptInput {
    /// The message to classify and resolve
    pub message: String,
    /// Phone number identifying the ledger owner
    pub phone: String,
}

/// Strategy for resolving a single message from the command line.
///
/// Runs one full turn (classify, resolve) against the configured database
/// and prints the structured outcome as JSON. Useful for smoke-testing
/// the pipeline without a Telegram round trip.
pub struct PromptStrategy;

impl CommandStrategy for PromptStrategy {
    type Input = PromptInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        info!("Loaded config from ~/spendbot/config.json");

        let classifier: Arc<dyn IntentClassifier> = Arc::new(super::build_classifier(&config));

        let storage = super::telegram::connect_storage_with_retry(&config.database.url).await?;
        let expenses: Arc<dyn ExpenseStore> = Arc::new(storage.clone());
        let context: Arc<dyn ContextStore> = Arc::new(storage.clone());
        let users: Arc<dyn UserStore> = Arc::new(storage);

        let resolver = IntentResolver::new(expenses, Arc::clone(&context));

        let user = users.get_or_create(&input.phone).await?;
        let snapshot = context.get(user.id).await?;
        let intent = classifier
            .classify(
                input.message.trim(),
                snapshot.as_ref().map(|c| &c.payload),
            )
            .await;

        let outcome = resolver.resolve(&user, intent).await?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);

        Ok(())
    }
}
