//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy with its own input type, dispatched
//! statically at compile time.

use spendbot_config::Config;
use spendbot_providers::GroqClassifier;

mod init;
mod prompt;
mod telegram;
mod version;

pub use init::InitStrategy;
pub use prompt::{PromptInput, PromptStrategy};
pub use telegram::{TelegramInput, TelegramStrategy};
pub use version::VersionStrategy;

/// Build the classifier from config, honoring the optional endpoint
/// override.
fn build_classifier(config: &Config) -> GroqClassifier {
    let mut classifier = GroqClassifier::new(config.classifier.api_key.clone())
        .with_model(config.classifier.model.clone());
    if let Some(base_url) = &config.classifier.base_url {
        classifier = classifier.with_base_url(base_url.clone());
    }
    classifier
}

/// Core trait defining the contract for all command strategies.
///
/// Each strategy defines its own input type via an associated type; all
/// calls are monomorphized, no trait objects involved.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}
