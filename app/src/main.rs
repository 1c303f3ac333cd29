#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;

use clap::{Parser, Subcommand};
use command::{
    CommandStrategy, InitStrategy, PromptInput, PromptStrategy, TelegramInput, TelegramStrategy,
    VersionStrategy,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "spendbot")]
#[command(about = "Conversational expense tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Init,
    /// Resolve a single message against the ledger and print the outcome
    Prompt {
        /// The message to process
        message: String,

        /// Phone number identifying the ledger owner
        #[arg(short, long, default_value = "+10000000000")]
        phone: String,
    },
    /// Run the Telegram bot
    Telegram {
        /// Bot token (overrides config)
        #[arg(short, long)]
        token: Option<String>,

        /// Allowed chat IDs, comma separated (overrides config)
        #[arg(long, value_delimiter = ',')]
        allow_from: Option<Vec<i64>>,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Prompt { message, phone } => {
            PromptStrategy.execute(PromptInput { message, phone }).await
        }
        Commands::Telegram { token, allow_from } => {
            TelegramStrategy
                .execute(TelegramInput { token, allow_from })
                .await
        }
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
