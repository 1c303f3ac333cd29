use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Storage error: {0}")]
    Store(#[from] spendbot_core::StoreError),

    #[error("Resolver error: {0}")]
    Resolve(#[from] spendbot_core::ResolveError),

    #[error("Unauthorized access from chat_id: {0}")]
    Unauthorized(i64),

    #[error("Configuration error: {0}")]
    Config(String),
}
