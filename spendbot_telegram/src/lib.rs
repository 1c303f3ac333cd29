//! Telegram front end: registration via contact sharing, message
//! dispatch, and HTML rendering of resolver outcomes.

#![warn(
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

mod bot;
mod command;
mod error;
mod format;
mod handler;

pub use bot::ExpenseBot;
pub use command::Command;
pub use error::{Error, Result};
pub use format::format_outcome;
