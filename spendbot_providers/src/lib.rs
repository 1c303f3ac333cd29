//! External intent classification.
//!
//! The only implementation speaks the OpenAI-compatible chat-completions
//! protocol (Groq hosts the default model). Everything here fails closed:
//! a classifier problem becomes [`spendbot_core::Intent::Unknown`], never
//! an error visible to the resolver.

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

mod classifier;
mod retry;

pub use classifier::GroqClassifier;
pub use retry::retry_with_backoff;
