//! sea-orm entity definitions for the ledger schema.
//!
//! Schema management (migrations) lives outside this workspace; these
//! definitions mirror the deployed tables.

pub mod conversation_states;
pub mod expenses;
pub mod users;
