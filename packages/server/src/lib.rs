// JobRadar - Alert Core
//
// This crate detects alert-worthy job postings and dispatches the
// resulting notifications over email, Slack, and Discord.
// Architecture follows domain-driven design; background work runs on a
// cron scheduler with a persistent task ledger.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
