//! Subcommand implementations.

pub mod args;
pub mod balance;
pub mod config;
pub mod export;
pub mod thumbnail;
