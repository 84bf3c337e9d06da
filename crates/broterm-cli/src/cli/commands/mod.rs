//! CLI command handlers.

pub mod config;
