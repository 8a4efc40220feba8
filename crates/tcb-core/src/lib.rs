//! Core engine for the TrustCoin community bot.
//!
//! This crate is framework-agnostic. Telegram and HTTP live in adapter crates
//! and talk to the engine through ports (traits).

pub mod activity;
pub mod config;
pub mod content;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod health;
pub mod instance;
pub mod keywords;
pub mod logging;
pub mod membership;
pub mod menu;
pub mod messaging;
pub mod ports;
pub mod router;
pub mod scheduler;
pub mod security;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
