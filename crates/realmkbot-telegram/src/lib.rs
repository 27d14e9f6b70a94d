//! Realmkbot-Telegram: Bot API Adapter
//!
//! Telegram lives behind the `TelegramApi` port so the archiver core stays
//! transport-agnostic. This crate provides:
//!
//! - Wire models for the Bot API subset the archiver consumes
//! - `BotClient`: a long-polling `reqwest` implementation of the port
//! - `fakes::ScriptedApi`: a scripted in-memory implementation for tests

mod api;
mod client;
mod error;
pub mod fakes;
mod types;

pub use api::TelegramApi;
pub use client::BotClient;
pub use error::TelegramError;
pub use types::{ApiEnvelope, Chat, Message, ResponseParameters, Update, User};

/// Result type for realmkbot-telegram operations
pub type Result<T> = std::result::Result<T, TelegramError>;
