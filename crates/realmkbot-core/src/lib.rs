//! Realmkbot Core Library
//!
//! Orchestration layer for the channel archiver: configuration, the ingest
//! loop, gap accounting, and tracing setup. Persistence and the Telegram
//! transport live in their own crates and are re-exported here for
//! programmatic access.

mod archiver;
mod config;
mod error;
mod index;
pub mod telemetry;

pub use archiver::{Archiver, BatchReport, RunReport};
pub use config::Config;
pub use error::ArchiverError;
pub use index::{missing_ids, MissingIds};

pub use realmkbot_store::{
    ArchiveError, ArchiveHandle, ChannelCursor, PostArchive, PostRecord,
};

pub use realmkbot_telegram::{
    BotClient, Chat, Message, TelegramApi, TelegramError, Update, User,
};

pub use telemetry::init_tracing;

/// Result type for realmkbot-core operations
pub type Result<T> = std::result::Result<T, ArchiverError>;

/// Realmkbot version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
