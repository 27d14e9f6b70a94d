//! Realmkbot-Store: SurrealDB Backend for the Post Archive
//!
//! This crate provides the persistence layer for the channel archiver.
//! It handles all I/O with SurrealDB, keeping one table of archived posts
//! and one table of per-channel cursors.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: Data integrity, idempotent writes, and cursor monotonicity.
//!
//! ## Key Components
//!
//! - `PostArchive`: backend-agnostic archive trait
//! - `ArchiveHandle`: SurrealDB implementation (embedded file or in-memory)
//! - `PostRecord` / `ChannelCursor`: schema mapping for the two tables

mod archive;
mod error;
pub mod fakes;
mod handle;
mod schema;

pub use archive::PostArchive;
pub use error::ArchiveError;
pub use handle::ArchiveHandle;
pub use schema::{ChannelCursor, PostRecord};

/// Result type for realmkbot-store operations
pub type Result<T> = std::result::Result<T, ArchiveError>;
