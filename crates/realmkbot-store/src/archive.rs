//! Archive trait definition
//!
//! `PostArchive` is the backend-agnostic contract the archiver runs against.
//! The SurrealDB implementation lives in `handle`; an in-memory fake for
//! testing lives in `fakes`.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::schema::{ChannelCursor, PostRecord};
use crate::Result;

/// Persistent store of archived channel posts.
///
/// Guarantees:
/// - `(chat, message_id)` is unique; the first archived write wins.
/// - A channel's `last_index` never decreases.
/// - A channel's `update_offset` never decreases.
#[async_trait]
pub trait PostArchive: Send + Sync {
    /// Archive a post. Returns `true` if the post was written, `false` if
    /// that `(chat, message_id)` was already present. Advances the channel's
    /// `last_index` high-water mark either way.
    async fn archive_post(&self, record: PostRecord) -> Result<bool>;

    /// Fetch a single archived post.
    async fn get_post(&self, chat: &str, message_id: u32) -> Result<Option<PostRecord>>;

    /// List archived posts for a channel, newest first.
    async fn list_posts(&self, chat: &str, limit: usize) -> Result<Vec<PostRecord>>;

    /// Highest archived message id for a channel (0 if nothing archived).
    async fn last_index(&self, chat: &str) -> Result<u32>;

    /// All archived message ids for a channel.
    async fn archived_ids(&self, chat: &str) -> Result<BTreeSet<u32>>;

    /// Number of archived posts for a channel.
    async fn post_count(&self, chat: &str) -> Result<u64>;

    /// Load a channel's cursor, or a fresh zeroed one if none exists yet.
    async fn load_cursor(&self, chat: &str) -> Result<ChannelCursor>;

    /// Persist the getUpdates offset for a channel. Offsets only move
    /// forward; a smaller value than the stored one is ignored.
    async fn save_offset(&self, chat: &str, update_offset: u64) -> Result<()>;
}
