//! Schema definitions for the archive's SurrealDB tables
//!
//! Tables:
//! - posts: archived channel posts, unique per (chat, message_id)
//! - cursors: per-channel progress (high-water mark + update offset)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Module for serializing chrono DateTime to SurrealDB datetime format
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// One archived channel post.
///
/// `message_id` is Telegram's per-channel message counter, so the pair
/// `(chat, message_id)` identifies a post and the ids of a fully archived
/// channel form the contiguous range `1..=last_index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    /// SurrealDB record ID
    pub id: Option<surrealdb::sql::Thing>,
    /// Channel username the post belongs to
    pub chat: String,
    /// Message id within the channel
    pub message_id: u32,
    /// Post text
    pub text: String,
    /// When the post was published on Telegram
    #[serde(with = "surreal_datetime")]
    pub posted_at: DateTime<Utc>,
    /// When the post was written to the archive
    #[serde(with = "surreal_datetime")]
    pub archived_at: DateTime<Utc>,
}

impl PostRecord {
    /// Create a new post record stamped with the current archive time
    pub fn new(chat: &str, message_id: u32, text: &str, posted_at: DateTime<Utc>) -> Self {
        PostRecord {
            id: None,
            chat: chat.to_string(),
            message_id,
            text: text.to_string(),
            posted_at,
            archived_at: Utc::now(),
        }
    }
}

/// Per-channel archiving progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelCursor {
    /// SurrealDB record ID
    pub id: Option<surrealdb::sql::Thing>,
    /// Channel username
    pub chat: String,
    /// Highest archived message id (never decreases)
    pub last_index: u32,
    /// Next getUpdates offset to poll with (never decreases)
    pub update_offset: u64,
    /// Last time the cursor moved
    #[serde(with = "surreal_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl ChannelCursor {
    /// Fresh cursor for a channel that has nothing archived yet
    pub fn new(chat: &str) -> Self {
        ChannelCursor {
            id: None,
            chat: chat.to_string(),
            last_index: 0,
            update_offset: 0,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_record_new() {
        let posted = Utc::now();
        let record = PostRecord::new("durov", 42, "hello", posted);

        assert_eq!(record.chat, "durov");
        assert_eq!(record.message_id, 42);
        assert_eq!(record.text, "hello");
        assert_eq!(record.posted_at, posted);
        assert!(record.id.is_none());
    }

    #[test]
    fn test_channel_cursor_new() {
        let cursor = ChannelCursor::new("durov");

        assert_eq!(cursor.chat, "durov");
        assert_eq!(cursor.last_index, 0);
        assert_eq!(cursor.update_offset, 0);
    }
}
