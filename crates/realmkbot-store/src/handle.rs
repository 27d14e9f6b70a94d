//! SurrealDB Handle - Connection and Archive Operations
//!
//! Manages the connection and implements `PostArchive` on top of two tables:
//! `posts` (archived channel posts) and `cursors` (per-channel progress).
//!
//! Supports the embedded `surrealkv` file engine for production and the
//! in-memory engine for tests.

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use surrealdb::engine::any::Any;
use surrealdb::sql::Datetime as SurrealDatetime;
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

use crate::archive::PostArchive;
use crate::error::ArchiveError;
use crate::schema::{ChannelCursor, PostRecord};
use crate::Result;

/// SurrealDB connection handle for the post archive
#[derive(Clone)]
pub struct ArchiveHandle {
    db: Surreal<Any>,
}

impl ArchiveHandle {
    /// Connect to an in-memory database and set up the schema.
    ///
    /// State is lost when the handle is dropped; intended for tests.
    #[instrument(skip_all)]
    pub async fn setup_mem() -> Result<Self> {
        info!("Connecting to SurrealDB (in-memory)");

        let db = surrealdb::engine::any::connect("mem://")
            .await
            .map_err(|e| ArchiveError::Connection(e.to_string()))?;

        Self::finish_setup(db).await
    }

    /// Open (or create) the on-disk archive under `data_dir`.
    ///
    /// Uses the embedded SurrealKV engine; the database lives at
    /// `<data_dir>/realmkbot.db`.
    #[instrument(skip_all, fields(data_dir = %data_dir.as_ref().display()))]
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let path = data_dir.as_ref().join("realmkbot.db");
        info!("Opening archive at {}", path.display());

        std::fs::create_dir_all(data_dir.as_ref())
            .map_err(|e| ArchiveError::Connection(e.to_string()))?;

        let endpoint = format!("surrealkv://{}", path.display());
        let db = surrealdb::engine::any::connect(endpoint)
            .await
            .map_err(|e| ArchiveError::Connection(e.to_string()))?;

        Self::finish_setup(db).await
    }

    async fn finish_setup(db: Surreal<Any>) -> Result<Self> {
        db.use_ns("realmkbot")
            .use_db("archive")
            .await
            .map_err(|e| ArchiveError::Connection(e.to_string()))?;

        let handle = ArchiveHandle { db };
        handle.init_schema().await?;

        info!("Archive connected and schema initialized");
        Ok(handle)
    }

    /// Initialize the database schema
    async fn init_schema(&self) -> Result<()> {
        debug!("Initializing archive schema");

        let schema = r#"
            -- Archived channel posts
            DEFINE TABLE posts SCHEMAFULL;
            DEFINE FIELD chat ON posts TYPE string;
            DEFINE FIELD message_id ON posts TYPE int;
            DEFINE FIELD text ON posts TYPE string;
            DEFINE FIELD posted_at ON posts TYPE datetime;
            DEFINE FIELD archived_at ON posts TYPE datetime;
            DEFINE INDEX idx_posts_chat_message ON posts FIELDS chat, message_id UNIQUE;

            -- Per-channel progress
            DEFINE TABLE cursors SCHEMAFULL;
            DEFINE FIELD chat ON cursors TYPE string;
            DEFINE FIELD last_index ON cursors TYPE int;
            DEFINE FIELD update_offset ON cursors TYPE int;
            DEFINE FIELD updated_at ON cursors TYPE datetime;
            DEFINE INDEX idx_cursors_chat ON cursors FIELDS chat UNIQUE;
        "#;

        self.db
            .query(schema)
            .await
            .map_err(|e| ArchiveError::SchemaSetup(e.to_string()))?;

        debug!("Schema initialized successfully");
        Ok(())
    }

    /// Fetch a channel's cursor row, if one exists.
    async fn get_cursor(&self, chat: &str) -> Result<Option<ChannelCursor>> {
        let chat_owned = chat.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM cursors WHERE chat = $chat")
            .bind(("chat", chat_owned))
            .await?;

        let cursors: Vec<ChannelCursor> = result.take(0)?;
        Ok(cursors.into_iter().next())
    }

    /// Write a cursor back, creating the row if the channel is new.
    async fn put_cursor(&self, cursor: ChannelCursor) -> Result<()> {
        let existing = self.get_cursor(&cursor.chat).await?;

        if existing.is_some() {
            let chat = cursor.chat.clone();
            let now = SurrealDatetime::from(Utc::now());

            let mut result = self
                .db
                .query(
                    "UPDATE cursors SET last_index = $last, update_offset = $offset, \
                     updated_at = $now WHERE chat = $chat",
                )
                .bind(("last", cursor.last_index))
                .bind(("offset", cursor.update_offset))
                .bind(("now", now))
                .bind(("chat", chat))
                .await?;

            let updated: Vec<ChannelCursor> = result.take(0)?;
            if updated.is_empty() {
                return Err(ArchiveError::Write("Failed to update cursor".to_string()));
            }
        } else {
            let created: Option<ChannelCursor> =
                self.db.create("cursors").content(cursor).await?;

            if created.is_none() {
                return Err(ArchiveError::Write("Failed to create cursor".to_string()));
            }
        }

        Ok(())
    }

    /// Raise a channel's high-water mark to at least `message_id`.
    async fn bump_last_index(&self, chat: &str, message_id: u32) -> Result<()> {
        let mut cursor = self.load_cursor(chat).await?;
        if cursor.last_index >= message_id {
            return Ok(());
        }
        cursor.last_index = message_id;
        cursor.updated_at = Utc::now();
        self.put_cursor(cursor).await
    }
}

#[async_trait]
impl PostArchive for ArchiveHandle {
    #[instrument(skip(self, record), fields(chat = %record.chat, message_id = record.message_id))]
    async fn archive_post(&self, record: PostRecord) -> Result<bool> {
        let chat = record.chat.clone();
        let message_id = record.message_id;

        if self.get_post(&chat, message_id).await?.is_some() {
            debug!("Post already archived, skipping");
            self.bump_last_index(&chat, message_id).await?;
            return Ok(false);
        }

        let created: Option<PostRecord> = self.db.create("posts").content(record).await?;
        if created.is_none() {
            return Err(ArchiveError::Write("Failed to create post".to_string()));
        }

        self.bump_last_index(&chat, message_id).await?;

        info!("Archived {}/{}", chat, message_id);
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn get_post(&self, chat: &str, message_id: u32) -> Result<Option<PostRecord>> {
        let chat_owned = chat.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM posts WHERE chat = $chat AND message_id = $id")
            .bind(("chat", chat_owned))
            .bind(("id", message_id))
            .await?;

        let posts: Vec<PostRecord> = result.take(0)?;
        Ok(posts.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn list_posts(&self, chat: &str, limit: usize) -> Result<Vec<PostRecord>> {
        let chat_owned = chat.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM posts WHERE chat = $chat ORDER BY message_id DESC LIMIT $limit")
            .bind(("chat", chat_owned))
            .bind(("limit", limit as i64))
            .await?;

        let posts: Vec<PostRecord> = result.take(0)?;
        Ok(posts)
    }

    #[instrument(skip(self))]
    async fn last_index(&self, chat: &str) -> Result<u32> {
        Ok(self.load_cursor(chat).await?.last_index)
    }

    #[instrument(skip(self))]
    async fn archived_ids(&self, chat: &str) -> Result<BTreeSet<u32>> {
        let chat_owned = chat.to_string();

        let mut result = self
            .db
            .query("SELECT message_id FROM posts WHERE chat = $chat")
            .bind(("chat", chat_owned))
            .await?;

        #[derive(Deserialize)]
        struct IdRow {
            message_id: u32,
        }

        let rows: Vec<IdRow> = result.take(0)?;
        Ok(rows.into_iter().map(|r| r.message_id).collect())
    }

    #[instrument(skip(self))]
    async fn post_count(&self, chat: &str) -> Result<u64> {
        let chat_owned = chat.to_string();

        let mut result = self
            .db
            .query("SELECT count() FROM posts WHERE chat = $chat GROUP ALL")
            .bind(("chat", chat_owned))
            .await?;

        #[derive(Deserialize)]
        struct CountRow {
            count: u64,
        }

        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(|r| r.count).unwrap_or(0))
    }

    #[instrument(skip(self))]
    async fn load_cursor(&self, chat: &str) -> Result<ChannelCursor> {
        Ok(self
            .get_cursor(chat)
            .await?
            .unwrap_or_else(|| ChannelCursor::new(chat)))
    }

    #[instrument(skip(self))]
    async fn save_offset(&self, chat: &str, update_offset: u64) -> Result<()> {
        let mut cursor = self.load_cursor(chat).await?;
        if cursor.update_offset >= update_offset {
            return Ok(());
        }
        cursor.update_offset = update_offset;
        cursor.updated_at = Utc::now();
        self.put_cursor(cursor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(chat: &str, id: u32, text: &str) -> PostRecord {
        PostRecord::new(chat, id, text, Utc::now())
    }

    #[tokio::test]
    async fn test_connection_and_schema_creation() {
        let handle = ArchiveHandle::setup_mem().await;
        assert!(handle.is_ok(), "Failed to connect: {:?}", handle.err());
    }

    #[tokio::test]
    async fn test_open_on_disk_engine() {
        let dir = tempfile::tempdir().unwrap();
        let handle = ArchiveHandle::open(dir.path()).await.unwrap();

        handle.archive_post(record("durov", 1, "on disk")).await.unwrap();
        let loaded = handle.get_post("durov", 1).await.unwrap().unwrap();
        assert_eq!(loaded.text, "on disk");
    }

    #[tokio::test]
    async fn test_archive_and_get_post() {
        let handle = ArchiveHandle::setup_mem().await.unwrap();

        let inserted = handle.archive_post(record("durov", 7, "hello")).await.unwrap();
        assert!(inserted);

        let loaded = handle.get_post("durov", 7).await.unwrap();
        assert!(loaded.is_some());
        assert_eq!(loaded.unwrap().text, "hello");

        assert!(handle.get_post("durov", 8).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_archive_is_noop() {
        let handle = ArchiveHandle::setup_mem().await.unwrap();

        assert!(handle.archive_post(record("durov", 3, "first")).await.unwrap());
        assert!(!handle.archive_post(record("durov", 3, "second")).await.unwrap());

        // First write wins.
        let loaded = handle.get_post("durov", 3).await.unwrap().unwrap();
        assert_eq!(loaded.text, "first");
        assert_eq!(handle.post_count("durov").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_last_index_is_monotonic() {
        let handle = ArchiveHandle::setup_mem().await.unwrap();

        assert_eq!(handle.last_index("durov").await.unwrap(), 0);

        handle.archive_post(record("durov", 5, "five")).await.unwrap();
        assert_eq!(handle.last_index("durov").await.unwrap(), 5);

        // Out-of-order insert below the high-water mark fills a gap but
        // does not move the mark back.
        handle.archive_post(record("durov", 2, "two")).await.unwrap();
        assert_eq!(handle.last_index("durov").await.unwrap(), 5);

        handle.archive_post(record("durov", 9, "nine")).await.unwrap();
        assert_eq!(handle.last_index("durov").await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_archived_ids_and_count() {
        let handle = ArchiveHandle::setup_mem().await.unwrap();

        for id in [2u32, 4, 5] {
            handle.archive_post(record("durov", id, "post")).await.unwrap();
        }
        handle.archive_post(record("other", 1, "noise")).await.unwrap();

        let ids = handle.archived_ids("durov").await.unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![2, 4, 5]);
        assert_eq!(handle.post_count("durov").await.unwrap(), 3);
        assert_eq!(handle.post_count("other").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_posts_newest_first() {
        let handle = ArchiveHandle::setup_mem().await.unwrap();

        for id in 1u32..=4 {
            handle
                .archive_post(record("durov", id, &format!("post {id}")))
                .await
                .unwrap();
        }

        let posts = handle.list_posts("durov", 2).await.unwrap();
        let ids: Vec<u32> = posts.iter().map(|p| p.message_id).collect();
        assert_eq!(ids, vec![4, 3]);
    }

    #[tokio::test]
    async fn test_offset_only_moves_forward() {
        let handle = ArchiveHandle::setup_mem().await.unwrap();

        assert_eq!(handle.load_cursor("durov").await.unwrap().update_offset, 0);

        handle.save_offset("durov", 100).await.unwrap();
        assert_eq!(handle.load_cursor("durov").await.unwrap().update_offset, 100);

        // Stale offsets are ignored.
        handle.save_offset("durov", 50).await.unwrap();
        assert_eq!(handle.load_cursor("durov").await.unwrap().update_offset, 100);
    }

    #[tokio::test]
    async fn test_cursor_tracks_offset_and_index_together() {
        let handle = ArchiveHandle::setup_mem().await.unwrap();

        handle.archive_post(record("durov", 12, "post")).await.unwrap();
        handle.save_offset("durov", 777).await.unwrap();

        let cursor = handle.load_cursor("durov").await.unwrap();
        assert_eq!(cursor.last_index, 12);
        assert_eq!(cursor.update_offset, 777);
    }
}
