//! In-memory fake for the archive trait (testing only)
//!
//! Provides `MemoryArchive`, which satisfies the `PostArchive` contract
//! without any external dependencies.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::archive::PostArchive;
use crate::schema::{ChannelCursor, PostRecord};
use crate::Result;

#[derive(Debug, Default)]
struct ChannelState {
    posts: BTreeMap<u32, PostRecord>,
    last_index: u32,
    update_offset: u64,
}

/// In-memory archive backed by a `HashMap<chat, ChannelState>`.
#[derive(Debug, Default)]
pub struct MemoryArchive {
    channels: Mutex<HashMap<String, ChannelState>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostArchive for MemoryArchive {
    async fn archive_post(&self, record: PostRecord) -> Result<bool> {
        let mut channels = self.channels.lock().unwrap();
        let state = channels.entry(record.chat.clone()).or_default();

        state.last_index = state.last_index.max(record.message_id);
        if state.posts.contains_key(&record.message_id) {
            return Ok(false);
        }
        state.posts.insert(record.message_id, record);
        Ok(true)
    }

    async fn get_post(&self, chat: &str, message_id: u32) -> Result<Option<PostRecord>> {
        let channels = self.channels.lock().unwrap();
        Ok(channels
            .get(chat)
            .and_then(|s| s.posts.get(&message_id))
            .cloned())
    }

    async fn list_posts(&self, chat: &str, limit: usize) -> Result<Vec<PostRecord>> {
        let channels = self.channels.lock().unwrap();
        Ok(channels
            .get(chat)
            .map(|s| s.posts.values().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn last_index(&self, chat: &str) -> Result<u32> {
        let channels = self.channels.lock().unwrap();
        Ok(channels.get(chat).map(|s| s.last_index).unwrap_or(0))
    }

    async fn archived_ids(&self, chat: &str) -> Result<BTreeSet<u32>> {
        let channels = self.channels.lock().unwrap();
        Ok(channels
            .get(chat)
            .map(|s| s.posts.keys().copied().collect())
            .unwrap_or_default())
    }

    async fn post_count(&self, chat: &str) -> Result<u64> {
        let channels = self.channels.lock().unwrap();
        Ok(channels.get(chat).map(|s| s.posts.len() as u64).unwrap_or(0))
    }

    async fn load_cursor(&self, chat: &str) -> Result<ChannelCursor> {
        let channels = self.channels.lock().unwrap();
        let mut cursor = ChannelCursor::new(chat);
        if let Some(state) = channels.get(chat) {
            cursor.last_index = state.last_index;
            cursor.update_offset = state.update_offset;
            cursor.updated_at = Utc::now();
        }
        Ok(cursor)
    }

    async fn save_offset(&self, chat: &str, update_offset: u64) -> Result<()> {
        let mut channels = self.channels.lock().unwrap();
        let state = channels.entry(chat.to_string()).or_default();
        state.update_offset = state.update_offset.max(update_offset);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_matches_archive_contract() {
        let archive = MemoryArchive::new();

        let record = PostRecord::new("durov", 4, "hello", Utc::now());
        assert!(archive.archive_post(record.clone()).await.unwrap());
        assert!(!archive.archive_post(record).await.unwrap());

        assert_eq!(archive.last_index("durov").await.unwrap(), 4);
        assert_eq!(archive.post_count("durov").await.unwrap(), 1);

        archive.save_offset("durov", 9).await.unwrap();
        archive.save_offset("durov", 3).await.unwrap();
        assert_eq!(archive.load_cursor("durov").await.unwrap().update_offset, 9);
    }
}
