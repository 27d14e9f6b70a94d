//! Scripted fake for the Telegram port (testing only)

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::TelegramApi;
use crate::error::TelegramError;
use crate::types::{Update, User};
use crate::Result;

enum Scripted {
    Batch(Vec<Update>),
    Error(TelegramError),
}

/// `TelegramApi` fake that replays pre-baked update batches in order and
/// records the offsets it was polled with. Once the script is exhausted,
/// every further poll returns an empty batch.
#[derive(Default)]
pub struct ScriptedApi {
    script: Mutex<VecDeque<Scripted>>,
    offsets: Mutex<Vec<Option<u64>>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a batch of updates for the next poll.
    pub fn push_batch(&self, updates: Vec<Update>) {
        self.script.lock().unwrap().push_back(Scripted::Batch(updates));
    }

    /// Queue an error for the next poll.
    pub fn push_error(&self, error: TelegramError) {
        self.script.lock().unwrap().push_back(Scripted::Error(error));
    }

    /// Offsets seen so far, in poll order.
    pub fn seen_offsets(&self) -> Vec<Option<u64>> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl TelegramApi for ScriptedApi {
    async fn get_me(&self) -> Result<User> {
        Ok(User {
            id: 1,
            is_bot: true,
            first_name: "realmkbot".to_string(),
            username: Some("realmkbot".to_string()),
        })
    }

    async fn get_updates(&self, offset: Option<u64>, _timeout_secs: u64) -> Result<Vec<Update>> {
        self.offsets.lock().unwrap().push(offset);

        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Batch(updates)) => Ok(updates),
            Some(Scripted::Error(error)) => Err(error),
            None => Ok(Vec::new()),
        }
    }
}
