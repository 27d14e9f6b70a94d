//! The Telegram port the archiver core runs against.

use async_trait::async_trait;

use crate::types::{Update, User};
use crate::Result;

/// Minimal Bot API surface needed to archive a channel.
///
/// Implemented by `BotClient` against the real API and by
/// `fakes::ScriptedApi` for tests.
#[async_trait]
pub trait TelegramApi: Send + Sync {
    /// Identify the bot (login check).
    async fn get_me(&self) -> Result<User>;

    /// Long-poll for updates. `offset` acknowledges everything below it;
    /// `timeout_secs` is the server-side hold time for an empty poll.
    async fn get_updates(&self, offset: Option<u64>, timeout_secs: u64) -> Result<Vec<Update>>;
}
