//! Error types for realmkbot-telegram

use thiserror::Error;

/// Errors that can occur talking to the Bot API
#[derive(Error, Debug)]
pub enum TelegramError {
    /// HTTP transport error
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned ok=false
    #[error("Telegram API error {code}: {description}")]
    Api { code: i64, description: String },

    /// HTTP 429 with a retry hint
    #[error("Flood control exceeded, retry after {retry_after}s")]
    FloodWait { retry_after: u64 },

    /// The API returned ok=true but the payload was unusable
    #[error("Malformed API response: {0}")]
    Decode(String),
}

impl TelegramError {
    /// Whether the error is worth retrying after a pause (transport
    /// failures and flood control, as opposed to a bad token or request).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TelegramError::Http(_) | TelegramError::FloodWait { .. }
        )
    }
}
