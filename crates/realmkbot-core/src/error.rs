//! Error taxonomy for the archiver core.

use thiserror::Error;

/// Errors produced by the archiver orchestration layer.
#[derive(Debug, Error)]
pub enum ArchiverError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("archive error: {0}")]
    Archive(#[from] realmkbot_store::ArchiveError),

    #[error("telegram error: {0}")]
    Telegram(#[from] realmkbot_telegram::TelegramError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ArchiverError::Config("REALMKBOT_BOT_TOKEN not set".to_string());
        assert!(err.to_string().contains("configuration error"));

        let err = ArchiverError::from(realmkbot_telegram::TelegramError::FloodWait {
            retry_after: 3,
        });
        assert!(err.to_string().contains("retry after 3"));
    }
}
