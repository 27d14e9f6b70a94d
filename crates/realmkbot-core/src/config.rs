//! Archiver configuration.

use std::path::PathBuf;

use crate::error::ArchiverError;

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for the archiver.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot API token
    pub bot_token: String,
    /// Username of the channel to archive
    pub chat: String,
    /// Directory holding the archive database
    pub data_dir: PathBuf,
    /// Server-side hold time for an empty getUpdates poll
    pub poll_timeout_secs: u64,
    /// Alternative Bot API host (self-hosted gateway), if any
    pub api_base: Option<String>,
}

impl Config {
    /// Create a configuration with defaults for everything but the
    /// credentials and target channel.
    pub fn new(bot_token: impl Into<String>, chat: impl Into<String>) -> Self {
        Config {
            bot_token: bot_token.into(),
            chat: chat.into(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            api_base: None,
        }
    }

    /// Create a configuration from environment variables.
    ///
    /// Reads:
    /// - REALMKBOT_BOT_TOKEN (required)
    /// - REALMKBOT_CHAT (required)
    /// - REALMKBOT_DATA_DIR (optional, default: "./data")
    /// - REALMKBOT_POLL_TIMEOUT (optional, seconds, default: 30)
    /// - REALMKBOT_API_BASE (optional)
    pub fn from_env() -> crate::Result<Self> {
        let bot_token = std::env::var("REALMKBOT_BOT_TOKEN")
            .map_err(|_| ArchiverError::Config("REALMKBOT_BOT_TOKEN not set".to_string()))?;
        let chat = std::env::var("REALMKBOT_CHAT")
            .map_err(|_| ArchiverError::Config("REALMKBOT_CHAT not set".to_string()))?;

        let mut config = Config::new(bot_token, chat);

        if let Ok(dir) = std::env::var("REALMKBOT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(timeout) = std::env::var("REALMKBOT_POLL_TIMEOUT") {
            config.poll_timeout_secs = timeout.parse().map_err(|_| {
                ArchiverError::Config(format!("REALMKBOT_POLL_TIMEOUT is not a number: {timeout}"))
            })?;
        }
        if let Ok(base) = std::env::var("REALMKBOT_API_BASE") {
            config.api_base = Some(base);
        }

        Ok(config)
    }

    /// Set the data directory
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Set the long-poll timeout
    pub fn with_poll_timeout(mut self, secs: u64) -> Self {
        self.poll_timeout_secs = secs;
        self
    }

    /// Set an alternative Bot API host
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::new("123:abc", "realm");

        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.chat, "realm");
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.poll_timeout_secs, 30);
        assert!(config.api_base.is_none());
    }

    #[test]
    fn test_config_from_env() {
        std::env::set_var("REALMKBOT_BOT_TOKEN", "42:token");
        std::env::set_var("REALMKBOT_CHAT", "realm");
        std::env::set_var("REALMKBOT_POLL_TIMEOUT", "7");

        let config = Config::from_env().unwrap();
        assert_eq!(config.bot_token, "42:token");
        assert_eq!(config.chat, "realm");
        assert_eq!(config.poll_timeout_secs, 7);
    }

    #[test]
    fn test_config_builders() {
        let config = Config::new("123:abc", "realm")
            .with_data_dir("/var/lib/realmkbot")
            .with_poll_timeout(5)
            .with_api_base("http://localhost:8081");

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/realmkbot"));
        assert_eq!(config.poll_timeout_secs, 5);
        assert_eq!(config.api_base.as_deref(), Some("http://localhost:8081"));
    }
}
