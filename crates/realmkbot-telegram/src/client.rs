//! Bot API client over HTTP long polling.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::api::TelegramApi;
use crate::types::{ApiEnvelope, Update, User};
use crate::Result;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// `TelegramApi` implementation against the hosted Bot API.
#[derive(Debug, Clone)]
pub struct BotClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl BotClient {
    /// Create a client for the given bot token.
    pub fn new(token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("realmkbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        BotClient {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
        }
    }

    /// Point the client at a different API host (a self-hosted Bot API
    /// gateway). Trailing slashes are trimmed.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Call one Bot API method with a JSON body and decode the envelope.
    async fn call<P, T>(&self, method: &str, params: &P) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/bot{}/{}", self.api_base, self.token, method);
        debug!("Calling {}", method);

        let response = self.http.post(&url).json(params).send().await?;
        let envelope: ApiEnvelope<T> = response.json().await?;
        envelope.into_result()
    }
}

#[derive(Serialize)]
struct GetUpdatesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<u64>,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

#[async_trait]
impl TelegramApi for BotClient {
    async fn get_me(&self) -> Result<User> {
        self.call("getMe", &serde_json::json!({})).await
    }

    async fn get_updates(&self, offset: Option<u64>, timeout_secs: u64) -> Result<Vec<Update>> {
        let params = GetUpdatesParams {
            offset,
            timeout: timeout_secs,
            allowed_updates: &["channel_post", "edited_channel_post"],
        };
        self.call("getUpdates", &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_override_trims_slash() {
        let client = BotClient::new("123:abc").with_api_base("http://localhost:8081/");
        assert_eq!(client.api_base, "http://localhost:8081");
    }

    #[test]
    fn test_get_updates_params_skip_missing_offset() {
        let params = GetUpdatesParams {
            offset: None,
            timeout: 30,
            allowed_updates: &["channel_post"],
        };
        let json = serde_json::to_value(&params).unwrap();
        assert!(json.get("offset").is_none());
        assert_eq!(json["timeout"], 30);
    }
}
