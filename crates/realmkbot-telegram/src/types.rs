//! Wire models for the Bot API subset the archiver consumes
//!
//! Field names follow the Bot API JSON exactly; everything the archiver does
//! not read is left out rather than modelled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TelegramError;

/// Standard Bot API response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
    pub parameters: Option<ResponseParameters>,
}

/// Extra failure context the API attaches to some errors.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
    pub migrate_to_chat_id: Option<i64>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the envelope into the inner payload or a typed error.
    pub fn into_result(self) -> crate::Result<T> {
        if self.ok {
            return self
                .result
                .ok_or_else(|| TelegramError::Decode("ok response without result".to_string()));
        }

        if let Some(retry_after) = self.parameters.and_then(|p| p.retry_after) {
            return Err(TelegramError::FloodWait { retry_after });
        }

        Err(TelegramError::Api {
            code: self.error_code.unwrap_or(0),
            description: self
                .description
                .unwrap_or_else(|| "no description".to_string()),
        })
    }
}

/// One incoming update from getUpdates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_post: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_channel_post: Option<Message>,
}

impl Update {
    /// The channel post carried by this update, whether new or edited.
    pub fn channel_content(&self) -> Option<&Message> {
        self.channel_post
            .as_ref()
            .or(self.edited_channel_post.as_ref())
    }
}

/// A Telegram message, as far as the archiver cares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: u32,
    /// Unix timestamp of publication
    pub date: i64,
    pub chat: Chat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl Message {
    /// Archivable text content: the message text, or the caption for media
    /// posts. `None` for contentless posts (polls, stickers, ...).
    pub fn content_text(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }

    /// Publication time as a UTC datetime. Falls back to the epoch for an
    /// out-of-range timestamp rather than failing the whole update.
    pub fn posted_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.date, 0).unwrap_or_default()
    }
}

/// Chat a message belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Chat {
    /// Whether this chat is the named channel. Telegram usernames are
    /// case-insensitive.
    pub fn is_channel(&self, username: &str) -> bool {
        self.kind == "channel"
            && self
                .username
                .as_deref()
                .is_some_and(|u| u.eq_ignore_ascii_case(username))
    }
}

/// The bot's own identity, from getMe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_get_updates_response() {
        let json = r#"{
            "ok": true,
            "result": [{
                "update_id": 870000123,
                "channel_post": {
                    "message_id": 108,
                    "date": 1700000000,
                    "chat": {"id": -1001234, "type": "channel", "title": "Realm", "username": "realm"},
                    "text": "a post"
                }
            }]
        }"#;

        let envelope: ApiEnvelope<Vec<Update>> = serde_json::from_str(json).unwrap();
        let updates = envelope.into_result().unwrap();

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 870000123);

        let post = updates[0].channel_content().unwrap();
        assert_eq!(post.message_id, 108);
        assert_eq!(post.content_text(), Some("a post"));
        assert!(post.chat.is_channel("realm"));
        assert!(post.chat.is_channel("REALM"));
        assert!(!post.chat.is_channel("other"));
    }

    #[test]
    fn test_decode_api_error() {
        let json = r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#;

        let envelope: ApiEnvelope<Vec<Update>> = serde_json::from_str(json).unwrap();
        let err = envelope.into_result().unwrap_err();

        match err {
            TelegramError::Api { code, description } => {
                assert_eq!(code, 401);
                assert_eq!(description, "Unauthorized");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_flood_wait() {
        let json = r#"{
            "ok": false,
            "error_code": 429,
            "description": "Too Many Requests: retry after 17",
            "parameters": {"retry_after": 17}
        }"#;

        let envelope: ApiEnvelope<Vec<Update>> = serde_json::from_str(json).unwrap();
        let err = envelope.into_result().unwrap_err();

        assert!(matches!(err, TelegramError::FloodWait { retry_after: 17 }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_ok_without_result_is_decode_error() {
        let json = r#"{"ok": true}"#;

        let envelope: ApiEnvelope<User> = serde_json::from_str(json).unwrap();
        assert!(matches!(
            envelope.into_result(),
            Err(TelegramError::Decode(_))
        ));
    }

    #[test]
    fn test_edited_channel_post_is_channel_content() {
        let json = r#"{
            "update_id": 1,
            "edited_channel_post": {
                "message_id": 4,
                "date": 1700000000,
                "chat": {"id": -1, "type": "channel", "username": "realm"},
                "caption": "edited caption"
            }
        }"#;

        let update: Update = serde_json::from_str(json).unwrap();
        let post = update.channel_content().unwrap();
        assert_eq!(post.content_text(), Some("edited caption"));
    }

    #[test]
    fn test_private_message_is_not_channel_content() {
        let json = r#"{
            "update_id": 2,
            "message": {
                "message_id": 9,
                "date": 1700000000,
                "chat": {"id": 42, "type": "private"},
                "text": "dm"
            }
        }"#;

        let update: Update = serde_json::from_str(json).unwrap();
        assert!(update.channel_content().is_none());
        assert!(!update.message.unwrap().chat.is_channel("realm"));
    }
}
