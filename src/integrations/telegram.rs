use std::{sync::Arc, time::Duration};

use futures::{future::BoxFuture, FutureExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::time::sleep;
use url::Url;

use crate::{
    cmd,
    core::{
        round::{NotificationSink, RoundRequest},
        settings::Settings,
    },
    error::Error,
    send_message, Directory,
};

/// An incoming event from the Bot API.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    /// Caption of an attached photo, Telegram keeps it separate from text
    pub caption: Option<String>,
    /// Thumbnail sizes of an attached photo, smallest first
    #[serde(default)]
    pub photo: Vec<PhotoSize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
}

/// Envelope every Bot API method responds with.
#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// A thin client over the Telegram Bot API methods the bot uses.
pub struct TelegramClient {
    http: reqwest::Client,
    base: Url,
}

impl TelegramClient {
    pub fn new(token: &str) -> Result<TelegramClient, Error> {
        let base = Url::parse(&format!("https://api.telegram.org/bot{}/", token.trim()))
            .map_err(|err| Error::Api(format!("Could not build API url: {}", err)))?;

        Ok(TelegramClient {
            http: reqwest::Client::new(),
            base,
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &impl Serialize,
    ) -> Result<T, Error> {
        let url = self
            .base
            .join(method)
            .map_err(|err| Error::Api(err.to_string()))?;

        let response: ApiResponse<T> = self
            .http
            .post(url)
            .json(params)
            .send()
            .await?
            .json()
            .await?;

        if response.ok {
            response
                .result
                .ok_or_else(|| Error::Api(format!("'{}' returned no result", method)))
        } else {
            Err(Error::Api(response.description.unwrap_or_else(|| {
                format!("'{}' was rejected by the API", method)
            })))
        }
    }

    /// Validate the token, returning the bot's username.
    pub async fn get_me(&self) -> Result<String, Error> {
        let me: User = self.call("getMe", &serde_json::json!({})).await?;
        Ok(me.username.unwrap_or_else(|| me.id.to_string()))
    }

    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), Error> {
        let _: Message = self
            .call(
                "sendMessage",
                &serde_json::json!({
                    "chat_id": chat_id,
                    "text": text,
                    "parse_mode": "Markdown",
                }),
            )
            .await?;
        Ok(())
    }

    pub async fn send_photo(&self, chat_id: &str, file_id: &str) -> Result<(), Error> {
        let _: Message = self
            .call(
                "sendPhoto",
                &serde_json::json!({
                    "chat_id": chat_id,
                    "photo": file_id,
                }),
            )
            .await?;
        Ok(())
    }

    pub async fn get_updates(&self, offset: i64, timeout_s: u64) -> Result<Vec<Update>, Error> {
        self.call(
            "getUpdates",
            &serde_json::json!({
                "offset": offset,
                "timeout": timeout_s,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }
}

/// Delivers announcements to the configured group chat. Media references
/// are sent as photos after the text.
pub struct TelegramSink {
    client: Arc<TelegramClient>,
    chat_id: String,
}

impl TelegramSink {
    pub fn new(client: Arc<TelegramClient>, chat_id: String) -> TelegramSink {
        TelegramSink { client, chat_id }
    }
}

impl NotificationSink for TelegramSink {
    fn deliver(&self, text: String, media: Vec<String>) -> BoxFuture<'_, Result<(), Error>> {
        async move {
            self.client.send_message(&self.chat_id, &text).await?;
            for file_id in media {
                self.client.send_photo(&self.chat_id, &file_id).await?;
            }
            Ok(())
        }
        .boxed()
    }
}

/// Classify one inbound message and funnel it to the round actor.
///
/// Shared by the long-poll loop and the webhook endpoint, so both
/// transports feed the same controller instance.
pub async fn process_message(message: Message, directory: &Directory) {
    let identity = message
        .from
        .as_ref()
        .map(|u| u.id.to_string())
        .unwrap_or_default();
    let photo = message.photo.last().map(|p| p.file_id.clone());
    let text = message.text.or(message.caption).unwrap_or_default();

    let intent = cmd::classify(&text, photo.as_deref());
    log::debug!("Classified message from '{}' as {:?}", identity, intent);

    match send_message!(directory.round_actor, RoundRequest, Handle, intent, identity) {
        Ok(outcome) => log::debug!("Handled intent: {:?}", outcome),
        Err(err) => log::warn!("Round actor failed to handle intent: {}", err),
    }
}

/// Long-poll loop over getUpdates. Messages outside the configured group
/// are ignored.
pub async fn run_poller(
    client: Arc<TelegramClient>,
    settings: Arc<Settings>,
    directory: Directory,
) -> Result<(), anyhow::Error> {
    log::info!("Started Telegram long-poll loop");

    let mut offset = 0;
    loop {
        let updates = match client.get_updates(offset, 30).await {
            Ok(updates) => updates,
            Err(err) => {
                log::warn!("Polling failed, retrying shortly: {}", err);
                sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };

            if message.chat.id.to_string() != settings.group_chat_id {
                continue;
            }

            process_message(message, &directory).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiResponse, Update};
    use crate::cmd::{self, Intent};

    #[test]
    fn test_update_deserialization() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 42,
                "message": {
                    "message_id": 7,
                    "chat": {"id": -100200300, "type": "supergroup"},
                    "from": {"id": 12345, "is_bot": false, "username": "maria"},
                    "text": ".add Maria"
                }
            }"#,
        )
        .unwrap();

        let message = update.message.unwrap();
        assert_eq!(message.chat.id, -100200300);
        assert_eq!(message.from.unwrap().id, 12345);
        assert_eq!(
            cmd::classify(message.text.as_deref().unwrap(), None),
            Intent::Add("Maria".to_owned())
        );
    }

    #[test]
    fn test_photo_update_classification() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 43,
                "message": {
                    "message_id": 8,
                    "chat": {"id": -1},
                    "caption": ".addprize",
                    "photo": [{"file_id": "small"}, {"file_id": "large"}]
                }
            }"#,
        )
        .unwrap();

        let message = update.message.unwrap();
        let photo = message.photo.last().map(|p| p.file_id.clone());
        let intent = cmd::classify(message.caption.as_deref().unwrap(), photo.as_deref());
        assert_eq!(intent, Intent::GalleryAdd("large".to_owned()));
    }

    #[test]
    fn test_api_error_envelope() {
        let response: ApiResponse<Vec<Update>> = serde_json::from_str(
            r#"{"ok": false, "description": "Unauthorized"}"#,
        )
        .unwrap();

        assert!(!response.ok);
        assert!(response.result.is_none());
        assert_eq!(response.description.as_deref(), Some("Unauthorized"));
    }
}
