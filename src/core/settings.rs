use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Json struct for startup configuration. Read once at launch and never
/// mutated afterwards.
#[derive(Serialize, Deserialize, Clone)]
pub struct Settings {
    /// Telegram bot token. DO NOT SHARE the settings file.
    pub telegram_token: String,

    /// Chat id of the group the raffle runs in.
    pub group_chat_id: String,

    /// Port for the health/webhook/API server.
    pub web_port: Option<u16>,

    /// Names needed before a winner can be drawn.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Clear the prize gallery together with the roster after a draw.
    #[serde(default)]
    pub auto_clear_gallery_on_draw: bool,

    /// Swallow exactly one message from the winner after the announcement,
    /// so a congratulatory reply is not processed as a command.
    #[serde(default)]
    pub suppress_winner_next_message: bool,
}

fn default_capacity() -> usize {
    20
}

impl Settings {
    /// Validate the fields the process cannot start without.
    pub fn validate(&self) -> Result<(), Error> {
        if self.telegram_token.trim().is_empty() {
            return Err(Error::Settings("'telegram_token' is missing".to_owned()));
        }
        if self.group_chat_id.trim().is_empty() {
            return Err(Error::Settings("'group_chat_id' is missing".to_owned()));
        }
        if self.capacity == 0 {
            return Err(Error::Settings("'capacity' must be at least 1".to_owned()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;

    #[test]
    fn test_defaults_and_validation() {
        let settings: Settings = serde_json::from_str(
            r#"{"telegram_token": "123:abc", "group_chat_id": "-100200300", "web_port": 5000}"#,
        )
        .unwrap();

        assert_eq!(settings.capacity, 20);
        assert!(!settings.auto_clear_gallery_on_draw);
        assert!(!settings.suppress_winner_next_message);
        assert!(settings.validate().is_ok());

        let missing: Settings =
            serde_json::from_str(r#"{"telegram_token": "", "group_chat_id": "x"}"#).unwrap();
        assert!(missing.validate().is_err());
    }
}
