//! Background-channel notification payload.

use serde::{Deserialize, Serialize};

pub const DEFAULT_NOTIFICATION_TITLE: &str = "Reminder";
pub const DEFAULT_NOTIFICATION_BODY: &str = "You have a new notification!";
pub const DEFAULT_CLICK_TARGET: &str = "/";

/// `{title, body, url?}` as pushed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Default for NotificationPayload {
    fn default() -> Self {
        Self {
            title: DEFAULT_NOTIFICATION_TITLE.to_string(),
            body: DEFAULT_NOTIFICATION_BODY.to_string(),
            url: None,
        }
    }
}

impl NotificationPayload {
    /// Decodes push data; a push without data yields the default payload.
    ///
    /// # Errors
    /// - Returns the JSON error when data is present but malformed.
    pub fn from_push_data(data: Option<&[u8]>) -> serde_json::Result<Self> {
        match data {
            Some(bytes) => serde_json::from_slice(bytes),
            None => Ok(Self::default()),
        }
    }

    /// Location opened when the notification is clicked.
    pub fn click_target(&self) -> &str {
        match self.url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => DEFAULT_CLICK_TARGET,
        }
    }
}
