use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::value_text;

#[derive(Debug, Clone, Serialize)]
pub struct FacebookPost {
    pub message: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstagramPost {
    pub caption: String,
    pub image_url: String,
}

/// Reply of either posting endpoint; only one id field is ever set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostReceipt {
    #[serde(default)]
    pub post_id: Option<Value>,
    #[serde(default)]
    pub media_id: Option<Value>,
}

impl PostReceipt {
    /// The returned post or media id, or `OK` when the backend sent neither.
    pub fn summary(&self) -> String {
        self.post_id
            .as_ref()
            .and_then(value_text)
            .or_else(|| self.media_id.as_ref().and_then(value_text))
            .unwrap_or_else(|| "OK".to_string())
    }
}
