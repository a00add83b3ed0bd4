mod brand;
mod chat;
mod inbox;
mod lead;
mod social;
mod whatsapp;

pub use brand::{Brand, BrandId, ContextUpdate, CreatedBrand, NewBrand};
pub use chat::{ChatAgent, ChatMessage, ChatPost, ChatThread, OrchestratorPost};
pub use inbox::{
    interest_from_key, interest_key, priority_from_key, priority_key, Board, BoardColumn,
    BulkMove, ChatCard, ChatMetaUpdate, GroupBy, MessageList, WaMessage, INTEREST_KEYS,
    PRIORITY_KEYS, UNTAGGED_KEY,
};
pub use lead::{Lead, LeadIngest, LeadPage};
pub use social::{FacebookPost, InstagramPost, PostReceipt};
pub use whatsapp::{
    allow_list_from_value, AgentMode, ConfigBundle, ConnectionStatus, Datasource, DatasourceKind,
    InstanceRotation, SyncPullResult, TestMessage, WaConfig, DEFAULT_SUPER_KEYWORD,
    DEFAULT_TEMPERATURE,
};

use serde::{Deserialize, Deserializer};

/// Treat an explicit JSON `null` like a missing field.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Render a scalar JSON value as display text (`"42"` and `42` both give `42`).
pub fn value_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
