use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MkproError;

use super::{nullable, value_text, BrandId};

/// Column keys of the priority grouping, in ordinal order.
pub const PRIORITY_KEYS: [&str; 4] = ["p0", "p1", "p2", "p3"];
/// Column keys of the interest grouping, in ordinal order.
pub const INTEREST_KEYS: [&str; 4] = ["unknown", "cold", "warm", "hot"];
/// Tag-grouping column holding chats without tags.
pub const UNTAGGED_KEY: &str = "untagged";

pub fn priority_from_key(key: &str) -> Option<u8> {
    PRIORITY_KEYS
        .iter()
        .position(|k| *k == key)
        .map(|idx| idx as u8)
}

pub fn interest_from_key(key: &str) -> Option<u8> {
    INTEREST_KEYS
        .iter()
        .position(|k| *k == key)
        .map(|idx| idx as u8)
}

pub fn priority_key(value: u8) -> Option<&'static str> {
    PRIORITY_KEYS.get(value as usize).copied()
}

pub fn interest_key(value: u8) -> Option<&'static str> {
    INTEREST_KEYS.get(value as usize).copied()
}

/// Dimension the board is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Column,
    Priority,
    Interest,
    Tag,
}

impl GroupBy {
    pub fn all() -> &'static [GroupBy] {
        &[
            GroupBy::Column,
            GroupBy::Priority,
            GroupBy::Interest,
            GroupBy::Tag,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Column => "column",
            GroupBy::Priority => "priority",
            GroupBy::Interest => "interest",
            GroupBy::Tag => "tag",
        }
    }

    pub fn next(&self) -> GroupBy {
        let all = GroupBy::all();
        let idx = all.iter().position(|g| g == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = MkproError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GroupBy::all()
            .iter()
            .copied()
            .find(|g| g.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| {
                MkproError::validation(format!(
                    "unknown grouping '{}' (expected column, priority, interest or tag)",
                    s
                ))
            })
    }
}

/// Backend-computed board.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub group_by: Option<GroupBy>,
    #[serde(default, deserialize_with = "nullable")]
    pub columns: Vec<BoardColumn>,
}

impl Board {
    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }

    pub fn find_card(&self, jid: &str) -> Option<&ChatCard> {
        self.columns
            .iter()
            .flat_map(|c| c.cards.iter())
            .find(|card| card.jid == jid)
    }

    pub fn column(&self, key: &str) -> Option<&BoardColumn> {
        self.columns.iter().find(|c| c.key == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BoardColumn {
    pub key: String,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, alias = "items", deserialize_with = "nullable")]
    pub cards: Vec<ChatCard>,
}

impl BoardColumn {
    pub fn heading(&self) -> String {
        let title = if self.title.is_empty() {
            &self.key
        } else {
            &self.title
        };
        format!("{} ({})", title, self.cards.len())
    }
}

/// One conversation on the board.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ChatCard {
    pub jid: String,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub unread: u32,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub pinned: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub archived: bool,
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub interest: Option<u8>,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ChatCard {
    pub fn label(&self) -> String {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .or(self.number.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.jid)
            .to_string()
    }

    /// Number to reply to: the explicit number, else the user part of the jid.
    pub fn reply_number(&self) -> String {
        match self.number.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(number) => number.to_string(),
            None => self.jid.split('@').next().unwrap_or_default().to_string(),
        }
    }
}

/// Body of `POST /api/wa/chat/meta`. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatMetaUpdate {
    pub brand_id: BrandId,
    pub jid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ChatMetaUpdate {
    pub fn new(brand_id: BrandId, jid: impl Into<String>) -> Self {
        Self {
            brand_id,
            jid: jid.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkMove {
    pub brand_id: BrandId,
    pub jids: Vec<String>,
    pub column: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WaMessage {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, alias = "fromMe", deserialize_with = "nullable")]
    pub from_me: bool,
    #[serde(default, alias = "body", deserialize_with = "nullable")]
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl WaMessage {
    pub fn id_text(&self) -> Option<String> {
        self.id.as_ref().and_then(value_text)
    }
}

/// Message history arrives bare or wrapped in `messages` or `items`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageList {
    Bare(Vec<WaMessage>),
    Wrapped {
        #[serde(default, alias = "items")]
        messages: Vec<WaMessage>,
    },
}

impl MessageList {
    pub fn into_messages(self) -> Vec<WaMessage> {
        match self {
            MessageList::Bare(messages) => messages,
            MessageList::Wrapped { messages } => messages,
        }
    }
}
