use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::BrandId;

/// A scored lead as returned by ingest and listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub profile_json: Option<Value>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Lead {
    /// Profile text when the backend returned one, otherwise the free notes.
    pub fn notes_text(&self) -> String {
        match &self.profile_json {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Null) | None => self.notes.clone().unwrap_or_default(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LeadIngest<'a> {
    pub brand_id: BrandId,
    pub raw_text: &'a str,
    pub channel: &'static str,
}

/// Listing responses come either bare or wrapped in `items`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LeadPage {
    Bare(Vec<Lead>),
    Wrapped {
        #[serde(default)]
        items: Vec<Lead>,
    },
}

impl LeadPage {
    pub fn into_items(self) -> Vec<Lead> {
        match self {
            LeadPage::Bare(items) => items,
            LeadPage::Wrapped { items } => items,
        }
    }
}
