use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::decode;
use crate::error::MkproResult;

use super::nullable;

pub type BrandId = i64;

/// A tenant scoping chat, leads and channel connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

impl Brand {
    /// Brand list responses that are not arrays count as empty.
    pub fn list_from_value(value: Value) -> MkproResult<Vec<Brand>> {
        if value.is_array() {
            decode(value)
        } else {
            Ok(Vec::new())
        }
    }

    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            format!("Brand #{}", self.id)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewBrand<'a> {
    pub name: &'a str,
    pub tone: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatedBrand {
    #[serde(default)]
    pub id: Option<BrandId>,
}

#[derive(Debug, Serialize)]
pub struct ContextUpdate<'a> {
    pub brand_id: BrandId,
    pub context: &'a str,
}
