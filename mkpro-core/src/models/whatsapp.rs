//! WhatsApp connection, agent configuration and datasource models.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::decode;
use crate::error::{MkproError, MkproResult};

use super::{nullable, value_text};

const QR_FIELDS: [&str; 9] = [
    "qr",
    "qrcode",
    "qrCode",
    "image",
    "qrImage",
    "dataUrl",
    "dataURL",
    "data_uri",
    "qr_data_url",
];
const LINK_CODE_FIELDS: [&str; 4] = ["code", "linkCode", "link", "loginCode"];
const PAIRING_CODE_FIELDS: [&str; 4] = ["pairingCode", "pairing", "pin", "code_short"];
const STATE_FIELDS: [&str; 3] = ["status", "state", "connection"];

/// Connection state reported by `/api/wa/qr`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub qr_data_url: Option<String>,
    pub link_code: Option<String>,
    pub pairing_code: Option<String>,
    /// Last payload as received.
    pub raw: Value,
}

impl ConnectionStatus {
    /// Parse a status payload.
    ///
    /// The payload must be a JSON object. `connected` is a boolean when
    /// present; otherwise `status`, `state` or `connection` equal to
    /// `connected`/`online` (any case) mean connected. Code fields are
    /// accepted under their known aliases:
    ///
    /// - QR image: the first string starting with `data:`
    /// - link code: the first string longer than 8 characters
    /// - pairing code: the first string of 4 to 16 characters
    pub fn from_payload(payload: &Value) -> MkproResult<Self> {
        let object = payload.as_object().ok_or_else(|| {
            MkproError::schema(format!(
                "connection status must be an object, got {}",
                json_kind(payload)
            ))
        })?;

        let connected = match object.get("connected") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::Null) | None => state_says_connected(object),
            Some(other) => {
                return Err(MkproError::schema(format!(
                    "`connected` must be a boolean, got {}",
                    json_kind(other)
                )))
            }
        };

        Ok(Self {
            connected,
            qr_data_url: first_string(object, &QR_FIELDS, |s| s.starts_with("data:")),
            link_code: first_string(object, &LINK_CODE_FIELDS, |s| s.chars().count() > 8),
            pairing_code: first_string(object, &PAIRING_CODE_FIELDS, |s| {
                (4..=16).contains(&s.chars().count())
            }),
            raw: payload.clone(),
        })
    }

    /// Merge a polled status: the flag always follows the latest payload,
    /// codes are overwritten only when the new payload carries them.
    pub fn merge(&mut self, newer: ConnectionStatus) {
        self.connected = newer.connected;
        if newer.qr_data_url.is_some() {
            self.qr_data_url = newer.qr_data_url;
        }
        if newer.link_code.is_some() {
            self.link_code = newer.link_code;
        }
        if newer.pairing_code.is_some() {
            self.pairing_code = newer.pairing_code;
        }
        self.raw = newer.raw;
    }

    pub fn has_code(&self) -> bool {
        self.qr_data_url.is_some() || self.link_code.is_some() || self.pairing_code.is_some()
    }
}

fn state_says_connected(object: &Map<String, Value>) -> bool {
    STATE_FIELDS
        .iter()
        .find_map(|field| object.get(*field).and_then(value_text))
        .map(|state| {
            let state = state.to_lowercase();
            state == "connected" || state == "online"
        })
        .unwrap_or(false)
}

fn first_string(
    object: &Map<String, Value>,
    fields: &[&str],
    accept: impl Fn(&str) -> bool,
) -> Option<String> {
    fields
        .iter()
        .filter_map(|field| object.get(*field).and_then(Value::as_str))
        .find(|s| accept(s))
        .map(str::to_string)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    #[default]
    Ventas,
    Reservas,
    Auto,
}

impl AgentMode {
    pub fn all() -> &'static [AgentMode] {
        &[AgentMode::Ventas, AgentMode::Reservas, AgentMode::Auto]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentMode::Ventas => "ventas",
            AgentMode::Reservas => "reservas",
            AgentMode::Auto => "auto",
        }
    }

    pub fn next(&self) -> AgentMode {
        match self {
            AgentMode::Ventas => AgentMode::Reservas,
            AgentMode::Reservas => AgentMode::Auto,
            AgentMode::Auto => AgentMode::Ventas,
        }
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentMode {
    type Err = MkproError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ventas" => Ok(AgentMode::Ventas),
            "reservas" => Ok(AgentMode::Reservas),
            "auto" => Ok(AgentMode::Auto),
            other => Err(MkproError::validation(format!(
                "unknown agent mode '{}' (expected ventas, reservas or auto)",
                other
            ))),
        }
    }
}

pub const DEFAULT_TEMPERATURE: f64 = 0.2;
pub const DEFAULT_SUPER_KEYWORD: &str = "#admin";

/// Agent configuration for one brand's WhatsApp instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaConfig {
    pub agent_mode: AgentMode,
    pub model_name: Option<String>,
    pub temperature: f64,
    pub rules_md: String,
    pub rules_json: String,
    pub super_enabled: bool,
    pub super_keyword: String,
    pub super_allow_list: Vec<String>,
    pub has_password: bool,
    pub webhook_example: Option<String>,
    pub instance_name: Option<String>,
    pub server_caps: Option<Value>,
}

impl Default for WaConfig {
    fn default() -> Self {
        Self {
            agent_mode: AgentMode::default(),
            model_name: None,
            temperature: DEFAULT_TEMPERATURE,
            rules_md: String::new(),
            rules_json: String::new(),
            super_enabled: true,
            super_keyword: DEFAULT_SUPER_KEYWORD.to_string(),
            super_allow_list: Vec::new(),
            has_password: false,
            webhook_example: None,
            instance_name: None,
            server_caps: None,
        }
    }
}

/// Everything `GET /api/wa/config` returns for a brand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigBundle {
    pub config: WaConfig,
    pub datasources: Vec<Datasource>,
}

impl ConfigBundle {
    /// Accepts `{config: {...}, datasources, ...}` or the same fields flat.
    ///
    /// Each field is read on its own: a value of an unexpected type keeps the
    /// client default instead of discarding the rest of the bundle.
    pub fn from_payload(payload: Value) -> MkproResult<Self> {
        let Value::Object(root) = payload else {
            return Err(MkproError::schema("config bundle must be an object"));
        };

        let empty = Map::new();
        let stored = match root.get("config") {
            Some(Value::Object(config)) => config,
            Some(_) => &empty,
            None => &root,
        };

        let defaults = WaConfig::default();
        let config = WaConfig {
            agent_mode: str_field(stored, "agent_mode")
                .and_then(|mode| mode.parse().ok())
                .unwrap_or(defaults.agent_mode),
            model_name: str_field(stored, "model_name")
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            temperature: stored
                .get("temperature")
                .and_then(Value::as_f64)
                .unwrap_or(defaults.temperature),
            rules_md: str_field(stored, "rules_md")
                .map(str::to_string)
                .unwrap_or_default(),
            rules_json: stored
                .get("rules_json")
                .map(rules_json_text)
                .unwrap_or_default(),
            super_enabled: stored
                .get("super_enabled")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.super_enabled),
            super_keyword: str_field(stored, "super_keyword")
                .map(str::to_string)
                .unwrap_or(defaults.super_keyword),
            super_allow_list: stored
                .get("super_allow_list_json")
                .map(allow_list_from_value)
                .unwrap_or_default(),
            has_password: root
                .get("has_password")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            webhook_example: str_field(&root, "webhook_example").map(str::to_string),
            instance_name: str_field(&root, "instance_name").map(str::to_string),
            server_caps: root.get("server_caps").filter(|caps| !caps.is_null()).cloned(),
        };

        let datasources = match root.get("datasources") {
            Some(Value::Array(rows)) => rows
                .iter()
                .filter_map(|row| decode::<Datasource>(row.clone()).ok())
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            config,
            datasources,
        })
    }
}

fn str_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

fn rules_json_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_default(),
    }
}

/// `super_allow_list_json` arrives either as an array or as a JSON string
/// holding one.
pub fn allow_list_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(value_text).collect(),
        Value::String(s) if s.trim_start().starts_with('[') => {
            match serde_json::from_str::<Value>(s) {
                Ok(parsed @ Value::Array(_)) => allow_list_from_value(&parsed),
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatasourceKind {
    #[default]
    Postgres,
    Mysql,
    Sqlite,
    Http,
}

impl DatasourceKind {
    pub fn all() -> &'static [DatasourceKind] {
        &[
            DatasourceKind::Postgres,
            DatasourceKind::Mysql,
            DatasourceKind::Sqlite,
            DatasourceKind::Http,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasourceKind::Postgres => "postgres",
            DatasourceKind::Mysql => "mysql",
            DatasourceKind::Sqlite => "sqlite",
            DatasourceKind::Http => "http",
        }
    }

    pub fn next(&self) -> DatasourceKind {
        let all = DatasourceKind::all();
        let idx = all.iter().position(|k| k == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }
}

impl fmt::Display for DatasourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasourceKind {
    type Err = MkproError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasourceKind::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| {
                MkproError::validation(format!(
                    "unknown datasource kind '{}' (expected postgres, mysql, sqlite or http)",
                    s
                ))
            })
    }
}

fn default_true() -> bool {
    true
}

/// External data source the WhatsApp agent may query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datasource {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub kind: DatasourceKind,
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub read_only: bool,
}

impl Default for Datasource {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            kind: DatasourceKind::default(),
            url: String::new(),
            headers: BTreeMap::new(),
            enabled: true,
            read_only: true,
        }
    }
}

/// Reply of `POST /api/wa/instance/rotate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceRotation {
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub webhook: Option<String>,
}

/// Reply of `POST /api/wa/sync_pull`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncPullResult {
    #[serde(default)]
    pub saved: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestMessage {
    pub brand_id: i64,
    pub to: String,
    pub text: String,
}
