//! WhatsApp admin console: agent configuration, admin password, datasources
//! and instance maintenance for the selected brand.

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::{ApiClient, RequestOptions};
use crate::context::BrandContext;
use crate::error::{MkproError, MkproResult};
use crate::models::{
    AgentMode, BrandId, ConfigBundle, Datasource, DatasourceKind, InstanceRotation,
    SyncPullResult, TestMessage, WaConfig, DEFAULT_SUPER_KEYWORD, DEFAULT_TEMPERATURE,
};

use super::channels::{ConnectorProfile, WhatsAppConnector, WhatsAppSession};

pub const LOG_CAPACITY: usize = 200;
pub const DEFAULT_TEST_MESSAGE: &str = "Hola! Prueba desde Gestión WhatsApp";

/// Routes tried in order when saving the agent config.
const CONFIG_SAVE_ROUTES: [(&str, &str); 3] = [
    ("PUT", "/api/wa/config"),
    ("POST", "/api/wa/config/set"),
    ("POST", "/api/wa/config/save"),
];

/// Newest-first activity log.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: VecDeque<String>,
}

impl ActivityLog {
    pub fn push(&mut self, line: impl Into<String>) {
        self.entries.push_front(line.into());
        self.entries.truncate(LOG_CAPACITY);
    }

    pub fn entries(&self) -> impl Iterator<Item = &String> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.front().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Keep digits only, e.g. `+54 9 11-1234` becomes `549111234`.
pub fn sanitize_number(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Split a comma separated list, trimming entries and dropping blanks.
pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Editable copy of the agent config.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDraft {
    pub agent_mode: AgentMode,
    pub model_name: String,
    pub temperature: f64,
    pub rules_md: String,
    pub rules_json: String,
    pub super_enabled: bool,
    pub super_keyword: String,
    /// Comma separated numbers.
    pub super_allow_list: String,
    pub super_password_new: String,
    pub super_password_new2: String,
}

impl Default for ConfigDraft {
    fn default() -> Self {
        Self {
            agent_mode: AgentMode::default(),
            model_name: String::new(),
            temperature: DEFAULT_TEMPERATURE,
            rules_md: String::new(),
            rules_json: String::new(),
            super_enabled: true,
            super_keyword: DEFAULT_SUPER_KEYWORD.to_string(),
            super_allow_list: String::new(),
            super_password_new: String::new(),
            super_password_new2: String::new(),
        }
    }
}

impl ConfigDraft {
    /// Take the stored values, keeping any password being typed.
    pub fn apply_config(&mut self, config: &WaConfig) {
        self.agent_mode = config.agent_mode;
        self.model_name = config.model_name.clone().unwrap_or_default();
        self.temperature = config.temperature;
        self.rules_md = config.rules_md.clone();
        self.rules_json = config.rules_json.clone();
        self.super_enabled = config.super_enabled;
        self.super_keyword = config.super_keyword.clone();
        self.super_allow_list = config.super_allow_list.join(",");
    }

    pub fn passwords_match(&self) -> bool {
        self.super_password_new.is_empty() || self.super_password_new == self.super_password_new2
    }

    pub fn clear_passwords(&mut self) {
        self.super_password_new.clear();
        self.super_password_new2.clear();
    }

    fn to_request(&self, brand_id: BrandId) -> ConfigSaveRequest {
        let temperature = if self.temperature.is_finite() {
            self.temperature
        } else {
            DEFAULT_TEMPERATURE
        };
        let keyword = self.super_keyword.trim();

        ConfigSaveRequest {
            brand_id,
            agent_mode: self.agent_mode,
            model_name: Some(self.model_name.trim().to_string()).filter(|m| !m.is_empty()),
            temperature,
            rules_md: self.rules_md.clone(),
            rules_json: self.rules_json.clone(),
            super_enabled: self.super_enabled,
            super_keyword: if keyword.is_empty() {
                DEFAULT_SUPER_KEYWORD.to_string()
            } else {
                keyword.to_string()
            },
            super_allow_list: split_csv(&self.super_allow_list),
            super_password_new: Some(self.super_password_new.clone()).filter(|p| !p.is_empty()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ConfigSaveRequest {
    brand_id: BrandId,
    agent_mode: AgentMode,
    model_name: Option<String>,
    temperature: f64,
    rules_md: String,
    rules_json: String,
    super_enabled: bool,
    super_keyword: String,
    super_allow_list: Vec<String>,
    super_password_new: Option<String>,
}

#[derive(Debug, Serialize)]
struct PasswordChange<'a> {
    brand_id: BrandId,
    current_password: Option<&'a str>,
    new_password: &'a str,
}

/// The one draft shared by "new" and "edit".
#[derive(Debug, Clone, PartialEq)]
pub struct DatasourceDraft {
    pub id: Option<i64>,
    pub name: String,
    pub kind: DatasourceKind,
    pub url: String,
    /// JSON object of header name to value.
    pub headers: String,
    pub enabled: bool,
    pub read_only: bool,
}

impl Default for DatasourceDraft {
    fn default() -> Self {
        Self::from_datasource(&Datasource::default())
    }
}

impl DatasourceDraft {
    pub fn from_datasource(ds: &Datasource) -> Self {
        let headers = if ds.headers.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&ds.headers).unwrap_or_default()
        };
        Self {
            id: ds.id,
            name: ds.name.clone(),
            kind: ds.kind,
            url: ds.url.clone(),
            headers,
            enabled: ds.enabled,
            read_only: ds.read_only,
        }
    }

    pub fn to_datasource(&self) -> MkproResult<Datasource> {
        let headers = if self.headers.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str::<BTreeMap<String, String>>(&self.headers).map_err(|e| {
                MkproError::validation(format!("headers must be a JSON object of strings: {}", e))
            })?
        };

        Ok(Datasource {
            id: self.id,
            name: self.name.trim().to_string(),
            kind: self.kind,
            url: self.url.trim().to_string(),
            headers,
            enabled: self.enabled,
            read_only: self.read_only,
        })
    }

    fn to_body(&self, brand_id: BrandId) -> MkproResult<Value> {
        let mut body = serde_json::to_value(self.to_datasource()?)?;
        if let Some(object) = body.as_object_mut() {
            object.insert("brand_id".to_string(), Value::from(brand_id));
            if self.id.is_none() {
                object.remove("id");
            }
        }
        Ok(body)
    }
}

pub struct WaAdmin {
    client: ApiClient,
    pub config: WaConfig,
    pub draft: ConfigDraft,
    pub datasources: Vec<Datasource>,
    pub ds_draft: DatasourceDraft,
    pub status_message: Option<String>,
    pub log: ActivityLog,
    pub busy: bool,
    pub loaded: bool,
    pub session: WhatsAppSession,
}

impl WaAdmin {
    pub fn new(client: ApiClient) -> Self {
        let session = WhatsAppSession::new(
            WhatsAppConnector::new(client.clone()),
            ConnectorProfile::admin(),
        );
        Self {
            client,
            config: WaConfig::default(),
            draft: ConfigDraft::default(),
            datasources: Vec::new(),
            ds_draft: DatasourceDraft::default(),
            status_message: None,
            log: ActivityLog::default(),
            busy: false,
            loaded: false,
            session,
        }
    }

    async fn fetch_bundle(&self, brand_id: BrandId) -> MkproResult<ConfigBundle> {
        let payload = self
            .client
            .request(
                "/api/wa/config",
                RequestOptions::get().query("brand_id", brand_id),
            )
            .await?;
        ConfigBundle::from_payload(payload)
    }

    /// Load the config bundle. A missing endpoint or bad payload is logged
    /// and leaves the current values in place.
    pub async fn load(&mut self, ctx: &BrandContext) -> bool {
        let Some(brand_id) = ctx.selected else {
            return false;
        };

        match self.fetch_bundle(brand_id).await {
            Ok(bundle) => {
                self.draft.apply_config(&bundle.config);
                self.datasources = bundle.datasources;
                let instance = bundle
                    .config
                    .instance_name
                    .clone()
                    .unwrap_or_else(|| format!("brand_{}", brand_id));
                self.config = bundle.config;
                self.loaded = true;
                self.log.push(format!(
                    "Config loaded for brand {} (instance: {})",
                    brand_id, instance
                ));
                true
            }
            Err(e) => {
                debug!("GET /api/wa/config unavailable: {}", e);
                self.log.push(format!("Config load failed: {}", e));
                false
            }
        }
    }

    /// Save the agent config, trying each known route in turn.
    pub async fn save(&mut self, ctx: &BrandContext) -> MkproResult<()> {
        let brand_id = ctx.require_selected()?;
        if !self.draft.passwords_match() {
            return Err(MkproError::validation("admin passwords do not match"));
        }

        let body = serde_json::to_value(self.draft.to_request(brand_id))?;

        self.busy = true;
        let result = self.save_with_fallback(body).await;
        self.busy = false;
        result?;

        if !self.draft.super_password_new.is_empty() {
            self.config.has_password = true;
        }
        self.draft.clear_passwords();
        self.status_message = Some("Configuration saved".to_string());
        self.log.push("Configuration saved");
        Ok(())
    }

    async fn save_with_fallback(&self, body: Value) -> MkproResult<()> {
        let mut last_error = None;
        for (method, path) in CONFIG_SAVE_ROUTES {
            let options = if method == "PUT" {
                RequestOptions::put(body.clone())
            } else {
                RequestOptions::post(body.clone())
            };
            match self.client.request(path, options).await {
                Ok(_) => {
                    info!("Saved WhatsApp config via {} {}", method, path);
                    return Ok(());
                }
                Err(e) => {
                    debug!("{} {} failed, trying next route: {}", method, path, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| MkproError::Internal("no config route".to_string())))
    }

    /// Rotate the admin password. The current one is required only when a
    /// password is already set.
    pub async fn set_password(
        &mut self,
        ctx: &BrandContext,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> MkproResult<()> {
        let brand_id = ctx.require_selected()?;
        if new.is_empty() {
            return Err(MkproError::validation("enter the new password"));
        }
        if new != confirm {
            return Err(MkproError::validation("admin passwords do not match"));
        }
        if self.config.has_password && current.is_empty() {
            return Err(MkproError::validation("enter the current password"));
        }

        let body = PasswordChange {
            brand_id,
            current_password: Some(current).filter(|c| !c.is_empty()),
            new_password: new,
        };

        self.busy = true;
        let result = self
            .client
            .request(
                "/api/wa/config/set_password",
                RequestOptions::post(serde_json::to_value(&body)?),
            )
            .await;
        self.busy = false;
        result?;

        self.config.has_password = true;
        self.draft.clear_passwords();
        self.status_message = Some("Admin password updated".to_string());
        self.log.push("Admin password updated");
        Ok(())
    }

    /// Copy a listed datasource into the draft.
    pub fn edit_datasource(&mut self, index: usize) -> bool {
        match self.datasources.get(index) {
            Some(ds) => {
                self.ds_draft = DatasourceDraft::from_datasource(ds);
                true
            }
            None => false,
        }
    }

    pub fn new_datasource_draft(&mut self) {
        self.ds_draft = DatasourceDraft::default();
    }

    async fn reload_datasources(&mut self, brand_id: BrandId) {
        match self.fetch_bundle(brand_id).await {
            Ok(bundle) => self.datasources = bundle.datasources,
            Err(e) => warn!("Datasource reload failed: {}", e),
        }
    }

    pub async fn save_datasource(&mut self, ctx: &BrandContext) -> MkproResult<()> {
        let brand_id = ctx.require_selected()?;
        let body = self.ds_draft.to_body(brand_id)?;

        self.busy = true;
        let result = self
            .client
            .request("/api/wa/datasource/upsert", RequestOptions::post(body))
            .await;
        self.busy = false;
        result?;

        self.log
            .push(format!("Datasource '{}' saved", self.ds_draft.name.trim()));
        self.status_message = Some("Datasource saved".to_string());
        self.reload_datasources(brand_id).await;
        Ok(())
    }

    /// Delete a datasource. Callers must have asked the user first.
    pub async fn delete_datasource(
        &mut self,
        ctx: &BrandContext,
        id: i64,
        confirmed: bool,
    ) -> MkproResult<()> {
        let brand_id = ctx.require_selected()?;
        if !confirmed {
            return Err(MkproError::validation("confirm the deletion first"));
        }

        self.busy = true;
        let result = self
            .client
            .request(
                "/api/wa/datasource/delete",
                RequestOptions::delete(serde_json::json!({ "brand_id": brand_id, "id": id })),
            )
            .await;
        self.busy = false;
        result?;

        if self.ds_draft.id == Some(id) {
            self.new_datasource_draft();
        }
        self.log.push(format!("Datasource {} deleted", id));
        self.status_message = Some("Datasource deleted".to_string());
        self.reload_datasources(brand_id).await;
        Ok(())
    }

    /// Dry-run the draft. The raw reply becomes the status message.
    pub async fn test_datasource(&mut self, ctx: &BrandContext) -> MkproResult<String> {
        let brand_id = ctx.require_selected()?;
        let body = self.ds_draft.to_body(brand_id)?;

        self.busy = true;
        let result = self
            .client
            .request("/api/wa/datasource/test", RequestOptions::post(body))
            .await;
        self.busy = false;

        let raw = result?.to_string();
        self.status_message = Some(raw.clone());
        self.log.push(format!("Datasource test: {}", raw));
        Ok(raw)
    }

    /// Send a test message. The number is reduced to its digits.
    pub async fn send_test(&mut self, ctx: &BrandContext, to: &str, text: &str) -> MkproResult<Value> {
        let brand_id = ctx.require_selected()?;
        let to = sanitize_number(to);
        if to.is_empty() {
            return Err(MkproError::validation(
                "enter a destination number (country code, no +)",
            ));
        }

        let body = TestMessage {
            brand_id,
            to,
            text: text.to_string(),
        };

        self.busy = true;
        let result = send_test_message(&self.client, &body).await;
        self.busy = false;

        let reply = result?;
        self.status_message = Some("Test message sent".to_string());
        self.log.push(format!("Test message sent: {}", reply));
        Ok(reply)
    }

    pub async fn set_webhook(&mut self, ctx: &BrandContext) -> MkproResult<Value> {
        let brand_id = ctx.require_selected()?;
        let reply = self
            .client
            .request(
                "/api/wa/set_webhook",
                RequestOptions::get().query("brand_id", brand_id),
            )
            .await?;
        self.status_message = Some("Webhook set".to_string());
        self.log.push(format!("Webhook set: {}", reply));
        Ok(reply)
    }

    /// Pull history from the instance. Returns how many messages were saved.
    pub async fn sync_pull(&mut self, ctx: &BrandContext) -> MkproResult<u64> {
        let brand_id = ctx.require_selected()?;
        let result: SyncPullResult = self
            .client
            .send_json(
                "/api/wa/sync_pull",
                RequestOptions::post_empty().query("brand_id", brand_id),
            )
            .await?;
        let saved = result.saved.unwrap_or(0);
        self.status_message = Some(format!("Sync (pull) saved {} messages", saved));
        self.log.push(format!("Sync (pull) saved {} messages", saved));
        Ok(saved)
    }

    /// Replace the brand's instance, reload the config and watch the new
    /// instance until it connects.
    pub async fn rotate_instance(&mut self, ctx: &BrandContext) -> MkproResult<InstanceRotation> {
        let brand_id = ctx.require_selected()?;

        self.busy = true;
        let result: MkproResult<InstanceRotation> = self
            .client
            .send_json(
                "/api/wa/instance/rotate",
                RequestOptions::post_empty().query("brand_id", brand_id),
            )
            .await;
        self.busy = false;
        let rotation = result?;

        self.log.push(format!(
            "Instance rotated -> {} / webhook: {}",
            rotation.instance.as_deref().unwrap_or("-"),
            rotation.webhook.as_deref().unwrap_or("-")
        ));
        self.load(ctx).await;
        self.session
            .start_polling_with(brand_id, ConnectorProfile::instance().policy);
        Ok(rotation)
    }

    /// Instance state as reported by the backend (`state.instance` when present).
    pub async fn instance_status(&mut self, ctx: &BrandContext) -> MkproResult<Value> {
        let brand_id = ctx.require_selected()?;
        let reply = self
            .client
            .request(
                "/api/wa/instance/status",
                RequestOptions::get().query("brand_id", brand_id),
            )
            .await?;

        let state = reply
            .get("state")
            .map(|state| state.get("instance").unwrap_or(state).clone())
            .unwrap_or(Value::Null);
        self.log.push(format!("Instance status: {}", state));
        Ok(state)
    }

    /// Forget brand-scoped state, e.g. on brand change.
    pub fn reset(&mut self) {
        self.session.reset();
        self.config = WaConfig::default();
        self.draft = ConfigDraft::default();
        self.datasources.clear();
        self.ds_draft = DatasourceDraft::default();
        self.status_message = None;
        self.loaded = false;
    }
}

pub(crate) async fn send_test_message(client: &ApiClient, body: &TestMessage) -> MkproResult<Value> {
    client
        .request("/api/wa/test", RequestOptions::post(serde_json::to_value(body)?))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use serde_json::json;

    fn admin() -> WaAdmin {
        WaAdmin::new(ApiClient::new(&ApiConfig::default()).unwrap())
    }

    #[test]
    fn test_log_ring_buffer() {
        let mut log = ActivityLog::default();
        for i in 0..250 {
            log.push(format!("line {}", i));
        }
        assert_eq!(log.len(), LOG_CAPACITY);
        assert_eq!(log.latest(), Some("line 249"));
        assert_eq!(log.entries().last().map(String::as_str), Some("line 50"));
    }

    #[test]
    fn test_sanitize_and_csv() {
        assert_eq!(sanitize_number("+54 9 (11) 1234-5678"), "5491112345678");
        assert_eq!(sanitize_number("abc"), "");
        assert_eq!(split_csv(" 1, ,2 ,3,"), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_draft_request_body() {
        let mut draft = ConfigDraft::default();
        draft.super_allow_list = "5491100000000, 5491111111111".to_string();
        draft.super_keyword = "  ".to_string();

        let body = serde_json::to_value(draft.to_request(9)).unwrap();
        assert_eq!(body["brand_id"], json!(9));
        assert_eq!(body["agent_mode"], json!("ventas"));
        assert_eq!(body["model_name"], Value::Null);
        assert_eq!(body["temperature"], json!(0.2));
        assert_eq!(body["super_keyword"], json!("#admin"));
        assert_eq!(
            body["super_allow_list"],
            json!(["5491100000000", "5491111111111"])
        );
        assert_eq!(body["super_password_new"], Value::Null);
    }

    #[test]
    fn test_apply_config_keeps_typed_password() {
        let mut draft = ConfigDraft {
            super_password_new: "secret".to_string(),
            ..Default::default()
        };
        let config = WaConfig {
            agent_mode: AgentMode::Auto,
            super_allow_list: vec!["1".to_string(), "2".to_string()],
            ..Default::default()
        };
        draft.apply_config(&config);

        assert_eq!(draft.agent_mode, AgentMode::Auto);
        assert_eq!(draft.super_allow_list, "1,2");
        assert_eq!(draft.super_password_new, "secret");
    }

    #[test]
    fn test_datasource_draft_round_trip() {
        let ds = Datasource {
            id: Some(4),
            name: "stock".to_string(),
            kind: DatasourceKind::Http,
            url: "https://stock.local".to_string(),
            headers: BTreeMap::from([("Authorization".to_string(), "Bearer x".to_string())]),
            enabled: true,
            read_only: false,
        };
        let draft = DatasourceDraft::from_datasource(&ds);
        assert_eq!(draft.to_datasource().unwrap(), ds);

        let body = draft.to_body(2).unwrap();
        assert_eq!(body["brand_id"], json!(2));
        assert_eq!(body["id"], json!(4));
        assert_eq!(body["headers"]["Authorization"], json!("Bearer x"));

        let fresh = DatasourceDraft::default().to_body(2).unwrap();
        assert!(fresh.get("id").is_none());
        assert_eq!(fresh["kind"], json!("postgres"));
    }

    #[test]
    fn test_datasource_draft_bad_headers() {
        let draft = DatasourceDraft {
            headers: "Authorization: x".to_string(),
            ..Default::default()
        };
        assert!(draft.to_datasource().unwrap_err().is_validation());
    }

    #[test]
    fn test_edit_and_new_draft() {
        let mut admin = admin();
        admin.datasources = vec![Datasource {
            id: Some(1),
            name: "crm".to_string(),
            ..Default::default()
        }];

        assert!(admin.edit_datasource(0));
        assert_eq!(admin.ds_draft.id, Some(1));
        assert!(!admin.edit_datasource(5));

        admin.new_datasource_draft();
        assert_eq!(admin.ds_draft, DatasourceDraft::default());
    }

    #[tokio::test]
    async fn test_validation_blocks_before_network() {
        let mut admin = admin();
        let ctx = BrandContext::with_brand(1);

        admin.draft.super_password_new = "a".to_string();
        admin.draft.super_password_new2 = "b".to_string();
        assert!(admin.save(&ctx).await.unwrap_err().is_validation());

        assert!(admin
            .set_password(&ctx, "", "new", "other")
            .await
            .unwrap_err()
            .is_validation());

        admin.config.has_password = true;
        assert!(admin
            .set_password(&ctx, "", "new", "new")
            .await
            .unwrap_err()
            .is_validation());

        assert!(admin
            .delete_datasource(&ctx, 3, false)
            .await
            .unwrap_err()
            .is_validation());

        assert!(admin
            .send_test(&ctx, "+ -", "hola")
            .await
            .unwrap_err()
            .is_validation());
        assert!(!admin.busy);
    }
}
