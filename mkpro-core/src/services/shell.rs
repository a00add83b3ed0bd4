use std::fmt;

use tracing::{debug, info, warn};

use crate::client::{ApiClient, RequestOptions};
use crate::context::BrandContext;
use crate::error::MkproResult;

use super::brands::list_brands;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    TeamChat,
    Brands,
    Channels,
    WaAdmin,
    Leads,
    WaInbox,
}

impl Tab {
    pub fn all() -> &'static [Tab] {
        &[
            Tab::TeamChat,
            Tab::Brands,
            Tab::Channels,
            Tab::WaAdmin,
            Tab::Leads,
            Tab::WaInbox,
        ]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::TeamChat => "Team Chat",
            Tab::Brands => "Brands & Context",
            Tab::Channels => "Channels",
            Tab::WaAdmin => "WhatsApp Admin",
            Tab::Leads => "Leads",
            Tab::WaInbox => "WhatsApp Inbox",
        }
    }

    pub fn index(&self) -> usize {
        Tab::all().iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<Tab> {
        Tab::all().get(index).copied()
    }

    pub fn next(&self) -> Tab {
        let all = Tab::all();
        all[(self.index() + 1) % all.len()]
    }

    pub fn prev(&self) -> Tab {
        let all = Tab::all();
        let idx = self.index();
        if idx == 0 {
            all[all.len() - 1]
        } else {
            all[idx - 1]
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Backend health as last probed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HealthState {
    #[default]
    Pending,
    Ok,
    Fail(String),
}

impl HealthState {
    pub fn label(&self) -> &str {
        match self {
            HealthState::Pending => "checking",
            HealthState::Ok => "API OK",
            HealthState::Fail(_) => "API down",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, HealthState::Ok)
    }
}

/// Top-level navigation plus the startup probes.
#[derive(Debug, Clone)]
pub struct Shell {
    client: ApiClient,
    pub active_tab: Tab,
    pub health: HealthState,
    pub brands_error: Option<String>,
}

impl Shell {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            active_tab: Tab::default(),
            health: HealthState::Pending,
            brands_error: None,
        }
    }

    /// Switch tabs. Returns `true` when the tab changed; nothing is reloaded.
    pub fn select_tab(&mut self, tab: Tab) -> bool {
        let changed = self.active_tab != tab;
        self.active_tab = tab;
        changed
    }

    pub fn next_tab(&mut self) {
        self.active_tab = self.active_tab.next();
    }

    pub fn prev_tab(&mut self) {
        self.active_tab = self.active_tab.prev();
    }

    /// Probe the backend and fetch the brand list concurrently.
    pub async fn bootstrap(&mut self, ctx: &mut BrandContext) {
        self.health = HealthState::Pending;
        let (health, brands) = tokio::join!(
            probe_health(&self.client),
            list_brands(&self.client)
        );

        self.health = health;
        match brands {
            Ok(brands) => {
                info!("Loaded {} brands", brands.len());
                self.brands_error = None;
                ctx.replace_brands(brands);
            }
            Err(e) => {
                warn!("Failed to load brands: {}", e);
                self.brands_error = Some(e.to_string());
            }
        }
    }

    pub async fn check_health(&mut self) -> &HealthState {
        self.health = probe_health(&self.client).await;
        &self.health
    }

    pub async fn reload_brands(&mut self, ctx: &mut BrandContext) -> MkproResult<()> {
        match list_brands(&self.client).await {
            Ok(brands) => {
                self.brands_error = None;
                ctx.replace_brands(brands);
                Ok(())
            }
            Err(e) => {
                self.brands_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

async fn probe_health(client: &ApiClient) -> HealthState {
    match client.request("/api/health", RequestOptions::get()).await {
        Ok(_) => HealthState::Ok,
        Err(e) => {
            debug!("Health probe failed: {}", e);
            HealthState::Fail(e.to_string())
        }
    }
}
