use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{ThemeManager, DEFAULT_THEME};

/// Value of `tui.theme` that defers to the saved preference.
pub const AUTO_THEME: &str = "auto";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(default = "default_theme_name")]
    pub theme: String,
}

fn default_theme_name() -> String {
    DEFAULT_THEME.to_string()
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            theme: default_theme_name(),
        }
    }
}

/// Reads and writes `<config_dir>/mkpro/theme.toml`.
pub struct ThemeLoader {
    config_path: PathBuf,
}

impl ThemeLoader {
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    fn default_config_path() -> PathBuf {
        mkpro_core::get_config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("theme.toml")
    }

    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn load(&self) -> Result<ThemeConfig> {
        if !self.config_path.exists() {
            return Ok(ThemeConfig::default());
        }

        let contents = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read theme config from {:?}", self.config_path))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse theme config from {:?}", self.config_path))
    }

    pub fn save_theme_name(&self, theme_name: &str) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let config = ThemeConfig {
            theme: theme_name.to_string(),
        };
        let contents =
            toml::to_string_pretty(&config).context("Failed to serialize theme config")?;

        fs::write(&self.config_path, contents)
            .with_context(|| format!("Failed to write theme config to {:?}", self.config_path))
    }

    pub fn load_theme_name(&self) -> String {
        match self.load() {
            Ok(config) => config.theme,
            Err(e) => {
                tracing::warn!("{:#}", e);
                default_theme_name()
            }
        }
    }

    /// `configured` is `tui.theme`; anything but `auto` wins over the saved file.
    pub fn initialize_theme_manager(&self, configured: &str) -> ThemeManager {
        let mut manager = ThemeManager::new();
        let theme_name = if configured.trim().eq_ignore_ascii_case(AUTO_THEME) {
            self.load_theme_name()
        } else {
            configured.to_string()
        };

        if !manager.set_theme_by_name(&theme_name) {
            tracing::warn!(
                "Theme '{}' not found, using default '{}'",
                theme_name,
                manager.current_theme_name()
            );
        }

        manager
    }
}

impl Default for ThemeLoader {
    fn default() -> Self {
        Self::new()
    }
}
