use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MkproConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub tui: TuiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_poll_max_ticks")]
    pub max_ticks: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,

    #[serde(default)]
    pub file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuiConfig {
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate_ms: u64,

    #[serde(default = "default_theme")]
    pub theme: String,

    #[serde(default = "default_true")]
    pub mouse_enabled: bool,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_poll_interval_ms() -> u64 {
    3_000
}

fn default_poll_max_ticks() -> u32 {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_refresh_rate() -> u64 {
    250
}

fn default_theme() -> String {
    "auto".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            max_ticks: default_poll_max_ticks(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: String::new(),
        }
    }
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: default_refresh_rate(),
            theme: default_theme(),
            mouse_enabled: true,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl MkproConfig {
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from_paths(get_config_paths())
    }

    pub fn load_from_paths(paths: Vec<PathBuf>) -> Result<Self, ConfigLoadError> {
        load_dotenv_files();

        let mut builder = ConfigBuilder::builder();

        for path in paths {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("MKPRO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;

        let mut mkpro_config: MkproConfig = config.try_deserialize()?;
        mkpro_config.apply_env_overrides();
        mkpro_config.validate()?;

        Ok(mkpro_config)
    }

    /// Flat environment variables that predate the nested `MKPRO_API__*` form.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("MKPRO_API_BASE") {
            self.api.base_url = url;
        } else if let Ok(url) = std::env::var("MKPRO_API_BASE_URL") {
            self.api.base_url = url;
        }

        if let Ok(key) = std::env::var("MKPRO_API_KEY") {
            self.api.api_key = if key.trim().is_empty() {
                None
            } else {
                Some(key)
            };
        }

        if let Ok(timeout) = std::env::var("MKPRO_API_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.api.timeout_ms = ms;
            }
        }

        if let Ok(level) = std::env::var("MKPRO_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigLoadError::MissingRequired("api.base_url".to_string()));
        }

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(ConfigLoadError::InvalidValue {
                key: "api.base_url".to_string(),
                message: "Must start with http:// or https://".to_string(),
            });
        }

        if self.api.timeout_ms == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "api.timeout_ms".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.polling.interval_ms == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "polling.interval_ms".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.polling.max_ticks == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "polling.max_ticks".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        let level_lower = self.logging.level.to_lowercase();
        if !valid_levels.contains(&level_lower.as_str()) && !level_lower.contains('=') {
            return Err(ConfigLoadError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Must be one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        &self.api.base_url
    }

    pub fn log_level(&self) -> &str {
        &self.logging.level
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("config").join("default.toml"));
        paths.push(cwd.join("config").join("local.toml"));
        paths.push(cwd.join("mkpro.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("mkpro").join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".mkpro").join("config.toml"));
    }

    paths
}

fn load_dotenv_files() {
    for path in get_dotenv_paths() {
        if path.exists() {
            let _ = dotenvy::from_path(&path);
        }
    }
}

fn get_dotenv_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".env"));
        paths.push(cwd.join(".env.local"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("mkpro").join(".env"));
    }

    paths
}

pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mkpro"))
}

pub fn get_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("mkpro"))
}

pub fn ensure_data_dir() -> Result<PathBuf, std::io::Error> {
    let data_dir = get_data_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine data directory",
        )
    })?;

    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
    }

    Ok(data_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = MkproConfig::default();

        assert_eq!(config.api.base_url, "http://127.0.0.1:8000");
        assert!(config.api.api_key.is_none());
        assert_eq!(config.api.timeout(), Duration::from_secs(20));
        assert_eq!(config.polling.interval(), Duration::from_secs(3));
        assert_eq!(config.polling.max_ticks, 20);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert_eq!(config.tui.refresh_rate_ms, 250);
        assert_eq!(config.tui.theme, "auto");
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(MkproConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_empty_base_url() {
        let mut config = MkproConfig::default();
        config.api.base_url = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigLoadError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_validation_non_http_base_url() {
        let mut config = MkproConfig::default();
        config.api.base_url = "ftp://backend".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_values() {
        let mut config = MkproConfig::default();
        config.api.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = MkproConfig::default();
        config.polling.interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = MkproConfig::default();
        config.polling.max_ticks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_log_levels() {
        let mut config = MkproConfig::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "mkpro_core=debug,reqwest=warn".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mkpro.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"https://api.example.test\"\ntimeout_ms = 5000\n\n[polling]\nmax_ticks = 30"
        )
        .unwrap();

        let config = MkproConfig::load_from_paths(vec![path]).unwrap();
        assert_eq!(config.polling.max_ticks, 30);
        assert_eq!(config.polling.interval_ms, 3_000);
        if std::env::var("MKPRO_API_BASE").is_err() && std::env::var("MKPRO_API_BASE_URL").is_err()
        {
            assert_eq!(config.api.base_url, "https://api.example.test");
        }
    }

    #[test]
    fn test_directory_helpers() {
        assert!(get_config_dir().is_some());
        assert!(get_data_dir().is_some());
    }
}
