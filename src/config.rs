use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::oauth2::{AuthMethod, ClientDefaults, Scope};
use crate::api::resilience::MonitoringConfig;

/// Environment variables that override the config file
pub mod env_keys {
    pub const SERVER_URL: &str = "AM_SERVER_URL";
    pub const REALM: &str = "AM_REALM";
    pub const USERNAME: &str = "AM_USERNAME";
    pub const PASSWORD: &str = "AM_PASSWORD";
    pub const CLIENT_ID: &str = "AM_CLIENT_ID";
    pub const CLIENT_SECRET: &str = "AM_CLIENT_SECRET";
    pub const AUTH_METHOD: &str = "AM_AUTH_METHOD";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Deployment base URL, e.g. `https://am.example.com/openam`
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
    /// Agent account used to obtain the session
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            realm: None,
            username: String::new(),
            password: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OAuth2Config {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub auth_method: AuthMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub oauth2: OAuth2Config,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            // Use XDG config directory on Linux
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("am-crest")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".am-crest")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file, then apply `.env` and environment overrides
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::load_from(&Self::get_config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, using defaults");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        debug!("Loaded config for server '{}'", config.server.url);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        debug!("Saving config to: {:?}", config_path);

        if let Some(config_dir) = config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir)
                    .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
                info!("Created config directory: {:?}", config_dir);
            }
        }

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Config saved successfully");
        Ok(())
    }

    /// Apply non-empty values from `lookup` over the loaded settings
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let value = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(url) = value(env_keys::SERVER_URL) {
            self.server.url = url;
        }
        if let Some(realm) = value(env_keys::REALM) {
            self.server.realm = Some(realm);
        }
        if let Some(username) = value(env_keys::USERNAME) {
            self.server.username = username;
        }
        if let Some(password) = value(env_keys::PASSWORD) {
            self.server.password = password;
        }
        if let Some(client_id) = value(env_keys::CLIENT_ID) {
            self.oauth2.client_id = client_id;
        }
        if let Some(client_secret) = value(env_keys::CLIENT_SECRET) {
            self.oauth2.client_secret = client_secret;
        }
        if let Some(method) = value(env_keys::AUTH_METHOD) {
            self.oauth2.auth_method = method
                .parse::<AuthMethod>()
                .with_context(|| format!("Invalid {}", env_keys::AUTH_METHOD))?;
        }
        Ok(())
    }

    /// Server settings, failing if no server URL is configured
    pub fn validate_server(&self) -> Result<&ServerConfig> {
        if self.server.url.trim().is_empty() {
            anyhow::bail!(
                "No AM server configured. Run 'am-crest config set-server' or set {}",
                env_keys::SERVER_URL
            );
        }
        Ok(&self.server)
    }

    /// OAuth2 client defaults for the token exchange
    pub fn client_defaults(&self) -> ClientDefaults {
        ClientDefaults {
            client_id: self.oauth2.client_id.clone(),
            client_secret: self.oauth2.client_secret.clone(),
            auth_method: self.oauth2.auth_method,
            realm: self.server.realm.clone(),
        }
    }
}
