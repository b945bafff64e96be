use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::auth::Credential;
use crate::error::ConfigError;
use crate::utils::normalize_url;

const CONFIG_FILE: &str = "storefront-chat.toml";
pub const URL_ENV: &str = "STOREFRONT_CHAT_URL";
pub const TOKEN_ENV: &str = "STOREFRONT_CHAT_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl AppConfig {
    pub fn path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join(CONFIG_FILE))
    }

    /// Loads the config file, then applies environment overrides. A missing
    /// or unreadable file yields defaults.
    pub fn load() -> Self {
        let mut config = match Self::path() {
            Some(path) => Self::load_from(&path).unwrap_or_else(|e| {
                debug!("using default config ({}): {}", path.display(), e);
                Self::default()
            }),
            None => Self::default(),
        };
        config.apply_env();
        config
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(std::env::var(URL_ENV).ok(), std::env::var(TOKEN_ENV).ok());
    }

    /// Replaces the URL and token with any non-blank value given.
    pub fn apply_overrides(&mut self, url: Option<String>, token: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token);
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("could not create {}: {}", parent.display(), e);
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Base URL with a scheme, or `None` when none is configured.
    pub fn server_url(&self) -> Option<String> {
        if self.base_url.trim().is_empty() { None } else { Some(normalize_url(&self.base_url)) }
    }

    pub fn credential(&self) -> Option<Credential> {
        self.token.clone().and_then(Credential::new)
    }
}
