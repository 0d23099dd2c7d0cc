use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::auth::RestIdentity;
use crate::store::RestStore;

/// Application configuration for the remote backends.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the document store.
    pub store_url: String,
    /// Auth token appended to document store requests.
    pub store_auth_token: Option<String>,
    /// Base URL of the identity provider API.
    pub auth_url: String,
    /// API key for the identity provider.
    pub auth_api_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_url: "http://localhost:9000".to_string(),
            store_auth_token: None,
            auth_url: "https://identitytoolkit.googleapis.com/v1".to_string(),
            auth_api_key: String::new(),
        }
    }
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            config = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;
        }

        if let Ok(store_url) = std::env::var("FLASHDECK_STORE_URL") {
            config.store_url = store_url;
        }
        if let Ok(token) = std::env::var("FLASHDECK_STORE_AUTH_TOKEN") {
            config.store_auth_token = Some(token);
        }
        if let Ok(auth_url) = std::env::var("FLASHDECK_AUTH_URL") {
            config.auth_url = auth_url;
        }
        if let Ok(api_key) = std::env::var("FLASHDECK_AUTH_API_KEY") {
            config.auth_api_key = api_key;
        }

        Ok(config)
    }

    /// Default config file path: ~/.config/flashdeck/config.yaml
    pub fn default_config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join(".config")
            .join("flashdeck")
            .join("config.yaml")
    }

    /// Builds the document store client this config describes.
    pub fn document_store(&self) -> RestStore {
        let store = RestStore::new(&self.store_url);
        match &self.store_auth_token {
            Some(token) => store.with_auth_token(token),
            None => store,
        }
    }

    /// Builds the identity provider client this config describes.
    pub fn identity_provider(&self) -> RestIdentity {
        RestIdentity::with_base_url(&self.auth_url, &self.auth_api_key)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {1}", .0.display())]
    ReadError(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config file '{}': {1}", .0.display())]
    ParseError(PathBuf, #[source] serde_yaml::Error),
}
