//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! identity backend URL, where credentials are kept, the guards' redirect
//! paths, the route table and the last email used per identity kind.
//!
//! Configuration is stored at `~/.config/jobgate/config.json`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::client::DEFAULT_BASE_URL;
use crate::auth::{CredentialStore, FileCredentialStore, IdentityKind, KeyringCredentialStore};
use crate::guard::{Redirects, RouteTable};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "jobgate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `api_base_url`
pub const ENV_API_URL: &str = "JOBGATE_API_URL";

/// Environment variable overriding `credential_backend`
pub const ENV_CREDENTIAL_BACKEND: &str = "JOBGATE_CREDENTIAL_BACKEND";

/// Where session tokens are persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    /// OS keychain
    #[default]
    Keyring,
    /// `credentials.json` in the cache directory
    File,
}

impl CredentialBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "keyring" | "keychain" => Some(CredentialBackend::Keyring),
            "file" => Some(CredentialBackend::File),
            _ => None,
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub credential_backend: CredentialBackend,
    #[serde(default)]
    pub redirects: Redirects,
    #[serde(default)]
    pub routes: RouteTable,
    #[serde(default)]
    pub last_user_email: Option<String>,
    #[serde(default)]
    pub last_company_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            credential_backend: CredentialBackend::default(),
            redirects: Redirects::default(),
            routes: RouteTable::default(),
            last_user_email: None,
            last_company_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply environment overrides on top of the file contents
    fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_CREDENTIAL_BACKEND).ok(),
        );
    }

    fn apply_overrides(&mut self, api_url: Option<String>, backend: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            debug!(url = %url, "API URL overridden from environment");
            self.api_base_url = url;
        }
        if let Some(backend) = backend.as_deref().and_then(CredentialBackend::parse) {
            self.credential_backend = backend;
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Build the configured credential store
    pub fn credential_store(&self) -> Result<Arc<dyn CredentialStore>> {
        let store: Arc<dyn CredentialStore> = match self.credential_backend {
            CredentialBackend::Keyring => Arc::new(KeyringCredentialStore::new()),
            CredentialBackend::File => Arc::new(FileCredentialStore::new(self.cache_dir()?)),
        };
        Ok(store)
    }

    pub fn last_email(&self, kind: IdentityKind) -> Option<&str> {
        match kind {
            IdentityKind::User => self.last_user_email.as_deref(),
            IdentityKind::Company => self.last_company_email.as_deref(),
        }
    }

    pub fn set_last_email(&mut self, kind: IdentityKind, email: String) {
        match kind {
            IdentityKind::User => self.last_user_email = Some(email),
            IdentityKind::Company => self.last_company_email = Some(email),
        }
    }
}
