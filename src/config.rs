use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::envvar::{resolve_env_placeholders, resolve_optional};
use crate::ipfs::ServiceConfig;

pub const DEFAULT_STORE_PATH: &str = "pinlist_services.json";
pub const DEFAULT_INVITE_BASE_URL: &str = "http://localhost/";

/// Application configuration, usually read from a TOML file
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Where service configurations are persisted between runs
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Page URL that invite links are built on and read from
    #[serde(default = "default_invite_base_url")]
    pub invite_base_url: String,

    /// Services that are always merged into the manager on startup
    #[serde(default, rename = "service")]
    pub services: Vec<ServiceConfig>,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

fn default_invite_base_url() -> String {
    DEFAULT_INVITE_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            invite_base_url: default_invite_base_url(),
            services: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and resolve `${VAR}` placeholders
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
        config.resolve_env_vars()?;
        debug!(
            "Loaded {} services from {}",
            config.services.len(),
            path.display()
        );
        Ok(config)
    }

    /// Service URLs and auth tokens may reference environment variables
    pub fn resolve_env_vars(&mut self) -> Result<()> {
        self.invite_base_url = resolve_env_placeholders(&self.invite_base_url)?;
        for (index, service) in self.services.iter_mut().enumerate() {
            service.service = resolve_optional(service.service.take())
                .with_context(|| format!("Resolving service URL of service #{index}"))?;
            service.auth = resolve_optional(service.auth.take())
                .with_context(|| format!("Resolving auth of service #{index}"))?;
        }
        Ok(())
    }

    pub fn invite_base_url(&self) -> Result<Url> {
        Url::parse(&self.invite_base_url)
            .with_context(|| format!("Invalid invite base URL '{}'", self.invite_base_url))
    }
}
