use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::ipfs::ServiceConfig;
use crate::pins::PinManager;
use crate::store::FileStore;

/// Reads the optional config file and applies command line overrides
pub fn load_settings(
    config_path: Option<&Path>,
    store_override: Option<PathBuf>,
) -> Result<Config> {
    let mut config = match config_path {
        Some(path) => Config::load_from_file(path).context("Failed to load config")?,
        None => Config::default(),
    };
    if let Some(store_path) = store_override {
        config.store_path = store_path;
    }
    Ok(config)
}

/// Builds the manager from the services of the config file, the persisted services
/// and those shared through `invite`, in that order.
///
/// Config file services stay external: they are never written to the store, and a
/// stored entry for the same service URL is superseded by the config file entry.
pub async fn open_manager(config: &Config, invite: Option<&str>) -> Result<PinManager<FileStore>> {
    let invite = invite
        .map(|raw| Url::parse(raw).with_context(|| format!("Invalid invite link '{raw}'")))
        .transpose()?;

    let mut manager =
        PinManager::new(FileStore::new(config.store_path.clone())).connect_on_load(false);
    manager.merge_external(config.services.clone()).await;

    let mut all: Vec<ServiceConfig> = manager
        .saved()
        .into_iter()
        .filter(|saved| {
            let superseded = saved.service.is_some()
                && config.services.iter().any(|c| c.service == saved.service);
            if superseded {
                debug!(
                    "Stored service {} is configured in the config file",
                    saved.service.as_deref().unwrap_or("-")
                );
            }
            !superseded
        })
        .collect();
    if let Some(page) = &invite {
        let invited = PinManager::<FileStore>::from_invite(page);
        info!("Invite link carries {} services", invited.len());
        all.extend(invited);
    }
    manager.merge(all).await;
    Ok(manager)
}
