use std::collections::HashSet;

use anyhow::{Context, Result};
use tracing::{info, warn};
use url::Url;

use crate::ipfs::ServiceConfig;
use crate::store::KeyValueStore;

use super::list::{PinList, INVITE_PARAM};

/// Storage key holding the JSON array of service configurations
pub const PINNING_SERVICES: &str = "pinning_services";

/// Owns the pin lists and keeps their configurations in a [`KeyValueStore`]
#[derive(Debug)]
pub struct PinManager<S> {
    store: S,
    lists: Vec<PinList>,
    connect_on_load: bool,
}

impl<S: KeyValueStore> PinManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            lists: Vec::new(),
            connect_on_load: true,
        }
    }

    /// Whether lists created by [`PinManager::merge`] are refreshed right away
    pub fn connect_on_load(mut self, connect: bool) -> Self {
        self.connect_on_load = connect;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn lists(&self) -> &[PinList] {
        &self.lists
    }

    pub fn list_mut(&mut self, index: usize) -> Option<&mut PinList> {
        self.lists.get_mut(index)
    }

    pub fn lists_mut(&mut self) -> &mut [PinList] {
        &mut self.lists
    }

    /// Saved configurations followed by the ones shared through `page`'s invite parameter
    pub async fn load(&mut self, page: Option<&Url>) -> usize {
        let mut all = self.saved();
        if let Some(page) = page {
            all.extend(Self::from_invite(page));
        }
        self.merge(all).await
    }

    /// Append a list per configuration, skipping services (with the same auth) already present.
    /// Returns how many lists were added.
    pub async fn merge(&mut self, configs: Vec<ServiceConfig>) -> usize {
        self.merge_lists(configs, false).await
    }

    /// Like [`PinManager::merge`], for configurations owned elsewhere (the config file).
    /// Their lists are usable but left out of [`PinManager::persisted`].
    pub async fn merge_external(&mut self, configs: Vec<ServiceConfig>) -> usize {
        self.merge_lists(configs, true).await
    }

    async fn merge_lists(&mut self, configs: Vec<ServiceConfig>, external: bool) -> usize {
        let mut seen: HashSet<(Option<String>, Option<String>)> = self
            .lists
            .iter()
            .map(|list| owned_key(&list.to_config()))
            .collect();

        let mut added = 0;
        for config in configs {
            if !seen.insert(owned_key(&config)) {
                continue;
            }
            let mut list = PinList::from_config(config);
            if external {
                list = list.external();
            }
            if self.connect_on_load {
                // A failing service must not keep the others from loading
                if let Err(e) = list.connect().await {
                    warn!("{e:#}");
                }
            }
            self.lists.push(list);
            added += 1;
        }

        if added > 0 {
            info!("Loaded {added} pinning services");
        }
        added
    }

    /// Add a blank, unconfigured list
    pub fn add_list(&mut self) -> &mut PinList {
        self.add_list_with(ServiceConfig::default())
    }

    pub fn add_list_with(&mut self, config: ServiceConfig) -> &mut PinList {
        self.lists.push(PinList::from_config(config));
        let last = self.lists.len() - 1;
        &mut self.lists[last]
    }

    pub fn remove_list(&mut self, index: usize) -> Option<PinList> {
        if index < self.lists.len() {
            Some(self.lists.remove(index))
        } else {
            None
        }
    }

    /// Configurations of the current lists, in order
    pub fn existing(&self) -> Vec<ServiceConfig> {
        self.lists.iter().map(PinList::to_config).collect()
    }

    /// Configurations of the lists the store owns, i.e. all but the external ones
    pub fn persisted(&self) -> Vec<ServiceConfig> {
        self.lists
            .iter()
            .filter(|list| !list.is_external())
            .map(PinList::to_config)
            .collect()
    }

    pub fn save(&mut self, configs: &[ServiceConfig]) -> Result<()> {
        let encoded = serde_json::to_string(configs).context("encoding pinning services")?;
        self.store
            .set_item(PINNING_SERVICES, &encoded)
            .context("Failed to save pinning services")
    }

    /// Persist whatever lists exist right now, external ones excepted
    pub fn save_existing(&mut self) -> Result<()> {
        let configs = self.persisted();
        self.save(&configs)
    }

    pub fn saved(&self) -> Vec<ServiceConfig> {
        let raw = match self.store.get_item(PINNING_SERVICES) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Error reading saved services: {e:#}");
                return Vec::new();
            }
        };

        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => decode_configs(value, "saved services").unwrap_or_else(|| {
                warn!("Saved services are not a list, ignoring them");
                Vec::new()
            }),
            Err(e) => {
                warn!("Error parsing saved services: {e}");
                Vec::new()
            }
        }
    }

    /// Configurations carried by the `invite` query parameter of `page`
    pub fn from_invite(page: &Url) -> Vec<ServiceConfig> {
        let Some((_, raw)) = page.query_pairs().find(|(key, _)| key == INVITE_PARAM) else {
            return Vec::new();
        };
        serde_json::from_str::<serde_json::Value>(&raw)
            .ok()
            .and_then(|value| decode_configs(value, "invite"))
            .unwrap_or_default()
    }
}

fn owned_key(config: &ServiceConfig) -> (Option<String>, Option<String>) {
    let (service, auth) = config.dedup_key();
    (service.map(String::from), auth.map(String::from))
}

/// `None` when the value is not an array; undecodable entries are dropped.
fn decode_configs(value: serde_json::Value, source: &str) -> Option<Vec<ServiceConfig>> {
    let serde_json::Value::Array(entries) = value else {
        return None;
    };
    let configs = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<ServiceConfig>(entry) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Skipping invalid service in {source}: {e}");
                None
            }
        })
        .collect();
    Some(configs)
}
