use anyhow::{Context, Result};
use prettytable::{row, Table};
use tracing::{debug, error};
use url::Url;

use crate::ipfs::{ApiDialect, CreateOptions, PinItem, PinningApi, Protocol, ServiceConfig};

use super::item::PinItemView;

/// Query parameter carrying shared service configurations
pub const INVITE_PARAM: &str = "invite";

/// Pins of one configured service, plus the loading state of the last action
#[derive(Debug, Clone, Default)]
pub struct PinList {
    config: ServiceConfig,
    items: Vec<PinItem>,
    loading: bool,
    external: bool,
}

impl PinList {
    /// A blank list with nothing configured yet
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: ServiceConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Marks the configuration as owned outside the store (the config file).
    /// External lists are never persisted by [`PinManager`](super::PinManager).
    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }

    pub fn is_external(&self) -> bool {
        self.external
    }

    pub fn protocol(&self) -> Option<Protocol> {
        self.config.protocol
    }

    pub fn service(&self) -> Option<&str> {
        self.config.service.as_deref()
    }

    pub fn auth(&self) -> Option<&str> {
        self.config.auth.as_deref()
    }

    pub fn dialect(&self) -> ApiDialect {
        self.config.api
    }

    pub fn items(&self) -> &[PinItem] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Changing the protocol of an already configured list reloads it
    pub async fn set_protocol(&mut self, protocol: Protocol) -> Result<()> {
        let previous = self.config.protocol.replace(protocol);
        self.after_attribute_change(previous.is_some()).await
    }

    /// Changing the service of an already configured list reloads it
    pub async fn set_service<T: Into<String>>(&mut self, service: T) -> Result<()> {
        let previous = self.config.service.replace(service.into());
        self.after_attribute_change(previous.is_some()).await
    }

    /// Auth changes never reload; call [`PinList::refresh`] afterwards if needed.
    pub fn set_auth(&mut self, auth: Option<String>) {
        self.config.auth = auth;
    }

    // Setters borrow the list mutably, so no action can be loading at this point
    async fn after_attribute_change(&mut self, had_value: bool) -> Result<()> {
        if had_value {
            self.refresh().await?;
        }
        Ok(())
    }

    /// Called when the list gets attached to a manager
    pub async fn connect(&mut self) -> Result<()> {
        if self.config.protocol.is_some() {
            self.refresh().await?;
        }
        Ok(())
    }

    /// A fresh client built from the current configuration
    pub fn api(&self) -> Result<Box<dyn PinningApi>> {
        self.config.create_client()
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.set_loading(true);
        let result = match self.api() {
            Ok(api) => api.list().await,
            Err(e) => Err(e),
        };
        self.set_loading(false);

        match result {
            Ok(items) => {
                debug!(
                    "Refreshed {} pins for {}",
                    items.len(),
                    self.service().unwrap_or("-")
                );
                self.render_items(items);
                Ok(())
            }
            Err(e) => {
                error!("Unable to refresh: {e:#}");
                Err(e.context("Unable to refresh"))
            }
        }
    }

    pub async fn add(&mut self, url: &str) -> Result<()> {
        self.add_with(url, CreateOptions::default()).await
    }

    pub async fn add_with(&mut self, url: &str, options: CreateOptions) -> Result<()> {
        self.set_loading(true);
        let result = match self.api() {
            Ok(api) => api.create(url, options).await.map(|_| ()),
            Err(e) => Err(e),
        };
        let result = match result {
            Ok(()) => self.refresh().await,
            Err(e) => Err(e),
        };
        self.set_loading(false);

        result.map_err(|e| {
            error!("Unable to add {url}: {e:#}");
            e.context(format!("Unable to add {url}"))
        })
    }

    pub async fn remove(&mut self, url: &str) -> Result<()> {
        self.set_loading(true);
        let result = match self.api() {
            Ok(api) => api.delete(url).await,
            Err(e) => Err(e),
        };
        let result = match result {
            Ok(()) => self.refresh().await,
            Err(e) => Err(e),
        };
        self.set_loading(false);

        result.map_err(|e| {
            error!("Unable to remove {url}: {e:#}");
            e.context(format!("Unable to remove {url}"))
        })
    }

    pub fn render_items(&mut self, items: Vec<PinItem>) {
        self.items = items;
    }

    pub fn views(&self) -> impl Iterator<Item = PinItemView<'_>> {
        self.items.iter().map(PinItemView::new)
    }

    pub fn render(&self) -> Table {
        let mut table = Table::new();
        table.add_row(row!["#", "URL", "Name", "ID"]);
        for (index, view) in self.views().enumerate() {
            table.add_row(view.row(index));
        }
        table
    }

    /// `page` with `?invite=[<this list's config>]`, replacing any previous invite.
    pub fn invite_link(&self, page: &Url) -> Result<Url> {
        let encoded =
            serde_json::to_string(&[self.to_config()]).context("encoding invite data")?;

        let kept: Vec<(String, String)> = page
            .query_pairs()
            .filter(|(key, _)| key != INVITE_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        let mut url = page.clone();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(INVITE_PARAM, &encoded);
        Ok(url)
    }

    pub fn to_config(&self) -> ServiceConfig {
        self.config.clone()
    }
}
