use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::config::ApiDialect;
use super::url::Endpoint;

/// Normalized pinned item, whatever dialect produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinItem {
    pub cid: String,
    /// `<scheme>://<cid>`
    pub url: String,
    pub name: Option<String>,
    /// Identifier used to delete the pin
    pub id: String,
}

/// Optional parameters when pinning a URL
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Defaults to the URL being pinned
    pub name: Option<String>,
    pub origins: Vec<String>,
    pub meta: BTreeMap<String, String>,
}

impl CreateOptions {
    pub fn named<T: Into<String>>(name: T) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// CRUD surface shared by all pinning service dialects
#[async_trait]
pub trait PinningApi: Send + Sync {
    fn dialect(&self) -> ApiDialect;

    /// List every pin known to the service
    async fn list(&self) -> Result<Vec<PinItem>>;

    /// Pin the content behind `url`
    async fn create(&self, url: &str, options: CreateOptions) -> Result<PinItem>;

    /// Look up the pin for `url`, if any
    async fn get(&self, url: &str) -> Result<Option<PinItem>>;

    /// Remove the pin for `url`
    async fn delete(&self, url: &str) -> Result<()>;
}

pub(crate) fn authorize(
    req: reqwest::RequestBuilder,
    endpoint: &Endpoint,
    bearer_token: Option<&str>,
) -> reqwest::RequestBuilder {
    if let Some(creds) = &endpoint.credentials {
        req.basic_auth(&creds.username, Some(&creds.password))
    } else if let Some(token) = bearer_token.filter(|t| !t.is_empty()) {
        req.bearer_auth(token)
    } else {
        req
    }
}

/// Read the body and turn non-2xx responses into errors carrying the body text.
pub(crate) async fn read_body(res: reqwest::Response) -> Result<(reqwest::StatusCode, String)> {
    let status_code = res.status();
    let status = res.error_for_status_ref().map(|_| ()).err();
    let text = res.text().await.context("reading response body")?;
    if let Some(err) = status {
        return Err(anyhow::anyhow!("{}: {}", err, text));
    }
    Ok((status_code, text))
}
