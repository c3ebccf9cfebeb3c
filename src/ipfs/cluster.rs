use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::USER_AGENT;

use super::config::{ApiDialect, Protocol};
use super::provider::{authorize, read_body, CreateOptions, PinItem, PinningApi};
use super::types::ClusterPin;
use super::url::{service_endpoint, url_to_cid, url_to_path, Endpoint};

/// Client for the IPFS Cluster REST API (`/pins/{ipfs,ipns}/<path>`)
#[derive(Clone)]
pub struct ClusterClient {
    http: Client,
    endpoint: Endpoint,
    protocol: Protocol,
    bearer_token: Option<String>,
}

impl ClusterClient {
    pub fn new(service: &str, protocol: Protocol, bearer_token: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("building reqwest client")?;
        Ok(Self {
            http,
            endpoint: service_endpoint(service, "./pins/")?,
            protocol,
            bearer_token,
        })
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        authorize(req, &self.endpoint, self.bearer_token.as_deref())
    }

    /// `pins/ipfs/<cid>` for `ipfs://<cid>`
    fn pin_url(&self, url: &str) -> Result<url::Url> {
        // Validates the scheme against the configured protocol
        url_to_cid(self.protocol, url)?;
        let relative = format!(".{}", url_to_path(url));
        self.endpoint
            .url
            .join(&relative)
            .with_context(|| format!("Unable to build pin URL for {url}"))
    }

    fn to_item(pin: ClusterPin) -> PinItem {
        // TODO: cluster reports IPNS pins by their resolved CID; surface the ipns:// name once
        // the metadata carries it.
        let cid = pin.cid.as_str().to_string();
        PinItem {
            url: format!("{}{}", Protocol::Ipfs.prefix(), cid),
            id: cid.clone(),
            cid,
            name: pin.name.filter(|n| !n.is_empty()),
        }
    }
}

/// Cluster streams pins as newline-delimited JSON objects
fn parse_ndjson(raw: &str) -> Result<Vec<ClusterPin>> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str::<ClusterPin>(line)
                .with_context(|| format!("decoding cluster pin: {line}"))
        })
        .collect()
}

#[async_trait]
impl PinningApi for ClusterClient {
    fn dialect(&self) -> ApiDialect {
        ApiDialect::Cluster
    }

    async fn list(&self) -> Result<Vec<PinItem>> {
        let req = self.http.get(self.endpoint.url.clone());
        let res = self.auth(req).send().await.context("GET /pins failed")?;
        let (status, text) = read_body(res).await?;
        if status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }

        let pins = parse_ndjson(&text)?;
        debug!("Listed {} pins from {}", pins.len(), self.endpoint.url);
        Ok(pins.into_iter().map(Self::to_item).collect())
    }

    async fn create(&self, url: &str, options: CreateOptions) -> Result<PinItem> {
        let mut post_url = self.pin_url(url)?;
        {
            let name = options.name.unwrap_or_else(|| url.to_string());
            let mut query = post_url.query_pairs_mut();
            if !name.is_empty() {
                query.append_pair("name", &name);
            }
            if !options.origins.is_empty() {
                query.append_pair("origins", &options.origins.join(","));
            }
            for (key, value) in &options.meta {
                query.append_pair(&format!("meta-{key}"), value);
            }
        }
        // An empty query_pairs_mut still leaves a trailing '?'
        if post_url.query() == Some("") {
            post_url.set_query(None);
        }

        info!("Pinning {} on cluster", url);

        let req = self.http.post(post_url);
        let res = self
            .auth(req)
            .send()
            .await
            .context("POST /pins/{path} failed")?;
        let (_, text) = read_body(res).await?;
        let pin: ClusterPin = serde_json::from_str(&text)
            .with_context(|| format!("decoding cluster pin: {text}"))?;
        Ok(Self::to_item(pin))
    }

    async fn get(&self, url: &str) -> Result<Option<PinItem>> {
        let req = self.http.get(self.pin_url(url)?);
        let res = self
            .auth(req)
            .send()
            .await
            .context("GET /pins/{path} failed")?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let (_, text) = read_body(res).await?;
        let pin: ClusterPin = serde_json::from_str(&text)
            .with_context(|| format!("decoding cluster pin: {text}"))?;
        Ok(Some(Self::to_item(pin)))
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let req = self.http.delete(self.pin_url(url)?);
        let res = self
            .auth(req)
            .send()
            .await
            .context("DELETE /pins/{path} failed")?;
        read_body(res).await?;
        info!("Unpinned {} from cluster", url);
        Ok(())
    }
}
