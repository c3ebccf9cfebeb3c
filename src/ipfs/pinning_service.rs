use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::USER_AGENT;

use super::config::{ApiDialect, Protocol};
use super::provider::{authorize, read_body, CreateOptions, PinItem, PinningApi};
use super::types::{Pin, PinStatusResponse, PinsListResponse};
use super::url::{service_endpoint, url_to_cid, Endpoint};

#[derive(Clone)]
pub struct IpfsPinningClient {
    http: Client,
    endpoint: Endpoint,
    protocol: Protocol,
    bearer_token: Option<String>,
}

// Minimal client for interacting with the IPFS Pinning Service API
// https://ipfs.github.io/pinning-services-api-spec/
impl IpfsPinningClient {
    pub fn new(service: &str, protocol: Protocol, bearer_token: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("building reqwest client")?;
        Ok(Self {
            http,
            endpoint: service_endpoint(service, "./pins")?,
            protocol,
            bearer_token,
        })
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        authorize(req, &self.endpoint, self.bearer_token.as_deref())
    }

    fn pin_url(&self, request_id: &str) -> Result<url::Url> {
        let mut url = self.endpoint.url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("service URL cannot be a base: {}", self.endpoint.url))?
            .pop_if_empty()
            .push(request_id);
        Ok(url)
    }

    fn to_item(&self, status: PinStatusResponse) -> PinItem {
        PinItem {
            url: format!("{}{}", self.protocol.prefix(), status.pin.cid),
            cid: status.pin.cid,
            name: status.pin.name,
            id: status.requestid,
        }
    }
}

#[async_trait]
impl PinningApi for IpfsPinningClient {
    fn dialect(&self) -> ApiDialect {
        ApiDialect::PinningService
    }

    async fn list(&self) -> Result<Vec<PinItem>> {
        let req = self.http.get(self.endpoint.url.clone());
        let res = self.auth(req).send().await.context("GET /pins failed")?;
        let (status, text) = read_body(res).await?;
        if status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }

        let parsed: PinsListResponse = serde_json::from_str(&text)
            .with_context(|| format!("decoding PinsListResponse: {text}"))?;
        let results = parsed.results.unwrap_or_default();
        debug!("Listed {} pins from {}", results.len(), self.endpoint.url);

        Ok(results.into_iter().map(|r| self.to_item(r)).collect())
    }

    async fn create(&self, url: &str, options: CreateOptions) -> Result<PinItem> {
        let pin = Pin {
            cid: url_to_cid(self.protocol, url)?,
            name: Some(options.name.unwrap_or_else(|| url.to_string())),
            origins: options.origins,
            meta: options.meta,
        };

        info!("Pinning {} as {:?}", pin.cid, pin.name);

        let req = self.http.post(self.endpoint.url.clone()).json(&pin);
        let res = self.auth(req).send().await.context("POST /pins failed")?;
        let (_, text) = read_body(res).await?;
        let parsed: PinStatusResponse = serde_json::from_str(&text)
            .with_context(|| format!("decoding PinStatusResponse: {text}"))?;
        Ok(self.to_item(parsed))
    }

    async fn get(&self, url: &str) -> Result<Option<PinItem>> {
        let cid = url_to_cid(self.protocol, url)?;
        let pins = self.list().await?;
        Ok(pins.into_iter().find(|pin| pin.cid == cid))
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let pin = self
            .get(url)
            .await?
            .with_context(|| format!("No pin found for {url}"))?;

        let req = self.http.delete(self.pin_url(&pin.id)?);
        let res = self
            .auth(req)
            .send()
            .await
            .context("DELETE /pins/{id} failed")?;
        read_body(res).await?;
        info!("Unpinned {} (request {})", pin.cid, pin.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::ipfs::{CreateOptions, IpfsPinningClient, PinningApi, Protocol};
    use crate::USER_AGENT;
    use wiremock::matchers::{
        body_json, body_partial_json, header, header_exists, method, path,
    };
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn example_pin_status_response() -> serde_json::Value {
        serde_json::json!({
            "requestid": "req-123",
            "status": "pinned",
            "created": "2020-07-23T15:46:27.390Z",
            "pin": {
                "cid": "bafybeigdyrzt5v276s3jvq7j4q6vti7",
                "name": "my-pin",
                "origins": [],
                "meta": {"app": "pinlist"}
            },
            "delegates": ["/ip4/203.0.113.1/tcp/4001/p2p/12D3KooW"],
            "info": null
        })
    }

    #[tokio::test]
    async fn list_normalizes_results() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/pins"))
            .and(header("user-agent", USER_AGENT))
            .and(header("authorization", "Bearer token123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 1u64,
                "results": [example_pin_status_response()]
            })))
            .mount(&server)
            .await;

        let client =
            IpfsPinningClient::new(&server.uri(), Protocol::Ipfs, Some("token123".into()))
                .unwrap();
        let items = client.list().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].cid, "bafybeigdyrzt5v276s3jvq7j4q6vti7");
        assert_eq!(items[0].url, "ipfs://bafybeigdyrzt5v276s3jvq7j4q6vti7");
        assert_eq!(items[0].name.as_deref(), Some("my-pin"));
        assert_eq!(items[0].id, "req-123");
    }

    #[tokio::test]
    async fn list_handles_no_content_and_missing_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pins"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        let client = IpfsPinningClient::new(&server.uri(), Protocol::Ipfs, None).unwrap();
        assert!(client.list().await.unwrap().is_empty());

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pins"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 0
            })))
            .mount(&server)
            .await;
        let client = IpfsPinningClient::new(&server.uri(), Protocol::Ipfs, None).unwrap();
        assert!(client.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_surfaces_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pins"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let client = IpfsPinningClient::new(&server.uri(), Protocol::Ipfs, None).unwrap();
        let err = client.list().await.unwrap_err();
        assert!(err.to_string().contains("bad token"));
    }

    #[tokio::test]
    async fn url_credentials_become_basic_auth() {
        let server = MockServer::start().await;
        // alice:s3cret
        Mock::given(method("GET"))
            .and(path("/pins"))
            .and(header("authorization", "Basic YWxpY2U6czNjcmV0"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let service = server.uri().replacen("http://", "http://alice:s3cret@", 1);
        let client =
            IpfsPinningClient::new(&service, Protocol::Ipfs, Some("ignored".into())).unwrap();
        client.list().await.unwrap();
    }

    #[tokio::test]
    async fn create_posts_cid_and_default_name() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/pins"))
            .and(header("user-agent", USER_AGENT))
            .and(body_json(serde_json::json!({
                "cid": "bafybeigdyrzt5v276s3jvq7j4q6vti7",
                "name": "ipfs://bafybeigdyrzt5v276s3jvq7j4q6vti7/index.html"
            })))
            .respond_with(
                ResponseTemplate::new(202).set_body_json(example_pin_status_response()),
            )
            .mount(&server)
            .await;

        let client = IpfsPinningClient::new(&server.uri(), Protocol::Ipfs, None).unwrap();
        let item = client
            .create(
                "ipfs://bafybeigdyrzt5v276s3jvq7j4q6vti7/index.html",
                CreateOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(item.id, "req-123");
    }

    #[tokio::test]
    async fn create_forwards_options() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/pins"))
            .and(body_partial_json(serde_json::json!({
                "cid": "bafy1",
                "name": "named",
                "origins": ["/dnsaddr/node.example.com"],
                "meta": {"app": "pinlist"}
            })))
            .respond_with(
                ResponseTemplate::new(202).set_body_json(example_pin_status_response()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = IpfsPinningClient::new(&server.uri(), Protocol::Ipfs, None).unwrap();
        let mut options = CreateOptions::named("named");
        options.origins.push("/dnsaddr/node.example.com".into());
        options.meta.insert("app".into(), "pinlist".into());
        client.create("ipfs://bafy1", options).await.unwrap();
    }

    #[tokio::test]
    async fn create_rejects_foreign_scheme() {
        let client = IpfsPinningClient::new("http://127.0.0.1:9/", Protocol::Ipfs, None).unwrap();
        let err = client
            .create("https://example.com/x", CreateOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("must start with ipfs://"));
    }

    #[tokio::test]
    async fn get_filters_by_cid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pins"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 1u64,
                "results": [example_pin_status_response()]
            })))
            .mount(&server)
            .await;

        let client = IpfsPinningClient::new(&server.uri(), Protocol::Ipfs, None).unwrap();
        let found = client
            .get("ipfs://bafybeigdyrzt5v276s3jvq7j4q6vti7/a.png")
            .await
            .unwrap();
        assert_eq!(found.map(|p| p.id), Some("req-123".to_string()));

        let missing = client.get("ipfs://bafyother").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn delete_resolves_request_id() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/pins"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 1u64,
                "results": [example_pin_status_response()]
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/pins/req-123"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let client = IpfsPinningClient::new(&server.uri(), Protocol::Ipfs, None).unwrap();
        client
            .delete("ipfs://bafybeigdyrzt5v276s3jvq7j4q6vti7")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_unknown_pin_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pins"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = IpfsPinningClient::new(&server.uri(), Protocol::Ipfs, None).unwrap();
        let err = client.delete("ipfs://bafymissing").await.unwrap_err();
        assert_eq!(err.to_string(), "No pin found for ipfs://bafymissing");
    }
}
