use anyhow::{bail, Context, Result};
use url::Url;

use super::config::Protocol;

/// Basic credentials lifted out of a service URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// A resolved request URL plus the credentials that were embedded in the service URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: Url,
    pub credentials: Option<BasicCredentials>,
}

/// Extract the CID (or IPNS name) from a `<protocol>://<cid>/...` URL.
pub fn url_to_cid(protocol: Protocol, url: &str) -> Result<String> {
    let prefix = protocol.prefix();
    let Some(rest) = url.strip_prefix(&prefix) else {
        bail!("Unexpected URL, must start with {prefix}");
    };
    Ok(rest.split('/').next().unwrap_or_default().to_string())
}

/// `ipfs://<cid>/path` becomes `/ipfs/<cid>/path`.
pub fn url_to_path(url: &str) -> String {
    format!("/{}", url.replacen("://", "/", 1))
}

/// Resolve `relative` against the service URL using standard URL resolution.
/// A username/password pair on the service URL is stripped and returned separately.
pub fn service_endpoint(service: &str, relative: &str) -> Result<Endpoint> {
    let base = Url::parse(service).with_context(|| format!("Invalid service URL '{service}'"))?;
    let mut url = base
        .join(relative)
        .with_context(|| format!("Unable to resolve '{relative}' against '{service}'"))?;

    let credentials = match (url.username(), url.password()) {
        (user, Some(pass)) if !user.is_empty() && !pass.is_empty() => Some(BasicCredentials {
            username: user.to_string(),
            password: pass.to_string(),
        }),
        _ => None,
    };

    if credentials.is_some() {
        // Both setters only fail for cannot-be-a-base URLs, which `join` never yields here
        let _ = url.set_username("");
        let _ = url.set_password(None);
    }

    Ok(Endpoint { url, credentials })
}
