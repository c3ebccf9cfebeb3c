use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// Pinning Service API types, trimmed to what the client reads and writes
// https://ipfs.github.io/pinning-services-api-spec/

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PinStatus {
    Queued,
    Pinning,
    Pinned,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pin {
    pub cid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub origins: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PinStatusResponse {
    pub requestid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PinStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    pub pin: Pin,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delegates: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PinsListResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub results: Option<Vec<PinStatusResponse>>,
}

// IPFS Cluster REST API types

/// Cluster encodes CIDs either as plain strings or as `{"/": "<cid>"}` links
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ClusterCid {
    Plain(String),
    Link {
        #[serde(rename = "/")]
        link: String,
    },
}

impl ClusterCid {
    pub fn as_str(&self) -> &str {
        match self {
            ClusterCid::Plain(cid) => cid,
            ClusterCid::Link { link } => link,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterPin {
    pub cid: ClusterCid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}
