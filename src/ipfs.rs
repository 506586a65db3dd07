//! IPFS pinning for token metadata
//!
//! [`MetadataStorage`] pins JSON documents or files and returns the content
//! hash. Failures are reported as `None`; the caller decides which error code
//! that becomes. Nothing here is retried.

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::MetadataConfig;

const PINATA_API_BASE: &str = "https://api.pinata.cloud/pinning";

/// Which pinning endpoint a payload goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployKind {
    Json,
    File,
}

impl DeployKind {
    fn endpoint_suffix(&self) -> &'static str {
        match self {
            DeployKind::Json => "JSON",
            DeployKind::File => "File",
        }
    }
}

/// Payload to pin
#[derive(Debug, Clone)]
pub enum DeployData {
    Json(serde_json::Value),
    File { file_name: String, bytes: Vec<u8> },
}

impl DeployData {
    pub fn kind(&self) -> DeployKind {
        match self {
            DeployData::Json(_) => DeployKind::Json,
            DeployData::File { .. } => DeployKind::File,
        }
    }
}

/// Off-chain token metadata document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OffchainMetadata {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

/// Storage collaborator used by token creation and listing
#[async_trait]
pub trait MetadataStorage: Send + Sync {
    /// Pin `data`; `None` on any failure
    async fn deploy(&self, data: DeployData) -> Option<String>;

    /// Fetch and decode an off-chain metadata document
    async fn fetch_metadata(&self, uri: &str) -> Option<OffchainMetadata>;
}

/// Pinata pinning service
#[derive(Clone)]
pub struct PinataStorage {
    http: Client,
    api_key: String,
    api_secret_key: String,
}

impl PinataStorage {
    pub fn new(config: &MetadataConfig, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: config.pinata_api_key.clone().unwrap_or_default(),
            api_secret_key: config.pinata_api_secret_key.clone().unwrap_or_default(),
        })
    }

    fn pin_url(kind: DeployKind) -> String {
        format!("{}/pin{}ToIPFS", PINATA_API_BASE, kind.endpoint_suffix())
    }
}

#[derive(Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

#[async_trait]
impl MetadataStorage for PinataStorage {
    async fn deploy(&self, data: DeployData) -> Option<String> {
        let kind = data.kind();
        let req = self
            .http
            .post(Self::pin_url(kind))
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.api_secret_key);

        let req = match data {
            DeployData::Json(value) => req.json(&value),
            DeployData::File { file_name, bytes } => {
                let part = multipart::Part::bytes(bytes).file_name(file_name);
                req.multipart(multipart::Form::new().part("file", part))
            }
        };

        match req.send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<PinResponse>().await {
                Ok(body) => {
                    debug!(kind = ?kind, hash = %body.ipfs_hash, "Metadata pinned");
                    Some(body.ipfs_hash)
                }
                Err(e) => {
                    warn!("Pinata response parse error: {}", e);
                    None
                }
            },
            Ok(resp) => {
                warn!("Pinata API error: {}", resp.status());
                None
            }
            Err(e) => {
                warn!("Pinata request error: {}", e);
                None
            }
        }
    }

    async fn fetch_metadata(&self, uri: &str) -> Option<OffchainMetadata> {
        let resp = self.http.get(uri).send().await.ok()?;
        if !resp.status().is_success() {
            debug!(uri = %uri, status = %resp.status(), "Off-chain metadata unavailable");
            return None;
        }
        resp.json::<OffchainMetadata>().await.ok()
    }
}

/// Gateway URI of a pinned hash
pub fn gateway_uri(domain: &str, hash: &str) -> String {
    format!("https://{}/ipfs/{}", domain, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_urls() {
        assert_eq!(
            PinataStorage::pin_url(DeployKind::Json),
            "https://api.pinata.cloud/pinning/pinJSONToIPFS"
        );
        assert_eq!(
            PinataStorage::pin_url(DeployKind::File),
            "https://api.pinata.cloud/pinning/pinFileToIPFS"
        );
    }

    #[test]
    fn test_gateway_uri() {
        assert_eq!(
            gateway_uri("gateway.pinata.cloud", "null"),
            "https://gateway.pinata.cloud/ipfs/null"
        );
    }

    #[test]
    fn test_offchain_metadata_tolerates_missing_fields() {
        let meta: OffchainMetadata =
            serde_json::from_str(r#"{"name":"x","image":"https://img"}"#).unwrap();
        assert_eq!(meta.image.as_deref(), Some("https://img"));
        assert!(meta.description.is_none());
        assert!(meta.extensions.is_empty());
    }

    #[test]
    fn test_data_kind() {
        let file = DeployData::File {
            file_name: "logo.png".to_string(),
            bytes: vec![1, 2, 3],
        };
        assert_eq!(file.kind(), DeployKind::File);
        assert_eq!(DeployData::Json(serde_json::json!({})).kind(), DeployKind::Json);
    }
}
