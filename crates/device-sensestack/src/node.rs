//! HTTP status client for a single SenseStack node.

use crate::error::Error;
use reqwest::{Client, StatusCode};
use stackctl_core::NodeInfo;
use std::time::Duration;
use tracing::debug;

/// Client for one node's `/getNodeInfo` endpoint.
///
/// `base` is the node's base address as produced by discovery, or assembled
/// from a manually entered IP.
pub struct NodeClient {
    base: String,
    client: Client,
}

impl NodeClient {
    pub fn new(base: impl Into<String>) -> Result<Self, Error> {
        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
        Ok(Self {
            base: base.into(),
            client,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    async fn fetch_info(&self) -> Result<(StatusCode, String), Error> {
        let url = format!("{}/getNodeInfo", self.base);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// Fetch the node's status snapshot.
    ///
    /// `Ok(None)` means the address answered, but not like a SenseStack node
    /// (non-200). Transport failures and undecodable payloads stay errors so
    /// callers can tell unreachable, wrong device, and bad payload apart.
    pub async fn node_info(&self) -> Result<Option<NodeInfo>, Error> {
        let (status, body) = self.fetch_info().await?;
        if status != StatusCode::OK {
            debug!("{} answered {} to getNodeInfo", self.base, status);
            return Ok(None);
        }
        let info = serde_json::from_str(&body).map_err(Error::InvalidPayload)?;
        Ok(Some(info))
    }

    /// Status fetch for an already-confirmed node: every miss is an error,
    /// including an unexpected HTTP status.
    pub async fn status(&self) -> Result<NodeInfo, Error> {
        let (status, body) = self.fetch_info().await?;
        if status != StatusCode::OK {
            return Err(Error::Status(status));
        }
        serde_json::from_str(&body).map_err(Error::InvalidPayload)
    }

    /// Quick reachability probe.
    pub async fn is_online(&self) -> bool {
        match self.node_info().await {
            Ok(Some(_)) => true,
            Ok(None) => false,
            Err(e) => {
                debug!("node at {} is offline: {}", self.base, e);
                false
            }
        }
    }
}
