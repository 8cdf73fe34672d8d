//! Public address discovery.
//!
//! # Responsibilities
//! - Ask an external IP-echo service for the node's observed IPv4 address
//! - Compose the node multi-address from that IP, the transport port and the key
//!
//! # Design Decisions
//! - One outbound call, no retry; a failure here is fatal to startup
//! - The lookup sits behind [`IpLookup`] so startup can run without the internet

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;

use crate::blockchain::KeyMaterial;
use crate::config::IdentityConfig;
use crate::identity::{IdentityError, MultiAddress};

/// Source of the node's public IP address.
#[async_trait]
pub trait IpLookup: Send + Sync {
    /// Raw response body of the lookup. Callers trim and validate it.
    async fn public_ip(&self) -> Result<String, IdentityError>;
}

/// [`IpLookup`] backed by an HTTP IP-echo service such as `https://ipinfo.io/ip`.
#[derive(Debug, Clone)]
pub struct HttpIpLookup {
    client: reqwest::Client,
    url: String,
}

impl HttpIpLookup {
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.lookup_timeout_secs))
            .build()
            .map_err(|e| IdentityError::NetworkDiscovery(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.ip_lookup_url.clone(),
        })
    }
}

#[async_trait]
impl IpLookup for HttpIpLookup {
    async fn public_ip(&self) -> Result<String, IdentityError> {
        let lookup_failed = |e: reqwest::Error| {
            IdentityError::NetworkDiscovery(format!("IP lookup via {} failed: {}", self.url, e))
        };

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(lookup_failed)?
            .error_for_status()
            .map_err(lookup_failed)?;

        response.text().await.map_err(lookup_failed)
    }
}

/// Derive the node's multi-address from its key material and transport port.
pub async fn resolve_address(
    key: &KeyMaterial,
    port: &str,
    lookup: &dyn IpLookup,
) -> Result<MultiAddress, IdentityError> {
    let port = port.trim();
    if port.is_empty() {
        return Err(IdentityError::AddressFormat("transport port is empty".to_string()));
    }

    let observed = lookup.public_ip().await?;
    let ip = observed.trim();
    if ip.is_empty() {
        return Err(IdentityError::NetworkDiscovery(
            "IP lookup returned an empty response".to_string(),
        ));
    }
    let ip: Ipv4Addr = ip.parse().map_err(|_| {
        IdentityError::NetworkDiscovery(format!("IP lookup returned malformed output '{}'", ip))
    })?;

    let composed = format!("/ip4/{}/tcp/{}/republic/{}", ip, port, key.address());
    let address: MultiAddress = composed.parse()?;

    tracing::debug!(address = %address, "Resolved node multi-address");
    Ok(address)
}
