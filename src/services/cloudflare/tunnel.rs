//! Tunnel ingress patching
//!
//! The remote tunnel configuration is fetched, a single hostname route is
//! merged into its ingress list and the whole object is written back. Rules
//! and keys this service does not manage are carried through untouched.
//!
//! Ingress invariant: exactly one catch-all rule (no `hostname`, no `path`),
//! and it is the last entry.
//!
//! There is no version check between the read and the write, so two
//! concurrent patches against the same tunnel are last-write-wins.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::CloudflareError;
use crate::services::provisioning::ProvisionError;

/// Service of the synthesized catch-all rule
pub const DEFAULT_CATCH_ALL_SERVICE: &str = "http_status:404";

/// One ingress entry. Keys other than `hostname`, `path` and `service`
/// (e.g. `originRequest`) are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngressRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub service: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IngressRule {
    pub fn route(hostname: &str, service: &str) -> Self {
        Self {
            hostname: Some(hostname.to_string()),
            path: None,
            service: service.to_string(),
            extra: Map::new(),
        }
    }

    pub fn catch_all(service: &str) -> Self {
        Self {
            hostname: None,
            path: None,
            service: service.to_string(),
            extra: Map::new(),
        }
    }

    pub fn is_catch_all(&self) -> bool {
        self.hostname.is_none() && self.path.is_none()
    }
}

/// Remote-managed tunnel configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TunnelConfiguration {
    #[serde(default)]
    pub ingress: Vec<IngressRule>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Tunnel configuration operations the patcher needs from the provider
#[async_trait]
pub trait TunnelApi: Send + Sync {
    /// The `result.config` object, or `None` when the tunnel has none yet
    async fn get_configuration(&self) -> Result<Option<Value>, CloudflareError>;

    async fn put_configuration(&self, config: &TunnelConfiguration) -> Result<(), CloudflareError>;
}

/// What `merge_route` did to the ingress list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteChange {
    Unchanged,
    ServiceUpdated,
    /// Inserted ahead of the catch-all at this index
    Inserted { index: usize },
    /// Appended together with a synthesized catch-all
    Appended,
}

impl RouteChange {
    pub fn needs_write(&self) -> bool {
        !matches!(self, RouteChange::Unchanged)
    }
}

/// Merge a `hostname -> service` route into `config` in place.
///
/// An existing rule for the hostname has its service replaced. A new rule
/// goes immediately before the first catch-all; without one, the rule is
/// appended followed by a default catch-all.
pub fn merge_route(config: &mut TunnelConfiguration, hostname: &str, service: &str) -> RouteChange {
    if let Some(rule) = config
        .ingress
        .iter_mut()
        .find(|rule| rule.hostname.as_deref() == Some(hostname))
    {
        if rule.service == service {
            return RouteChange::Unchanged;
        }
        rule.service = service.to_string();
        return RouteChange::ServiceUpdated;
    }

    let route = IngressRule::route(hostname, service);
    match config.ingress.iter().position(IngressRule::is_catch_all) {
        Some(index) => {
            config.ingress.insert(index, route);
            RouteChange::Inserted { index }
        }
        None => {
            config.ingress.push(route);
            config
                .ingress
                .push(IngressRule::catch_all(DEFAULT_CATCH_ALL_SERVICE));
            RouteChange::Appended
        }
    }
}

#[derive(Clone)]
pub struct IngressPatcher {
    api: Arc<dyn TunnelApi>,
}

impl IngressPatcher {
    pub fn new(api: Arc<dyn TunnelApi>) -> Self {
        Self { api }
    }

    /// Route `hostname` to `service_url` through the tunnel.
    pub async fn add_or_update_route(
        &self,
        hostname: &str,
        service_url: &str,
    ) -> Result<RouteChange, ProvisionError> {
        let mut config = self.fetch().await?;

        let change = merge_route(&mut config, hostname, service_url);
        if !change.needs_write() {
            tracing::debug!(%hostname, "Ingress route already present");
            return Ok(change);
        }

        self.api
            .put_configuration(&config)
            .await
            .map_err(ProvisionError::Tunnel)?;

        tracing::info!(
            %hostname,
            service = %service_url,
            change = ?change,
            rules = config.ingress.len(),
            "Patched tunnel ingress"
        );
        Ok(change)
    }

    async fn fetch(&self) -> Result<TunnelConfiguration, ProvisionError> {
        match self
            .api
            .get_configuration()
            .await
            .map_err(ProvisionError::Tunnel)?
        {
            Some(raw) => serde_json::from_value(raw).map_err(|source| {
                ProvisionError::Tunnel(CloudflareError::Decode {
                    context: "tunnel configuration",
                    source,
                })
            }),
            None => {
                tracing::warn!("Tunnel has no remote configuration yet, starting from an empty rule set");
                Ok(TunnelConfiguration::default())
            }
        }
    }
}
