//! Hostname provisioning
//!
//! Publishes `<subdomain>.<base-domain>` in three dependent steps: the DNS
//! record, the tunnel ingress route, then the Access application. Each step
//! only runs after the previous one succeeded. A failure stops the run and
//! reports the stage; work already done upstream is left in place, and every
//! step is safe to repeat except Access registration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::config::cloudflare::CloudflareConfig;
use crate::services::cloudflare::{
    AccessApi, AccessRegistrar, CloudflareClient, CloudflareError, DnsApi, DnsRecordManager,
    IngressPatcher, TunnelApi,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProvisionStage {
    Dns,
    Ingress,
    Access,
}

impl std::fmt::Display for ProvisionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProvisionStage::Dns => "dns",
            ProvisionStage::Ingress => "ingress",
            ProvisionStage::Access => "access",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("DNS record upsert failed: {0}")]
    Dns(#[source] CloudflareError),

    #[error("Tunnel ingress update failed: {0}")]
    Tunnel(#[source] CloudflareError),

    #[error("Access application registration failed: {0}")]
    Access(#[source] CloudflareError),
}

impl ProvisionError {
    pub fn stage(&self) -> ProvisionStage {
        match self {
            ProvisionError::Dns(_) => ProvisionStage::Dns,
            ProvisionError::Tunnel(_) => ProvisionStage::Ingress,
            ProvisionError::Access(_) => ProvisionStage::Access,
        }
    }
}

/// Progress of a single provisioning run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    Idle,
    DnsEnsured,
    IngressPatched,
    AccessRegistered,
    Done,
    Failed(ProvisionStage),
}

impl ProvisionState {
    fn advance(&mut self, next: ProvisionState, hostname: &Hostname) {
        match next {
            ProvisionState::Failed(stage) => {
                tracing::error!(%hostname, from = ?self, %stage, "Provisioning state transition")
            }
            _ => tracing::info!(%hostname, from = ?self, to = ?next, "Provisioning state transition"),
        }
        *self = next;
    }
}

/// A public hostname under the configured base domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hostname(String);

impl Hostname {
    pub fn new(subdomain: &str, base_domain: &str) -> Self {
        Self(format!(
            "{}.{}",
            subdomain,
            base_domain.trim_start_matches('.')
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Hostname {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a successful provisioning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProvisionedHostname {
    pub hostname: String,
    pub access_app_id: String,
}

#[derive(Clone)]
pub struct HostnameProvisioner {
    dns: DnsRecordManager,
    ingress: IngressPatcher,
    access: AccessRegistrar,
    base_domain: String,
    tunnel_target: String,
}

impl HostnameProvisioner {
    pub fn new(
        dns: DnsRecordManager,
        ingress: IngressPatcher,
        access: AccessRegistrar,
        base_domain: &str,
        tunnel_target: &str,
    ) -> Self {
        Self {
            dns,
            ingress,
            access,
            base_domain: base_domain.to_string(),
            tunnel_target: tunnel_target.to_string(),
        }
    }

    /// Build a provisioner backed by the real Cloudflare API
    pub fn from_config(config: &CloudflareConfig) -> Result<Self, CloudflareError> {
        let client = Arc::new(CloudflareClient::new(config)?);
        Ok(Self::with_apis(client.clone(), client.clone(), client, config))
    }

    pub fn with_apis(
        dns: Arc<dyn DnsApi>,
        tunnel: Arc<dyn TunnelApi>,
        access: Arc<dyn AccessApi>,
        config: &CloudflareConfig,
    ) -> Self {
        Self::new(
            DnsRecordManager::new(dns),
            IngressPatcher::new(tunnel),
            AccessRegistrar::new(
                access,
                &config.access_session_duration,
                config.access_launcher_visible,
            ),
            &config.base_domain,
            &config.tunnel_target(),
        )
    }

    pub fn hostname_for(&self, subdomain: &str) -> Hostname {
        Hostname::new(subdomain, &self.base_domain)
    }

    /// Publish `subdomain` and route it to `service_url`.
    ///
    /// Must only be called once the subdomain reservation has committed.
    pub async fn provision(
        &self,
        subdomain: &str,
        service_url: &str,
    ) -> Result<ProvisionedHostname, ProvisionError> {
        let hostname = self.hostname_for(subdomain);
        let mut state = ProvisionState::Idle;

        match self.run_stages(&hostname, service_url, &mut state).await {
            Ok(access_app_id) => {
                state.advance(ProvisionState::Done, &hostname);
                Ok(ProvisionedHostname {
                    hostname: hostname.into_string(),
                    access_app_id,
                })
            }
            Err(e) => {
                state.advance(ProvisionState::Failed(e.stage()), &hostname);
                tracing::error!(%hostname, stage = %e.stage(), "Hostname provisioning failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        hostname: &Hostname,
        service_url: &str,
        state: &mut ProvisionState,
    ) -> Result<String, ProvisionError> {
        self.dns
            .ensure_cname(hostname.as_str(), &self.tunnel_target)
            .await?;
        state.advance(ProvisionState::DnsEnsured, hostname);

        self.ingress
            .add_or_update_route(hostname.as_str(), service_url)
            .await?;
        state.advance(ProvisionState::IngressPatched, hostname);

        let app_id = self.access.register_app(hostname.as_str()).await?;
        state.advance(ProvisionState::AccessRegistered, hostname);

        Ok(app_id)
    }
}
