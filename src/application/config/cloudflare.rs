use std::env;
use std::time::Duration;

use super::env_flag;

pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Credentials and identifiers for the Cloudflare account that hosts
/// every published hostname.
#[derive(Clone)]
pub struct CloudflareConfig {
    pub api_base: String,
    pub api_token: String,
    pub zone_id: String,
    pub account_id: String,
    pub tunnel_id: String,
    /// Base domain every subdomain is published under, e.g. "example.com"
    pub base_domain: String,
    /// Overrides the `<tunnel_id>.cfargotunnel.com` CNAME target
    pub tunnel_target: Option<String>,
    pub timeout: Duration,
    pub access_session_duration: String,
    pub access_launcher_visible: bool,
}

impl CloudflareConfig {
    pub fn from_env() -> Self {
        Self {
            api_base: env::var("CLOUDFLARE_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            api_token: env::var("CLOUDFLARE_TOKEN").unwrap_or_default(),
            zone_id: env::var("CLOUDFLARE_ZONE_ID").unwrap_or_default(),
            account_id: env::var("CLOUDFLARE_ACCOUNT_ID").unwrap_or_default(),
            tunnel_id: env::var("CLOUDFLARE_TUNNEL_ID").unwrap_or_default(),
            base_domain: env::var("CLOUDFLARE_DOMAIN").unwrap_or_else(|_| "localhost".to_string()),
            tunnel_target: env::var("CLOUDFLARE_TUNNEL_TARGET")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            timeout: Duration::from_secs(
                env::var("CLOUDFLARE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
            access_session_duration: env::var("CLOUDFLARE_ACCESS_SESSION_DURATION")
                .unwrap_or_else(|_| "24h".to_string()),
            access_launcher_visible: env_flag("CLOUDFLARE_ACCESS_LAUNCHER_VISIBLE", true),
        }
    }

    /// CNAME target that routes a hostname into the tunnel
    pub fn tunnel_target(&self) -> String {
        self.tunnel_target
            .clone()
            .unwrap_or_else(|| format!("{}.cfargotunnel.com", self.tunnel_id))
    }

    /// Whether every identifier needed to talk to the API is present
    pub fn is_complete(&self) -> bool {
        [
            &self.api_token,
            &self.zone_id,
            &self.account_id,
            &self.tunnel_id,
        ]
        .iter()
        .all(|v| !v.trim().is_empty())
    }
}

// Keeps the API token out of logs.
impl std::fmt::Debug for CloudflareConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareConfig")
            .field("api_base", &self.api_base)
            .field("api_token", &"****")
            .field("zone_id", &self.zone_id)
            .field("account_id", &self.account_id)
            .field("tunnel_id", &self.tunnel_id)
            .field("base_domain", &self.base_domain)
            .field("tunnel_target", &self.tunnel_target)
            .field("timeout", &self.timeout)
            .field("access_session_duration", &self.access_session_duration)
            .field("access_launcher_visible", &self.access_launcher_visible)
            .finish()
    }
}
