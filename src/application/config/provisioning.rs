use std::env;

#[derive(Clone)]
pub struct ProvisioningConfig {
    /// Local service every published hostname is routed to
    pub service_url: String,
    /// Shared secret for the re-provision endpoint; `None` disables it
    pub operator_token: Option<String>,
}

impl ProvisioningConfig {
    pub fn from_env() -> Self {
        Self {
            service_url: env::var("CV_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
            operator_token: env::var("CV_OPERATOR_TOKEN")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }
}

impl std::fmt::Debug for ProvisioningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningConfig")
            .field("service_url", &self.service_url)
            .field("operator_token", &self.operator_token.as_ref().map(|_| "****"))
            .finish()
    }
}
