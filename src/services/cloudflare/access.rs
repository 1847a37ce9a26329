//! Zero Trust Access application registration

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CloudflareError;
use crate::services::provisioning::ProvisionError;

const SELF_HOSTED: &str = "self_hosted";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessApplicationRequest {
    pub name: String,
    pub domain: String,
    #[serde(rename = "type")]
    pub app_type: String,
    pub session_duration: String,
    pub app_launcher_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccessApplication {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

#[async_trait]
pub trait AccessApi: Send + Sync {
    async fn create_application(
        &self,
        application: &AccessApplicationRequest,
    ) -> Result<AccessApplication, CloudflareError>;
}

/// Registers one self-hosted Access application per hostname.
///
/// Registration does not look for an existing application first; calling
/// it twice for the same hostname leaves two applications behind.
#[derive(Clone)]
pub struct AccessRegistrar {
    api: Arc<dyn AccessApi>,
    session_duration: String,
    launcher_visible: bool,
}

impl AccessRegistrar {
    pub fn new(api: Arc<dyn AccessApi>, session_duration: &str, launcher_visible: bool) -> Self {
        Self {
            api,
            session_duration: session_duration.to_string(),
            launcher_visible,
        }
    }

    fn request_for(&self, hostname: &str) -> AccessApplicationRequest {
        AccessApplicationRequest {
            name: hostname.to_string(),
            domain: hostname.to_string(),
            app_type: SELF_HOSTED.to_string(),
            session_duration: self.session_duration.clone(),
            app_launcher_visible: self.launcher_visible,
        }
    }

    /// Returns the id of the created application
    pub async fn register_app(&self, hostname: &str) -> Result<String, ProvisionError> {
        let app = self
            .api
            .create_application(&self.request_for(hostname))
            .await
            .map_err(ProvisionError::Access)?;

        tracing::info!(%hostname, app_id = %app.id, "Registered Access application");
        Ok(app.id)
    }
}
