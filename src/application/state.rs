use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::services::provisioning::HostnameProvisioner;

/// Database connection type alias
pub type DbConn = DatabaseConnection;

/// Application state containing all shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub provisioner: Arc<HostnameProvisioner>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: DbConn, provisioner: HostnameProvisioner, config: Config) -> Self {
        Self {
            db,
            provisioner: Arc::new(provisioner),
            config: Arc::new(config),
        }
    }

    /// Local service every published hostname routes to
    pub fn service_url(&self) -> &str {
        &self.config.provisioning.service_url
    }
}
