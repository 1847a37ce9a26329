use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::user;
use crate::services::provisioning::{ProvisionStage, ProvisionedHostname};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 150))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 30))]
    pub first_name: String,
    #[validate(length(min = 1, max = 30))]
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub subdomain_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            subdomain_name: user.subdomain_name,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// Whether the account's public hostname is reachable yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HostingStatus {
    Live {
        hostname: String,
        access_app_id: String,
    },
    /// The account exists; publishing stopped at `stage`
    Failed {
        hostname: String,
        stage: ProvisionStage,
    },
}

impl From<ProvisionedHostname> for HostingStatus {
    fn from(provisioned: ProvisionedHostname) -> Self {
        HostingStatus::Live {
            hostname: provisioned.hostname,
            access_app_id: provisioned.access_app_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupResponse {
    pub user: UserResponse,
    pub hosting: HostingStatus,
}
