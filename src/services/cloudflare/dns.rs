//! DNS record management
//!
//! Keeps exactly one proxied record per managed hostname. Records are
//! looked up by `(type, name)` and only written when the desired content
//! or proxy flag differs from what the zone already holds.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CloudflareError;
use crate::services::provisioning::ProvisionError;

/// TTL value Cloudflare interprets as "automatic"
const AUTO_TTL: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsRecordType {
    Cname,
    A,
}

impl DnsRecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DnsRecordType::Cname => "CNAME",
            DnsRecordType::A => "A",
        }
    }
}

impl std::fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_proxied() -> bool {
    true
}

/// A DNS record as returned by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,
    pub name: String,
    pub content: String,
    /// A record without the flag counts as proxied
    #[serde(default = "default_proxied")]
    pub proxied: bool,
}

/// Body of a create or update call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DnsRecordRequest {
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,
    pub name: String,
    pub content: String,
    pub proxied: bool,
    pub ttl: u32,
}

/// DNS operations the record manager needs from the provider
#[async_trait]
pub trait DnsApi: Send + Sync {
    async fn find_records(
        &self,
        record_type: DnsRecordType,
        name: &str,
    ) -> Result<Vec<DnsRecord>, CloudflareError>;

    async fn create_record(&self, record: &DnsRecordRequest) -> Result<DnsRecord, CloudflareError>;

    async fn update_record(
        &self,
        record_id: &str,
        record: &DnsRecordRequest,
    ) -> Result<DnsRecord, CloudflareError>;
}

/// What `ensure_record` had to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsOutcome {
    Created { record_id: String },
    Updated { record_id: String },
    Unchanged { record_id: String },
}

impl DnsOutcome {
    pub fn record_id(&self) -> &str {
        match self {
            DnsOutcome::Created { record_id }
            | DnsOutcome::Updated { record_id }
            | DnsOutcome::Unchanged { record_id } => record_id,
        }
    }

    pub fn wrote(&self) -> bool {
        !matches!(self, DnsOutcome::Unchanged { .. })
    }
}

#[derive(Clone)]
pub struct DnsRecordManager {
    api: Arc<dyn DnsApi>,
}

impl DnsRecordManager {
    pub fn new(api: Arc<dyn DnsApi>) -> Self {
        Self { api }
    }

    /// Point `hostname` at `target` with a proxied CNAME
    pub async fn ensure_cname(
        &self,
        hostname: &str,
        target: &str,
    ) -> Result<DnsOutcome, ProvisionError> {
        self.ensure_record(DnsRecordType::Cname, hostname, target)
            .await
    }

    /// Create or update the `(record_type, hostname)` record so it holds
    /// `content` and is proxied. Issues no write when it already does.
    pub async fn ensure_record(
        &self,
        record_type: DnsRecordType,
        hostname: &str,
        content: &str,
    ) -> Result<DnsOutcome, ProvisionError> {
        let desired = DnsRecordRequest {
            record_type,
            name: hostname.to_string(),
            content: content.to_string(),
            proxied: true,
            ttl: AUTO_TTL,
        };

        let existing = self
            .api
            .find_records(record_type, hostname)
            .await
            .map_err(ProvisionError::Dns)?
            .into_iter()
            .next();

        match existing {
            None => {
                let created = self
                    .api
                    .create_record(&desired)
                    .await
                    .map_err(ProvisionError::Dns)?;
                tracing::info!(%hostname, %record_type, record_id = %created.id, "Created DNS record");
                Ok(DnsOutcome::Created {
                    record_id: created.id,
                })
            }
            Some(record) if record.content != desired.content || !record.proxied => {
                self.api
                    .update_record(&record.id, &desired)
                    .await
                    .map_err(ProvisionError::Dns)?;
                tracing::info!(
                    %hostname,
                    %record_type,
                    record_id = %record.id,
                    previous = %record.content,
                    "Updated DNS record"
                );
                Ok(DnsOutcome::Updated {
                    record_id: record.id,
                })
            }
            Some(record) => {
                tracing::debug!(%hostname, record_id = %record.id, "DNS record already up to date");
                Ok(DnsOutcome::Unchanged {
                    record_id: record.id,
                })
            }
        }
    }
}
