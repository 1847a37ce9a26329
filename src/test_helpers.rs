//! Test helpers for unit tests.
//!
//! In-memory SQLite with the real migrations, and an in-memory stand-in for
//! the Cloudflare API that records every call it receives.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;

use crate::config::cloudflare::CloudflareConfig;
use crate::migrations::Migrator;
use crate::services::cloudflare::{
    AccessApi, AccessApplication, AccessApplicationRequest, CloudflareError, DnsApi, DnsRecord,
    DnsRecordRequest, DnsRecordType, TunnelApi, TunnelConfiguration,
};
use crate::services::provisioning::HostnameProvisioner;

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

pub fn cloudflare_config() -> CloudflareConfig {
    CloudflareConfig {
        api_base: "http://cloudflare.invalid/client/v4".to_string(),
        api_token: "test-token".to_string(),
        zone_id: "zone-1".to_string(),
        account_id: "acct-1".to_string(),
        tunnel_id: "tun-1".to_string(),
        base_domain: "example.com".to_string(),
        tunnel_target: None,
        timeout: Duration::from_secs(5),
        access_session_duration: "24h".to_string(),
        access_launcher_visible: true,
    }
}

/// Provisioner for `example.com` whose three provider seams all point at `fake`
pub fn fake_provisioner(fake: &Arc<FakeCloudflare>) -> HostnameProvisioner {
    HostnameProvisioner::with_apis(
        fake.clone(),
        fake.clone(),
        fake.clone(),
        &cloudflare_config(),
    )
}

#[derive(Default)]
struct FakeState {
    dns_records: Vec<DnsRecord>,
    tunnel_config: Option<Value>,
    access_apps: Vec<AccessApplicationRequest>,
    calls: Vec<String>,
    failing: HashSet<String>,
    next_id: u64,
}

impl FakeState {
    /// Record the call and fail it if it was marked as failing
    fn enter(&mut self, call: &str) -> Result<(), CloudflareError> {
        self.calls.push(call.to_string());
        if self.failing.contains(call) {
            return Err(CloudflareError::Status {
                status: 500,
                message: format!("injected failure for {call}"),
            });
        }
        Ok(())
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

/// In-memory Cloudflare account.
///
/// Call names: `dns.list`, `dns.create`, `dns.update`, `tunnel.get`,
/// `tunnel.put`, `access.create`.
#[derive(Default)]
pub struct FakeCloudflare {
    state: Mutex<FakeState>,
}

impl FakeCloudflare {
    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn fail(&self, call: &str) {
        self.lock().failing.insert(call.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn calls_to(&self, call: &str) -> usize {
        self.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn dns_writes(&self) -> usize {
        self.calls_to("dns.create") + self.calls_to("dns.update")
    }

    pub fn dns_records(&self) -> Vec<DnsRecord> {
        self.lock().dns_records.clone()
    }

    pub fn seed_dns_record(
        &self,
        record_type: DnsRecordType,
        name: &str,
        content: &str,
        proxied: bool,
    ) -> String {
        let mut state = self.lock();
        let id = state.next_id("rec");
        state.dns_records.push(DnsRecord {
            id: id.clone(),
            record_type,
            name: name.to_string(),
            content: content.to_string(),
            proxied,
        });
        id
    }

    pub fn set_tunnel_config(&self, config: Option<Value>) {
        self.lock().tunnel_config = config;
    }

    pub fn tunnel_config(&self) -> Option<Value> {
        self.lock().tunnel_config.clone()
    }

    pub fn access_apps(&self) -> Vec<AccessApplicationRequest> {
        self.lock().access_apps.clone()
    }
}

#[async_trait]
impl DnsApi for FakeCloudflare {
    async fn find_records(
        &self,
        record_type: DnsRecordType,
        name: &str,
    ) -> Result<Vec<DnsRecord>, CloudflareError> {
        let mut state = self.lock();
        state.enter("dns.list")?;
        Ok(state
            .dns_records
            .iter()
            .filter(|r| r.record_type == record_type && r.name == name)
            .cloned()
            .collect())
    }

    async fn create_record(&self, record: &DnsRecordRequest) -> Result<DnsRecord, CloudflareError> {
        let mut state = self.lock();
        state.enter("dns.create")?;
        let created = DnsRecord {
            id: state.next_id("rec"),
            record_type: record.record_type,
            name: record.name.clone(),
            content: record.content.clone(),
            proxied: record.proxied,
        };
        state.dns_records.push(created.clone());
        Ok(created)
    }

    async fn update_record(
        &self,
        record_id: &str,
        record: &DnsRecordRequest,
    ) -> Result<DnsRecord, CloudflareError> {
        let mut state = self.lock();
        state.enter("dns.update")?;
        let existing = state
            .dns_records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| CloudflareError::Status {
                status: 404,
                message: format!("record {record_id} not found"),
            })?;
        existing.record_type = record.record_type;
        existing.name = record.name.clone();
        existing.content = record.content.clone();
        existing.proxied = record.proxied;
        Ok(existing.clone())
    }
}

#[async_trait]
impl TunnelApi for FakeCloudflare {
    async fn get_configuration(&self) -> Result<Option<Value>, CloudflareError> {
        let mut state = self.lock();
        state.enter("tunnel.get")?;
        Ok(state.tunnel_config.clone())
    }

    async fn put_configuration(&self, config: &TunnelConfiguration) -> Result<(), CloudflareError> {
        let mut state = self.lock();
        state.enter("tunnel.put")?;
        let value = serde_json::to_value(config).map_err(|source| CloudflareError::Decode {
            context: "tunnel configuration",
            source,
        })?;
        state.tunnel_config = Some(value);
        Ok(())
    }
}

#[async_trait]
impl AccessApi for FakeCloudflare {
    async fn create_application(
        &self,
        application: &AccessApplicationRequest,
    ) -> Result<AccessApplication, CloudflareError> {
        let mut state = self.lock();
        state.enter("access.create")?;
        state.access_apps.push(application.clone());
        Ok(AccessApplication {
            id: state.next_id("app"),
            name: Some(application.name.clone()),
            domain: Some(application.domain.clone()),
        })
    }
}
