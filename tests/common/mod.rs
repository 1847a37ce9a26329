//! Shared fixtures for integration tests.
//!
//! In-memory SQLite with the real migrations, an in-memory Cloudflare account
//! that records calls, and `AppState` builders wired to both.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
};
use http_body_util::BodyExt;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;

use cv_builder::config::cloudflare::CloudflareConfig;
use cv_builder::config::database::DatabaseConfig;
use cv_builder::config::provisioning::ProvisioningConfig;
use cv_builder::config::server::ServerConfig;
use cv_builder::config::{Config, LogFormat};
use cv_builder::migrations::Migrator;
use cv_builder::services::cloudflare::{
    AccessApi, AccessApplication, AccessApplicationRequest, CloudflareError, DnsApi, DnsRecord,
    DnsRecordRequest, DnsRecordType, TunnelApi, TunnelConfiguration,
};
use cv_builder::services::provisioning::HostnameProvisioner;
use cv_builder::state::AppState;

pub const OPERATOR_TOKEN: &str = "operator-secret";
pub const SERVICE_URL: &str = "http://localhost:3001";

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

pub fn test_config(operator_token: Option<&str>) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            allowed_origins: Vec::new(),
        },
        database: DatabaseConfig {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        cloudflare: CloudflareConfig {
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
        },
        provisioning: ProvisioningConfig {
            service_url: SERVICE_URL.to_string(),
            operator_token: operator_token.map(str::to_string),
        },
        commit_hash: "test".to_string(),
        build_time: "test".to_string(),
        version: "0.0.0-test".to_string(),
        log_level: "debug".to_string(),
        log_format: LogFormat::Text,
    }
}

/// App state wired to `fake` with the operator token enabled
pub fn build_app_state(db: DatabaseConnection, fake: &Arc<FakeCloudflare>) -> AppState {
    build_app_state_with_token(db, fake, Some(OPERATOR_TOKEN))
}

pub fn build_app_state_with_token(
    db: DatabaseConnection,
    fake: &Arc<FakeCloudflare>,
    operator_token: Option<&str>,
) -> AppState {
    let config = test_config(operator_token);
    let provisioner = HostnameProvisioner::with_apis(
        fake.clone(),
        fake.clone(),
        fake.clone(),
        &config.cloudflare,
    );
    AppState::new(db, provisioner, config)
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn operator_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn read_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn signup_body(username: &str, first_name: &str, last_name: &str) -> Value {
    serde_json::json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "supersecret",
        "first_name": first_name,
        "last_name": last_name
    })
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

/// In-memory Cloudflare account recording `dns.*`, `tunnel.*` and
/// `access.create` calls
#[derive(Default)]
pub struct FakeCloudflare {
    state: Mutex<FakeState>,
}

impl FakeCloudflare {
    pub fn with_catch_all() -> Arc<Self> {
        let fake = Arc::new(Self::default());
        fake.set_tunnel_config(Some(serde_json::json!({
            "ingress": [{"service": "http_status:404"}]
        })));
        fake
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn fail(&self, call: &str) {
        self.lock().failing.insert(call.to_string());
    }

    pub fn recover(&self, call: &str) {
        self.lock().failing.remove(call);
    }

    pub fn calls_to(&self, call: &str) -> usize {
        self.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn dns_records(&self) -> Vec<DnsRecord> {
        self.lock().dns_records.clone()
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
        state.tunnel_config = Some(serde_json::to_value(config).unwrap());
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
