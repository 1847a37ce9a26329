//! Cloudflare v4 REST client
//!
//! One `reqwest::Client` per process, built from the injected
//! [`CloudflareConfig`]. Every call goes through [`CloudflareClient::send`],
//! which turns non-2xx statuses and `success: false` envelopes into
//! [`CloudflareError`] values instead of panicking or raising.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use super::access::{AccessApi, AccessApplication, AccessApplicationRequest};
use super::dns::{DnsApi, DnsRecord, DnsRecordRequest, DnsRecordType};
use super::tunnel::{TunnelApi, TunnelConfiguration};
use crate::config::cloudflare::CloudflareConfig;

/// Longest slice of a non-JSON error body kept in an error message
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Error)]
pub enum CloudflareError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("API error ({context}): {message}")]
    Api {
        context: &'static str,
        message: String,
    },

    #[error("API returned no result for: {0}")]
    MissingResult(&'static str),

    #[error("failed to decode {context}: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

// ============================================================================
// Cloudflare API response envelope
// ============================================================================

#[derive(Deserialize)]
struct CfResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<CfApiError>,
    result: Option<T>,
}

#[derive(Deserialize)]
struct CfApiError {
    #[allow(dead_code)]
    code: i64,
    message: String,
}

fn join_messages(errors: &[CfApiError]) -> String {
    if errors.is_empty() {
        return "unknown error".to_string();
    }
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Best-effort message for a failed response body
fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<CfResponse<serde_json::Value>>(body) {
        Ok(envelope) => join_messages(&envelope.errors),
        Err(_) => body.chars().take(MAX_ERROR_BODY).collect(),
    }
}

// ============================================================================
// Client
// ============================================================================

/// Cloudflare API client scoped to one zone, account and tunnel
pub struct CloudflareClient {
    http: Client,
    api_base: String,
    api_token: String,
    zone_id: String,
    account_id: String,
    tunnel_id: String,
}

impl CloudflareClient {
    pub fn new(config: &CloudflareConfig) -> Result<Self, CloudflareError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("cv-builder/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            zone_id: config.zone_id.clone(),
            account_id: config.account_id.clone(),
            tunnel_id: config.tunnel_id.clone(),
        })
    }

    fn dns_records_url(&self) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, self.zone_id)
    }

    fn tunnel_configuration_url(&self) -> String {
        format!(
            "{}/accounts/{}/cfd_tunnel/{}/configurations",
            self.api_base, self.account_id, self.tunnel_id
        )
    }

    fn access_apps_url(&self) -> String {
        format!("{}/accounts/{}/access/apps", self.api_base, self.account_id)
    }

    /// Send an authenticated request and unwrap the response envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &'static str,
    ) -> Result<Option<T>, CloudflareError> {
        let response = request.bearer_auth(&self.api_token).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CloudflareError::Status {
                status: status.as_u16(),
                message: describe_error_body(&body),
            });
        }

        let envelope: CfResponse<T> = serde_json::from_str(&body)
            .map_err(|source| CloudflareError::Decode { context, source })?;

        if !envelope.success {
            return Err(CloudflareError::Api {
                context,
                message: join_messages(&envelope.errors),
            });
        }

        Ok(envelope.result)
    }

    async fn send_expecting<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &'static str,
    ) -> Result<T, CloudflareError> {
        self.send(request, context)
            .await?
            .ok_or(CloudflareError::MissingResult(context))
    }
}

#[async_trait]
impl DnsApi for CloudflareClient {
    async fn find_records(
        &self,
        record_type: DnsRecordType,
        name: &str,
    ) -> Result<Vec<DnsRecord>, CloudflareError> {
        let request = self.http.get(self.dns_records_url()).query(&[
            ("type", record_type.as_str()),
            ("name", name),
            ("per_page", "1"),
        ]);
        let records = self.send(request, "list DNS records").await?;
        Ok(records.unwrap_or_default())
    }

    async fn create_record(&self, record: &DnsRecordRequest) -> Result<DnsRecord, CloudflareError> {
        let request = self.http.post(self.dns_records_url()).json(record);
        self.send_expecting(request, "create DNS record").await
    }

    async fn update_record(
        &self,
        record_id: &str,
        record: &DnsRecordRequest,
    ) -> Result<DnsRecord, CloudflareError> {
        let request = self
            .http
            .put(format!("{}/{}", self.dns_records_url(), record_id))
            .json(record);
        self.send_expecting(request, "update DNS record").await
    }
}

#[async_trait]
impl TunnelApi for CloudflareClient {
    async fn get_configuration(&self) -> Result<Option<serde_json::Value>, CloudflareError> {
        let request = self.http.get(self.tunnel_configuration_url());
        let result: Option<serde_json::Value> =
            self.send(request, "get tunnel configuration").await?;

        Ok(result
            .and_then(|mut r| r.get_mut("config").map(serde_json::Value::take))
            .filter(|config| !config.is_null()))
    }

    async fn put_configuration(&self, config: &TunnelConfiguration) -> Result<(), CloudflareError> {
        let request = self
            .http
            .put(self.tunnel_configuration_url())
            .json(&serde_json::json!({ "config": config }));
        self.send::<serde_json::Value>(request, "update tunnel configuration")
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AccessApi for CloudflareClient {
    async fn create_application(
        &self,
        application: &AccessApplicationRequest,
    ) -> Result<AccessApplication, CloudflareError> {
        let request = self.http.post(self.access_apps_url()).json(application);
        self.send_expecting(request, "create access application").await
    }
}
