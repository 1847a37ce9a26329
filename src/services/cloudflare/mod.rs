//! Cloudflare integration: DNS records, tunnel ingress and Access apps

pub mod access;
pub mod client;
pub mod dns;
pub mod tunnel;

pub use access::{AccessApi, AccessApplication, AccessApplicationRequest, AccessRegistrar};
pub use client::{CloudflareClient, CloudflareError};
pub use dns::{DnsApi, DnsOutcome, DnsRecord, DnsRecordManager, DnsRecordRequest, DnsRecordType};
pub use tunnel::{
    merge_route, IngressPatcher, IngressRule, RouteChange, TunnelApi, TunnelConfiguration,
};
