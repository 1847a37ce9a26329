pub mod cloudflare;
pub mod name_allocator;
pub mod provisioning;
pub mod security;
pub mod signup;

pub use provisioning::{HostnameProvisioner, ProvisionError, ProvisionStage, ProvisionedHostname};
pub use security::*;
