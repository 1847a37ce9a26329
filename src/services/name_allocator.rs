//! Subdomain allocation
//!
//! A user's subdomain is derived from their first and last name joined by a
//! separator. Separators are tried in a fixed order and the first candidate
//! nobody holds yet wins. Checking a candidate has no side effects; the name
//! only becomes reserved when the owning user row commits.

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter,
};
use thiserror::Error;

use crate::models::user;

/// Separator preference order
pub const SEPARATORS: [&str; 8] = ["_", "__", "-", "--", "___", "---", "|", "||"];

/// Longest label DNS accepts
pub const MAX_SUBDOMAIN_LEN: usize = 63;

#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("every subdomain variant of '{first_name} {last_name}' is taken")]
    Exhausted {
        first_name: String,
        last_name: String,
    },

    #[error("first and last name are both empty")]
    EmptyName,

    #[error("'{first_name} {last_name}' is too long for a subdomain")]
    TooLong {
        first_name: String,
        last_name: String,
    },

    #[error("subdomain lookup failed: {0}")]
    Database(#[from] DbErr),
}

/// Existence check for candidate subdomains
#[async_trait]
pub trait SubdomainRegistry: Send + Sync {
    async fn is_taken(&self, candidate: &str) -> Result<bool, DbErr>;
}

async fn subdomain_exists<C: ConnectionTrait>(db: &C, candidate: &str) -> Result<bool, DbErr> {
    let count = user::Entity::find()
        .filter(user::Column::SubdomainName.eq(candidate))
        .count(db)
        .await?;
    Ok(count > 0)
}

#[async_trait]
impl SubdomainRegistry for DatabaseConnection {
    async fn is_taken(&self, candidate: &str) -> Result<bool, DbErr> {
        subdomain_exists(self, candidate).await
    }
}

#[async_trait]
impl SubdomainRegistry for DatabaseTransaction {
    async fn is_taken(&self, candidate: &str) -> Result<bool, DbErr> {
        subdomain_exists(self, candidate).await
    }
}

/// Trim, turn inner spaces into `_` and lowercase
pub fn normalize_token(raw: &str) -> String {
    raw.trim().replace(' ', "_").to_lowercase()
}

/// Every candidate for a name, in preference order
pub fn candidates(first_name: &str, last_name: &str) -> Vec<String> {
    let first = normalize_token(first_name);
    let last = normalize_token(last_name);
    SEPARATORS
        .iter()
        .map(|sep| format!("{first}{sep}{last}"))
        .collect()
}

/// Pick the first candidate for `first_name`/`last_name` that is not taken.
///
/// Candidates longer than a DNS label (in bytes) are skipped. When no
/// candidate fits at all the name is rejected as too long rather than taken.
pub async fn allocate<R>(
    first_name: &str,
    last_name: &str,
    registry: &R,
) -> Result<String, AllocationError>
where
    R: SubdomainRegistry + ?Sized,
{
    if normalize_token(first_name).is_empty() && normalize_token(last_name).is_empty() {
        return Err(AllocationError::EmptyName);
    }

    let mut checked = 0;
    for candidate in candidates(first_name, last_name) {
        if candidate.len() > MAX_SUBDOMAIN_LEN {
            tracing::debug!(%candidate, "Skipping subdomain candidate longer than a DNS label");
            continue;
        }
        checked += 1;
        if !registry.is_taken(&candidate).await? {
            tracing::debug!(%candidate, "Allocated subdomain");
            return Ok(candidate);
        }
    }

    if checked == 0 {
        return Err(AllocationError::TooLong {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        });
    }

    tracing::warn!(%first_name, %last_name, "All subdomain variants are taken");
    Err(AllocationError::Exhausted {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
    })
}
