//! Account creation
//!
//! The subdomain is reserved by inserting the user row inside a transaction.
//! Hostname provisioning only starts once that row has committed, and a
//! provisioning failure never rolls the account back: the response reports
//! which stage stopped so an operator can re-run it.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr, TransactionTrait,
};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::user;
use crate::schemas::{HostingStatus, SignupRequest, SignupResponse};
use crate::services::name_allocator::{allocate, AllocationError, SEPARATORS};
use crate::services::provisioning::HostnameProvisioner;
use crate::services::security::hash_password;

/// Create an account, reserve its subdomain and publish its hostname.
pub async fn register_account(
    db: &DatabaseConnection,
    provisioner: &HostnameProvisioner,
    service_url: &str,
    request: SignupRequest,
) -> Result<SignupResponse> {
    request.validate()?;

    if username_exists(db, &request.username).await? {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    let hashed_password = hash_password(&request.password)?;
    let created = reserve_and_insert(db, &request, &hashed_password).await?;

    tracing::info!(
        user_id = created.id,
        username = %created.username,
        subdomain = %created.subdomain_name,
        "Account created"
    );

    let hosting = match provisioner
        .provision(&created.subdomain_name, service_url)
        .await
    {
        Ok(provisioned) => HostingStatus::from(provisioned),
        Err(e) => {
            tracing::error!(
                user_id = created.id,
                stage = %e.stage(),
                "Account created but hostname is not live: {}",
                e
            );
            HostingStatus::Failed {
                hostname: provisioner
                    .hostname_for(&created.subdomain_name)
                    .into_string(),
                stage: e.stage(),
            }
        }
    };

    Ok(SignupResponse {
        user: created.into(),
        hosting,
    })
}

async fn username_exists(db: &DatabaseConnection, username: &str) -> Result<bool> {
    Ok(user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
        .is_some())
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Allocate a subdomain and insert the user holding it in one transaction.
///
/// A concurrent signup can commit the same candidate between the check and
/// the insert; the unique index rejects ours and allocation runs again. Each
/// round sees at least one more taken variant, so the loop is bounded by the
/// number of separators.
async fn reserve_and_insert(
    db: &DatabaseConnection,
    request: &SignupRequest,
    hashed_password: &str,
) -> Result<user::Model> {
    for attempt in 1..=SEPARATORS.len() {
        let txn = db.begin().await?;
        let subdomain = match allocate(&request.first_name, &request.last_name, &txn).await {
            Ok(subdomain) => subdomain,
            Err(e) => {
                txn.rollback().await?;
                return Err(e.into());
            }
        };

        let now = Utc::now();
        let new_user = user::ActiveModel {
            username: Set(request.username.clone()),
            email: Set(request.email.clone()),
            first_name: Set(request.first_name.trim().to_string()),
            last_name: Set(request.last_name.trim().to_string()),
            hashed_password: Set(hashed_password.to_string()),
            subdomain_name: Set(subdomain.clone()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match new_user.insert(&txn).await {
            Ok(created) => {
                txn.commit().await?;
                return Ok(created);
            }
            Err(e) if is_unique_violation(&e) => {
                txn.rollback().await?;
                if username_exists(db, &request.username).await? {
                    return Err(AppError::Conflict("Username already exists".to_string()));
                }
                tracing::warn!(attempt, %subdomain, "Subdomain was taken concurrently, allocating again");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AllocationError::Exhausted {
        first_name: request.first_name.clone(),
        last_name: request.last_name.clone(),
    }
    .into())
}
