// ── Subscriber account mutations ──
//
// Each mutation commits the domain write first and mirrors it into the
// authorization store afterwards. A failed mirror is logged, never
// returned.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::credentials::SecretHasher;
use crate::error::CoreError;
use crate::model::{AuthMode, SubscriberCredential, TenantId};
use crate::store::Stores;
use crate::sync::SyncOrchestrator;

const MAX_USERNAME_LEN: usize = 64;

/// Input for [`AccountManager::create`].
#[derive(Debug, Clone, Default)]
pub struct NewSubscriber {
    pub username: String,
    pub password: String,
    pub auth_mode: AuthMode,
    pub profile: Option<String>,
    pub static_ip: Option<IpAddr>,
    pub expires_at: Option<DateTime<Utc>>,
    pub subscription_id: Option<Uuid>,
}

/// Partial update. `None` leaves a field unchanged; `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct SubscriberUpdate {
    pub password: Option<String>,
    pub auth_mode: Option<AuthMode>,
    pub profile: Option<Option<String>>,
    pub static_ip: Option<Option<IpAddr>>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub subscription_id: Option<Option<Uuid>>,
}

pub struct AccountManager {
    stores: Stores,
    sync: SyncOrchestrator,
    hasher: SecretHasher,
}

impl AccountManager {
    pub fn new(stores: Stores, sync: SyncOrchestrator, hasher: SecretHasher) -> Self {
        Self {
            stores,
            sync,
            hasher,
        }
    }

    pub fn create(
        &self,
        tenant: TenantId,
        request: NewSubscriber,
    ) -> Result<SubscriberCredential, CoreError> {
        validate_username(&request.username)?;
        if request.password.is_empty() {
            return Err(CoreError::validation("password must not be empty"));
        }
        if let Some(id) = request.subscription_id {
            self.check_subscription(tenant, id)?;
        }

        let credential = SubscriberCredential {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            username: request.username,
            password_hash: self.hasher.hash(&request.password)?,
            password: request.password,
            auth_mode: request.auth_mode,
            profile: request.profile,
            static_ip: request.static_ip,
            is_active: true,
            expires_at: request.expires_at,
            subscription_id: request.subscription_id,
        };
        self.stores.subscribers.insert_credential(credential.clone())?;
        info!(%tenant, username = %credential.username, "subscriber created");

        self.sync.mirror_subscriber(tenant, &credential.username);
        Ok(credential)
    }

    pub fn update(
        &self,
        tenant: TenantId,
        username: &str,
        update: SubscriberUpdate,
    ) -> Result<SubscriberCredential, CoreError> {
        let mut credential = self.find(tenant, username)?;

        if let Some(password) = update.password {
            if password.is_empty() {
                return Err(CoreError::validation("password must not be empty"));
            }
            credential.password_hash = self.hasher.hash(&password)?;
            credential.password = password;
        }
        if let Some(mode) = update.auth_mode {
            credential.auth_mode = mode;
        }
        if let Some(profile) = update.profile {
            credential.profile = profile;
        }
        if let Some(address) = update.static_ip {
            credential.static_ip = address;
        }
        if let Some(expires_at) = update.expires_at {
            credential.expires_at = expires_at;
        }
        if let Some(subscription_id) = update.subscription_id {
            if let Some(id) = subscription_id {
                self.check_subscription(tenant, id)?;
            }
            credential.subscription_id = subscription_id;
        }

        let stored = self.stores.subscribers.update_credential(credential)?;
        info!(%tenant, username, "subscriber updated");

        self.sync.mirror_subscriber(tenant, username);
        Ok(stored)
    }

    pub fn suspend(
        &self,
        tenant: TenantId,
        username: &str,
    ) -> Result<SubscriberCredential, CoreError> {
        self.set_active(tenant, username, false)
    }

    pub fn resume(
        &self,
        tenant: TenantId,
        username: &str,
    ) -> Result<SubscriberCredential, CoreError> {
        self.set_active(tenant, username, true)
    }

    fn set_active(
        &self,
        tenant: TenantId,
        username: &str,
        active: bool,
    ) -> Result<SubscriberCredential, CoreError> {
        let credential = self.stores.subscribers.set_active(tenant, username, active)?;
        info!(%tenant, username, active, "subscriber access changed");
        self.sync.mirror_subscriber(tenant, username);
        Ok(credential)
    }

    /// Hard delete. Rows are retracted even though the principal is gone.
    pub fn delete(
        &self,
        tenant: TenantId,
        username: &str,
    ) -> Result<SubscriberCredential, CoreError> {
        let removed = self.stores.subscribers.delete_credential(tenant, username)?;
        info!(%tenant, username, "subscriber deleted");
        self.sync.mirror_retract(tenant, username);
        Ok(removed)
    }

    pub fn find(
        &self,
        tenant: TenantId,
        username: &str,
    ) -> Result<SubscriberCredential, CoreError> {
        self.stores
            .subscribers
            .credential_by_username(tenant, username)?
            .ok_or_else(|| CoreError::not_found("subscriber", username))
    }

    pub fn list(&self, tenant: TenantId) -> Result<Vec<SubscriberCredential>, CoreError> {
        self.stores.subscribers.credentials(tenant)
    }

    fn check_subscription(&self, tenant: TenantId, id: Uuid) -> Result<(), CoreError> {
        let subscription = self
            .stores
            .catalog
            .subscription(id)?
            .ok_or_else(|| CoreError::not_found("subscription", id))?;
        if subscription.tenant_id != tenant {
            return Err(CoreError::forbidden("subscription", id));
        }
        Ok(())
    }
}

fn validate_username(username: &str) -> Result<(), CoreError> {
    if username.is_empty() || username.len() > MAX_USERNAME_LEN {
        return Err(CoreError::validation(format!(
            "username must be 1-{MAX_USERNAME_LEN} characters"
        )));
    }
    if username.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(CoreError::validation(format!(
            "username '{username}' contains whitespace or control characters"
        )));
    }
    Ok(())
}
