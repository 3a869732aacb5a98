// ── Voucher lifecycle manager ──
//
// Owns voucher status and timestamps. Every status change goes through
// the store's conditional `transition`, so two concurrent activations of
// one code cannot both win.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::VoucherSettings;
use crate::credentials::{SecretHasher, UNAMBIGUOUS_ALPHABET, random_string};
use crate::error::CoreError;
use crate::model::{MacAddress, Package, TenantId, Voucher, VoucherStatus};
use crate::store::{CasOutcome, Stores, VoucherUpdate};
use crate::sync::SyncOrchestrator;

/// A freshly generated voucher with its one-time clear password.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedVoucher {
    pub voucher: Voucher,
    pub password: String,
}

pub struct VoucherManager {
    stores: Stores,
    sync: SyncOrchestrator,
    clock: Arc<dyn Clock>,
    hasher: SecretHasher,
    settings: VoucherSettings,
}

impl VoucherManager {
    pub fn new(
        stores: Stores,
        sync: SyncOrchestrator,
        clock: Arc<dyn Clock>,
        hasher: SecretHasher,
        settings: VoucherSettings,
    ) -> Self {
        Self {
            stores,
            sync,
            clock,
            hasher,
            settings,
        }
    }

    // ── Generation ───────────────────────────────────────────────────

    /// Cut `quantity` unused vouchers from a package.
    ///
    /// Codes are unique per tenant; a colliding code is redrawn up to
    /// `collision_retries` times before the batch fails with `Conflict`.
    /// Vouchers inserted before a failure stay in place.
    pub fn generate(
        &self,
        tenant: TenantId,
        package_id: Uuid,
        quantity: u32,
        prefix: Option<&str>,
    ) -> Result<Vec<GeneratedVoucher>, CoreError> {
        if quantity == 0 || quantity > self.settings.max_batch {
            return Err(CoreError::validation(format!(
                "quantity must be between 1 and {}",
                self.settings.max_batch
            )));
        }
        let prefix = prefix.unwrap_or_default();
        if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::validation(format!(
                "prefix '{prefix}' must be alphanumeric"
            )));
        }

        let package = self.package_for(tenant, package_id)?;
        if !package.is_active {
            return Err(CoreError::validation(format!(
                "package '{}' is not active",
                package.name
            )));
        }
        // Reject a package whose duration can never produce an expiry.
        package.validity()?;

        let mut generated = Vec::new();
        for _ in 0..quantity {
            generated.push(self.generate_one(tenant, &package, prefix)?);
        }
        info!(%tenant, package = %package.name, count = generated.len(), "vouchers generated");
        Ok(generated)
    }

    fn generate_one(
        &self,
        tenant: TenantId,
        package: &Package,
        prefix: &str,
    ) -> Result<GeneratedVoucher, CoreError> {
        let password = random_string(UNAMBIGUOUS_ALPHABET, self.settings.password_length)?;
        let password_hash = self.hasher.hash(&password)?;

        let mut attempt = 0;
        loop {
            let code = format!(
                "{}{}",
                prefix.to_ascii_uppercase(),
                random_string(UNAMBIGUOUS_ALPHABET, self.settings.code_length)?
            );
            let voucher = Voucher {
                id: Uuid::new_v4(),
                tenant_id: tenant,
                code,
                password_hash: password_hash.clone(),
                package_id: package.id,
                status: VoucherStatus::Unused,
                created_at: self.clock.now(),
                activated_at: None,
                expires_at: None,
                device_mac: None,
            };
            match self.stores.vouchers.insert_voucher(voucher.clone()) {
                Ok(()) => return Ok(GeneratedVoucher { voucher, password }),
                Err(CoreError::Conflict { .. }) if attempt < self.settings.collision_retries => {
                    attempt += 1;
                    debug!(
                        %tenant,
                        code = %voucher.code,
                        attempt,
                        "voucher code collision, redrawing"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    // ── Activation ───────────────────────────────────────────────────

    /// Start the voucher's validity window.
    ///
    /// `expires_at` is always `now + package validity`. When the package
    /// binds devices, `device_mac` is required and recorded.
    pub fn activate(
        &self,
        tenant: TenantId,
        code: &str,
        device_mac: Option<MacAddress>,
    ) -> Result<Voucher, CoreError> {
        let voucher = self.find(tenant, code)?;
        if !voucher.can_be_activated() {
            return Err(not_activatable(&voucher));
        }

        let package = self.package_for(tenant, voucher.package_id)?;
        let validity = package.validity()?;
        let device_mac = if package.bind_device {
            Some(device_mac.ok_or_else(|| {
                CoreError::validation(format!(
                    "package '{}' binds devices; a MAC address is required",
                    package.name
                ))
            })?)
        } else {
            None
        };

        let activated_at = self.clock.now();
        let expires_at = activated_at
            .checked_add_signed(validity)
            .ok_or_else(|| CoreError::validation("voucher expiry is out of range"))?;

        // The status read above is only advisory; the store re-checks it
        // under the row lock.
        let update = VoucherUpdate::Activate {
            activated_at,
            expires_at,
            device_mac,
        };
        let activated = match self.stores.vouchers.transition(tenant, voucher.id, update)? {
            CasOutcome::Applied(v) => v,
            CasOutcome::NotApplied { current } => return Err(not_activatable(&current)),
        };

        info!(%tenant, code, expires_at = %expires_at, "voucher activated");
        self.sync.mirror_voucher(tenant, &activated.code);
        Ok(activated)
    }

    pub fn can_be_activated(voucher: &Voucher) -> bool {
        voucher.can_be_activated()
    }

    /// Expiry check against the injected clock, independent of status.
    pub fn is_expired(&self, voucher: &Voucher) -> bool {
        voucher.is_expired(self.clock.now())
    }

    // ── Terminal transitions ─────────────────────────────────────────

    /// `active -> expired`. Calling it on an already expired voucher is a no-op.
    pub fn mark_expired(&self, tenant: TenantId, code: &str) -> Result<Voucher, CoreError> {
        self.finish(tenant, code, VoucherUpdate::Expire, VoucherStatus::Expired)
    }

    /// `active -> used`, for fully consumed vouchers. Idempotent.
    pub fn mark_used(&self, tenant: TenantId, code: &str) -> Result<Voucher, CoreError> {
        self.finish(tenant, code, VoucherUpdate::Consume, VoucherStatus::Used)
    }

    fn finish(
        &self,
        tenant: TenantId,
        code: &str,
        update: VoucherUpdate,
        target: VoucherStatus,
    ) -> Result<Voucher, CoreError> {
        let voucher = self.find(tenant, code)?;
        let done = match self.stores.vouchers.transition(tenant, voucher.id, update)? {
            CasOutcome::Applied(v) => {
                info!(%tenant, code, status = %target, "voucher closed");
                v
            }
            CasOutcome::NotApplied { current } if current.status == target => current,
            CasOutcome::NotApplied { current } => {
                return Err(CoreError::validation(format!(
                    "voucher '{code}' is {} and cannot become {target}",
                    current.status
                )));
            }
        };
        self.sync.mirror_retract(tenant, &done.code);
        Ok(done)
    }

    // ── Administration ───────────────────────────────────────────────

    /// Hard-delete a voucher that is not active and retract its rows.
    pub fn delete(&self, tenant: TenantId, code: &str) -> Result<Voucher, CoreError> {
        let voucher = self.find(tenant, code)?;
        let removed = self.stores.vouchers.delete_voucher(tenant, voucher.id)?;
        info!(%tenant, code, "voucher deleted");
        self.sync.mirror_retract(tenant, &removed.code);
        Ok(removed)
    }

    pub fn find(&self, tenant: TenantId, code: &str) -> Result<Voucher, CoreError> {
        self.stores
            .vouchers
            .voucher_by_code(tenant, code)?
            .ok_or_else(|| CoreError::not_found("voucher", code))
    }

    pub fn list(
        &self,
        tenant: TenantId,
        status: Option<VoucherStatus>,
    ) -> Result<Vec<Voucher>, CoreError> {
        let mut vouchers = self.stores.vouchers.vouchers(tenant)?;
        if let Some(status) = status {
            vouchers.retain(|v| v.status == status);
        }
        Ok(vouchers)
    }

    /// Check a presented password against the stored hash.
    pub fn verify_password(&self, voucher: &Voucher, password: &str) -> bool {
        self.hasher.verify(password, &voucher.password_hash)
    }

    fn package_for(&self, tenant: TenantId, package_id: Uuid) -> Result<Package, CoreError> {
        let package = self
            .stores
            .catalog
            .package(package_id)?
            .ok_or_else(|| CoreError::not_found("package", package_id))?;
        if package.tenant_id != tenant {
            return Err(CoreError::forbidden("package", package_id));
        }
        Ok(package)
    }
}

fn not_activatable(voucher: &Voucher) -> CoreError {
    CoreError::validation(format!(
        "voucher '{}' is {} and cannot be activated",
        voucher.code, voucher.status
    ))
}
