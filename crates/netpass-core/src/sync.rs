// ── Principal sync orchestrator ──
//
// The only writer of the authorization store. A sync is one transaction:
// delete every row for the username, then (if the principal is eligible)
// insert the planned rows. Absence of rows is how the access-control layer
// learns that access is denied.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::encoder;
use crate::error::CoreError;
use crate::model::{
    RadiusRow, SubscriberCredential, TenantId, Voucher, VoucherStatus,
    radius::{AUTH_TYPE_REJECT, attr},
};
use crate::principal::{Principal, PrincipalKind, SubscriberPrincipal, VoucherPrincipal};
use crate::store::Stores;

/// Rows `principal` should own in the authorization store at `now`.
///
/// Empty when the principal is not eligible. Pure; no I/O.
pub fn plan_rows(principal: &dyn Principal, now: DateTime<Utc>) -> Vec<RadiusRow> {
    if !principal.is_eligible() {
        return Vec::new();
    }

    let tenant = principal.tenant_id();
    let username = principal.username();
    let mut rows = vec![RadiusRow::check(
        tenant,
        username,
        attr::CLEARTEXT_PASSWORD,
        principal.credentialed_password(),
    )];

    if let Some(limit) = principal.session_limit() {
        rows.push(RadiusRow::check(
            tenant,
            username,
            attr::SIMULTANEOUS_USE,
            limit.to_string(),
        ));
    }

    if principal.hard_expiry().is_some_and(|at| at <= now) {
        rows.push(RadiusRow::check(
            tenant,
            username,
            attr::AUTH_TYPE,
            AUTH_TYPE_REJECT,
        ));
    }

    if let Some(address) = principal.static_address() {
        rows.push(RadiusRow::reply(
            tenant,
            username,
            attr::FRAMED_IP_ADDRESS,
            address.to_string(),
        ));
    }

    if let Some(policy) = principal.resolved_policy() {
        rows.push(RadiusRow::reply(
            tenant,
            username,
            attr::MIKROTIK_RATE_LIMIT,
            encoder::rate_limit(policy),
        ));
        if principal.kind() == PrincipalKind::Subscriber {
            if let Some(group) = principal.profile_group() {
                rows.push(RadiusRow::reply(tenant, username, attr::MIKROTIK_GROUP, group));
            }
        }
    }

    rows
}

/// What one sync left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub username: String,
    /// 0 when the principal was retracted.
    pub rows_written: usize,
}

/// Aggregate result of a best-effort batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct SyncOrchestrator {
    stores: Stores,
    clock: Arc<dyn Clock>,
}

impl SyncOrchestrator {
    pub fn new(stores: Stores, clock: Arc<dyn Clock>) -> Self {
        Self { stores, clock }
    }

    /// Rows `sync` would write, without touching the store.
    pub fn plan(&self, principal: &dyn Principal) -> Vec<RadiusRow> {
        plan_rows(principal, self.clock.now())
    }

    /// Replace the principal's rows in a single transaction.
    ///
    /// Idempotent. Any failure before commit leaves the previous rows intact.
    pub fn sync(&self, principal: &dyn Principal) -> Result<SyncOutcome, CoreError> {
        let tenant = principal.tenant_id();
        let username = principal.username();
        let rows = self.plan(principal);
        let rows_written = rows.len();

        let mut txn = self.stores.auth.begin()?;
        txn.delete_username(tenant, username)?;
        for row in rows {
            debug!(
                %tenant,
                username,
                table = %row.table,
                attribute = %row.attribute,
                "staging row"
            );
            txn.insert(row)?;
        }
        txn.commit()?;

        debug!(
            %tenant,
            username,
            kind = %principal.kind(),
            rows = rows_written,
            "principal synced"
        );
        Ok(SyncOutcome {
            username: username.to_owned(),
            rows_written,
        })
    }

    pub fn sync_voucher(&self, tenant: TenantId, code: &str) -> Result<SyncOutcome, CoreError> {
        let principal = self.load_voucher(tenant, code)?;
        self.sync(&principal)
    }

    pub fn sync_subscriber(
        &self,
        tenant: TenantId,
        username: &str,
    ) -> Result<SyncOutcome, CoreError> {
        let principal = self.load_subscriber(tenant, username)?;
        self.sync(&principal)
    }

    /// Sync every currently eligible principal of `kind`, continuing past
    /// individual failures.
    pub fn sync_all(
        &self,
        tenant: TenantId,
        kind: PrincipalKind,
    ) -> Result<BatchReport, CoreError> {
        let mut report = BatchReport::default();
        for principal in self.principals(tenant, kind)? {
            if !principal.is_eligible() {
                continue;
            }
            match self.sync(principal.as_ref()) {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    warn!(
                        %tenant,
                        username = principal.username(),
                        error = %e,
                        "batch sync failed"
                    );
                    report.failed += 1;
                }
            }
        }
        info!(
            %tenant,
            %kind,
            succeeded = report.succeeded,
            failed = report.failed,
            "batch sync complete"
        );
        Ok(report)
    }

    /// Delete every row for `username`, outside any principal context.
    pub fn retract(&self, tenant: TenantId, username: &str) -> Result<(), CoreError> {
        let mut txn = self.stores.auth.begin()?;
        txn.delete_username(tenant, username)?;
        txn.commit()?;
        debug!(%tenant, username, "rows retracted");
        Ok(())
    }

    // ── Side-effect mirroring ────────────────────────────────────────
    //
    // Called after a successful domain write. Failures are logged and
    // absorbed; the domain write stands.

    pub(crate) fn mirror(&self, principal: &dyn Principal) {
        if let Err(e) = self.sync(principal) {
            warn!(
                tenant = %principal.tenant_id(),
                username = principal.username(),
                error = %e,
                "mirror sync failed; authorization store may be stale"
            );
        }
    }

    /// Mirror the voucher as currently stored, not as the caller last saw
    /// it; a concurrent transition may already have landed.
    pub(crate) fn mirror_voucher(&self, tenant: TenantId, code: &str) {
        match self.load_voucher(tenant, code) {
            Ok(principal) => self.mirror(&principal),
            Err(CoreError::NotFound { .. }) => self.mirror_retract(tenant, code),
            Err(e) => warn!(%tenant, code, error = %e, "mirror sync failed loading voucher"),
        }
    }

    /// Subscriber counterpart of [`Self::mirror_voucher`].
    pub(crate) fn mirror_subscriber(&self, tenant: TenantId, username: &str) {
        match self.load_subscriber(tenant, username) {
            Ok(principal) => self.mirror(&principal),
            Err(CoreError::NotFound { .. }) => self.mirror_retract(tenant, username),
            Err(e) => warn!(%tenant, username, error = %e, "mirror sync failed loading subscriber"),
        }
    }

    pub(crate) fn mirror_retract(&self, tenant: TenantId, username: &str) {
        if let Err(e) = self.retract(tenant, username) {
            warn!(%tenant, username, error = %e, "mirror retract failed; rows may linger");
        }
    }

    // ── Principal loading ────────────────────────────────────────────

    pub fn load_voucher(
        &self,
        tenant: TenantId,
        code: &str,
    ) -> Result<VoucherPrincipal, CoreError> {
        let voucher = self
            .stores
            .vouchers
            .voucher_by_code(tenant, code)?
            .ok_or_else(|| CoreError::not_found("voucher", code))?;
        self.voucher_principal(voucher)
    }

    pub fn load_subscriber(
        &self,
        tenant: TenantId,
        username: &str,
    ) -> Result<SubscriberPrincipal, CoreError> {
        let credential = self
            .stores
            .subscribers
            .credential_by_username(tenant, username)?
            .ok_or_else(|| CoreError::not_found("subscriber", username))?;
        self.subscriber_principal(credential)
    }

    /// Join a voucher with its package. A package of another tenant is
    /// treated as missing.
    pub fn voucher_principal(&self, voucher: Voucher) -> Result<VoucherPrincipal, CoreError> {
        let package = self
            .stores
            .catalog
            .package(voucher.package_id)?
            .filter(|p| p.tenant_id == voucher.tenant_id);
        Ok(VoucherPrincipal { voucher, package })
    }

    /// Join a credential with its subscription and the subscription's plan.
    pub fn subscriber_principal(
        &self,
        credential: SubscriberCredential,
    ) -> Result<SubscriberPrincipal, CoreError> {
        let tenant = credential.tenant_id;
        let subscription = match credential.subscription_id {
            Some(id) => self
                .stores
                .catalog
                .subscription(id)?
                .filter(|s| s.tenant_id == tenant),
            None => None,
        };
        let plan = match &subscription {
            Some(s) => self
                .stores
                .catalog
                .plan(s.plan_id)?
                .filter(|p| p.tenant_id == tenant),
            None => None,
        };
        Ok(SubscriberPrincipal {
            credential,
            subscription,
            plan,
        })
    }

    /// Every principal of `kind` in the tenant, eligible or not.
    pub fn principals(
        &self,
        tenant: TenantId,
        kind: PrincipalKind,
    ) -> Result<Vec<Box<dyn Principal>>, CoreError> {
        let mut out: Vec<Box<dyn Principal>> = Vec::new();
        match kind {
            PrincipalKind::Voucher => {
                for voucher in self.stores.vouchers.vouchers(tenant)? {
                    out.push(Box::new(self.voucher_principal(voucher)?));
                }
            }
            PrincipalKind::Subscriber => {
                for credential in self.stores.subscribers.credentials(tenant)? {
                    out.push(Box::new(self.subscriber_principal(credential)?));
                }
            }
        }
        Ok(out)
    }

    /// Whether the voucher's rows should be gone regardless of its status.
    pub(crate) fn voucher_is_spent(&self, voucher: &Voucher) -> bool {
        matches!(voucher.status, VoucherStatus::Expired | VoucherStatus::Used)
            || voucher.is_expired(self.clock.now())
    }
}
