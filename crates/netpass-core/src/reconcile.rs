// ── Mirror reconciliation ──
//
// Diffs the desired row set of every principal against what the
// authorization store actually holds, resyncs mismatches, and retracts
// usernames no principal owns. Safe to run at any time and repeatedly.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::CoreError;
use crate::model::TenantId;
use crate::principal::{Principal, PrincipalKind};
use crate::store::Stores;
use crate::sync::SyncOrchestrator;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Principals examined.
    pub checked: usize,
    pub in_sync: usize,
    pub resynced: usize,
    /// Orphan usernames removed.
    pub retracted: usize,
    pub failed: usize,
}

impl ReconcileReport {
    pub fn drifted(&self) -> bool {
        self.resynced > 0 || self.retracted > 0 || self.failed > 0
    }
}

pub struct Reconciler {
    stores: Stores,
    sync: SyncOrchestrator,
}

impl Reconciler {
    pub fn new(stores: Stores, sync: SyncOrchestrator) -> Self {
        Self { stores, sync }
    }

    pub fn reconcile(&self, tenant: TenantId) -> Result<ReconcileReport, CoreError> {
        let mut report = ReconcileReport::default();
        let mut owned = BTreeSet::new();

        for kind in [PrincipalKind::Voucher, PrincipalKind::Subscriber] {
            for principal in self.sync.principals(tenant, kind)? {
                report.checked += 1;
                owned.insert(principal.username().to_owned());
                match self.check(tenant, principal.as_ref()) {
                    Ok(true) => report.in_sync += 1,
                    Ok(false) => report.resynced += 1,
                    Err(e) => {
                        warn!(
                            %tenant,
                            username = principal.username(),
                            error = %e,
                            "reconcile failed"
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        for username in self.stores.auth.usernames(tenant)? {
            if owned.contains(&username) {
                continue;
            }
            match self.sync.retract(tenant, &username) {
                Ok(()) => {
                    info!(%tenant, username, "orphan rows retracted");
                    report.retracted += 1;
                }
                Err(e) => {
                    warn!(%tenant, username, error = %e, "orphan retract failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            %tenant,
            checked = report.checked,
            in_sync = report.in_sync,
            resynced = report.resynced,
            retracted = report.retracted,
            failed = report.failed,
            "reconciliation complete"
        );
        Ok(report)
    }

    /// `Ok(true)` when already in sync, `Ok(false)` after a resync.
    fn check(&self, tenant: TenantId, principal: &dyn Principal) -> Result<bool, CoreError> {
        let mut desired = self.sync.plan(principal);
        desired.sort();
        let mut actual = self.stores.auth.rows_for(tenant, principal.username())?;
        actual.sort();
        if desired == actual {
            return Ok(true);
        }
        self.sync.sync(principal)?;
        Ok(false)
    }
}
