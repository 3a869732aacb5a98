// ── Expiration sweeper ──
//
// Periodic pass with two independent steps:
//   1. disconnect live sessions whose credential has run out
//   2. demote every due `active` voucher to `expired` and retract its rows
// The steps converge within one tick; neither waits for the other.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::live::LiveSessions;
use crate::model::TenantId;
use crate::store::Stores;
use crate::sync::SyncOrchestrator;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub sessions_checked: usize,
    pub disconnected: usize,
    pub disconnect_failures: usize,
    /// Tenants whose live-session listing failed.
    pub live_failures: usize,
    pub vouchers_expired: usize,
    pub retract_failures: usize,
}

pub struct Sweeper<L> {
    stores: Stores,
    sync: SyncOrchestrator,
    live: Arc<L>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    last: watch::Sender<Option<SweepReport>>,
}

impl<L: LiveSessions + 'static> Sweeper<L> {
    pub fn new(
        stores: Stores,
        sync: SyncOrchestrator,
        live: Arc<L>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        let (last, _) = watch::channel(None);
        Self {
            stores,
            sync,
            live,
            clock,
            interval,
            last,
        }
    }

    /// Receives the report of every completed tick.
    pub fn subscribe(&self) -> watch::Receiver<Option<SweepReport>> {
        self.last.subscribe()
    }

    /// Run one tick. Per-item failures are counted and logged, never fatal.
    pub async fn sweep_once(&self) -> SweepReport {
        let now = self.clock.now();
        let mut report = SweepReport::default();

        self.disconnect_stale(now, &mut report).await;
        self.expire_due(now, &mut report);

        info!(
            checked = report.sessions_checked,
            disconnected = report.disconnected,
            expired = report.vouchers_expired,
            failures = report.disconnect_failures + report.live_failures + report.retract_failures,
            "sweep complete"
        );
        self.last.send_replace(Some(report));
        report
    }

    /// Tick on the configured interval until `cancel` fires. The first
    /// tick runs immediately.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.sweep_once().await;
                }
            }
        }
        info!("sweeper stopped");
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }

    // ── Step 1: live sessions ────────────────────────────────────────

    async fn disconnect_stale(&self, now: DateTime<Utc>, report: &mut SweepReport) {
        let tenants = match self.stores.catalog.tenants() {
            Ok(tenants) => tenants,
            Err(e) => {
                warn!(error = %e, "sweep could not list tenants");
                return;
            }
        };

        for tenant in tenants {
            let sessions = match self.live.list_active(tenant).await {
                Ok(sessions) => sessions,
                Err(e) => {
                    warn!(%tenant, error = %e, "live session listing failed");
                    report.live_failures += 1;
                    continue;
                }
            };
            for session in sessions {
                report.sessions_checked += 1;
                if !self.is_stale(tenant, &session.username, now) {
                    continue;
                }
                match self.live.disconnect(tenant, &session.id).await {
                    Ok(()) => {
                        debug!(
                            %tenant,
                            username = %session.username,
                            live_id = %session.id,
                            "stale session disconnected"
                        );
                        report.disconnected += 1;
                    }
                    Err(e) => {
                        warn!(
                            %tenant,
                            username = %session.username,
                            error = %e,
                            "disconnect failed"
                        );
                        report.disconnect_failures += 1;
                    }
                }
            }
        }
    }

    /// Whether the credential behind `username` no longer grants access.
    fn is_stale(&self, tenant: TenantId, username: &str, now: DateTime<Utc>) -> bool {
        match self.stores.vouchers.voucher_by_code(tenant, username) {
            Ok(Some(voucher)) => return self.sync.voucher_is_spent(&voucher),
            Ok(None) => {}
            Err(e) => {
                warn!(%tenant, username, error = %e, "voucher lookup failed");
                return false;
            }
        }
        match self.stores.subscribers.credential_by_username(tenant, username) {
            Ok(Some(credential)) => credential.expires_at.is_some_and(|at| at <= now),
            Ok(None) => false,
            Err(e) => {
                warn!(%tenant, username, error = %e, "subscriber lookup failed");
                false
            }
        }
    }

    // ── Step 2: domain demotion ──────────────────────────────────────

    fn expire_due(&self, now: DateTime<Utc>, report: &mut SweepReport) {
        let expired = match self.stores.vouchers.expire_due(now) {
            Ok(expired) => expired,
            Err(e) => {
                warn!(error = %e, "bulk voucher expiry failed");
                return;
            }
        };
        report.vouchers_expired = expired.len();

        for voucher in expired {
            if let Err(e) = self.sync.retract(voucher.tenant_id, &voucher.code) {
                warn!(
                    tenant = %voucher.tenant_id,
                    code = %voucher.code,
                    error = %e,
                    "retract after expiry failed"
                );
                report.retract_failures += 1;
            }
        }
    }
}
