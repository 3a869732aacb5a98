// ── Session / accounting view ──
//
// Read-only projections over accounting records, plus a tenant-checked
// disconnect that delegates to the live-session channel.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::clock::Clock;
use crate::encoder;
use crate::error::CoreError;
use crate::live::{LiveSession, LiveSessions};
use crate::model::{AccountingRecord, MacAddress, TenantId};
use crate::store::Stores;

/// An open accounting record joined with its package or plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveSession {
    pub session_id: String,
    pub username: String,
    pub framed_ip: Option<String>,
    pub calling_station_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub elapsed_secs: u64,
    pub input_octets: u64,
    pub output_octets: u64,
    /// Package (vouchers) or service plan (subscribers) name.
    pub policy_name: Option<String>,
    pub rate_limit: Option<String>,
}

/// Usage of one owner over a date range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageSummary {
    /// Billing customer id for subscribers, username otherwise.
    pub owner: String,
    pub sessions: usize,
    pub input_octets: u64,
    pub output_octets: u64,
    pub input_packets: u64,
    pub output_packets: u64,
    pub session_secs: u64,
}

pub struct SessionView<L> {
    stores: Stores,
    live: Arc<L>,
    clock: Arc<dyn Clock>,
}

impl<L: LiveSessions> SessionView<L> {
    pub fn new(stores: Stores, live: Arc<L>, clock: Arc<dyn Clock>) -> Self {
        Self {
            stores,
            live,
            clock,
        }
    }

    /// Accounting records without a stop time, oldest first.
    pub fn active_sessions(&self, tenant: TenantId) -> Result<Vec<ActiveSession>, CoreError> {
        let now = self.clock.now();
        self.stores
            .accounting
            .sessions(tenant)?
            .into_iter()
            .filter(AccountingRecord::is_live)
            .map(|record| -> Result<ActiveSession, CoreError> {
                let (policy_name, rate_limit) = self.policy_for(tenant, &record.username)?;
                Ok(ActiveSession {
                    elapsed_secs: record.duration_secs(now),
                    framed_ip: record.framed_ip.map(|ip| ip.to_string()),
                    session_id: record.session_id,
                    username: record.username,
                    calling_station_id: record.calling_station_id,
                    start_time: record.start_time,
                    input_octets: record.input_octets,
                    output_octets: record.output_octets,
                    policy_name,
                    rate_limit,
                })
            })
            .collect()
    }

    fn policy_for(
        &self,
        tenant: TenantId,
        username: &str,
    ) -> Result<(Option<String>, Option<String>), CoreError> {
        let catalog = &self.stores.catalog;
        if let Some(voucher) = self.stores.vouchers.voucher_by_code(tenant, username)? {
            let package = catalog
                .package(voucher.package_id)?
                .filter(|p| p.tenant_id == tenant);
            return Ok(package.map_or((None, None), |p| {
                (Some(p.name), Some(encoder::rate_limit(&p.bandwidth)))
            }));
        }
        if let Some(credential) = self
            .stores
            .subscribers
            .credential_by_username(tenant, username)?
        {
            let plan = match credential.subscription_id {
                Some(id) => match catalog.subscription(id)? {
                    Some(s) if s.tenant_id == tenant => {
                        catalog.plan(s.plan_id)?.filter(|p| p.tenant_id == tenant)
                    }
                    _ => None,
                },
                None => None,
            };
            return Ok(plan.map_or((None, None), |p| {
                (Some(p.name), Some(encoder::rate_limit(&p.bandwidth)))
            }));
        }
        Ok((None, None))
    }

    /// Disconnect an accounting session after checking it belongs to
    /// `tenant`. Returns the live session that was removed.
    ///
    /// The live session is picked by framed address or client MAC; the
    /// username alone is only trusted when it identifies one session.
    pub async fn disconnect(
        &self,
        tenant: TenantId,
        session_id: &str,
    ) -> Result<LiveSession, CoreError> {
        let record = self
            .stores
            .accounting
            .session(session_id)?
            .ok_or_else(|| CoreError::not_found("session", session_id))?;
        if record.tenant_id != tenant {
            return Err(CoreError::forbidden("session", session_id));
        }
        if !record.is_live() {
            return Err(CoreError::validation(format!(
                "session '{session_id}' has already ended"
            )));
        }

        let candidates: Vec<_> = self
            .live
            .list_active(tenant)
            .await?
            .into_iter()
            .filter(|s| s.username == record.username)
            .collect();
        let target = match_live_session(&record, &candidates)?;

        self.live.disconnect(tenant, &target.id).await?;
        info!(
            %tenant,
            session_id,
            username = %record.username,
            live_id = %target.id,
            "session disconnected"
        );
        Ok(target)
    }

    /// Sum counters of sessions started in `[from, to)`, grouped by owner.
    pub fn usage(
        &self,
        tenant: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UsageSummary>, CoreError> {
        if to <= from {
            return Err(CoreError::validation("usage range end must be after its start"));
        }
        let now = self.clock.now();
        let mut owners: BTreeMap<String, UsageSummary> = BTreeMap::new();
        let mut owner_cache: BTreeMap<String, String> = BTreeMap::new();

        for record in self.stores.accounting.sessions(tenant)? {
            if record.start_time < from || record.start_time >= to {
                continue;
            }
            let owner = match owner_cache.get(&record.username) {
                Some(owner) => owner.clone(),
                None => {
                    let owner = self.owner_of(tenant, &record.username)?;
                    owner_cache.insert(record.username.clone(), owner.clone());
                    owner
                }
            };
            let entry = owners.entry(owner.clone()).or_insert_with(|| UsageSummary {
                owner,
                ..UsageSummary::default()
            });
            entry.sessions += 1;
            entry.input_octets = entry.input_octets.saturating_add(record.input_octets);
            entry.output_octets = entry.output_octets.saturating_add(record.output_octets);
            entry.input_packets = entry.input_packets.saturating_add(record.input_packets);
            entry.output_packets = entry.output_packets.saturating_add(record.output_packets);
            entry.session_secs = entry.session_secs.saturating_add(record.duration_secs(now));
        }
        Ok(owners.into_values().collect())
    }

    fn owner_of(&self, tenant: TenantId, username: &str) -> Result<String, CoreError> {
        let credential = self
            .stores
            .subscribers
            .credential_by_username(tenant, username)?;
        let Some(subscription_id) = credential.and_then(|c| c.subscription_id) else {
            return Ok(username.to_owned());
        };
        Ok(self
            .stores
            .catalog
            .subscription(subscription_id)?
            .filter(|s| s.tenant_id == tenant)
            .map_or_else(|| username.to_owned(), |s| s.customer_id.to_string()))
    }
}

/// Pick the one live session that belongs to `record` out of the live
/// sessions sharing its username.
fn match_live_session(
    record: &AccountingRecord,
    candidates: &[LiveSession],
) -> Result<LiveSession, CoreError> {
    if candidates.is_empty() {
        return Err(CoreError::not_found("live session", &record.username));
    }

    let address = record.framed_ip.map(|ip| ip.to_string());
    let mac = record
        .calling_station_id
        .as_deref()
        .and_then(|raw| MacAddress::parse(raw).ok());
    if address.is_none() && mac.is_none() {
        if let [only] = candidates {
            return Ok(only.clone());
        }
        return Err(CoreError::conflict(format!(
            "{} live sessions for '{}' and session '{}' carries no address or MAC",
            candidates.len(),
            record.username,
            record.session_id
        )));
    }

    let address_matches =
        |s: &LiveSession| address.is_some() && s.address.as_deref() == address.as_deref();
    let mac_matches = |s: &LiveSession| mac.is_some() && s.mac.as_ref() == mac.as_ref();

    let mut matched: Vec<_> = candidates
        .iter()
        .filter(|&s| address_matches(s) || mac_matches(s))
        .collect();
    if matched.len() > 1 {
        matched.retain(|&s| address_matches(s) && mac_matches(s));
    }
    match matched.as_slice() {
        [one] => Ok((*one).clone()),
        [] if candidates.len() == 1 => Ok(candidates[0].clone()),
        [] => Err(CoreError::not_found("live session", &record.session_id)),
        _ => Err(CoreError::conflict(format!(
            "session '{}' matches several live sessions for '{}'",
            record.session_id, record.username
        ))),
    }
}
