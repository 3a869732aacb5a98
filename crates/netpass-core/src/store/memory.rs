// ── In-memory store ──
//
// Backs every store seam. Voucher and credential rows sit in `DashMap`
// tables so status compare-and-swap runs under the row's shard lock; the
// authorization tables sit behind one `RwLock` so a commit is atomic with
// respect to readers.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::collection::TenantTable;
use super::snapshot::StoreSnapshot;
use super::{
    AccountingStore, AuthStore, AuthTxn, CasOutcome, CatalogStore, SubscriberStore, VoucherStore,
    VoucherUpdate,
};
use crate::error::CoreError;
use crate::model::{
    AccountingRecord, Package, RadiusRow, RadiusTable, ServicePlan, SubscriberCredential,
    Subscription, TenantId, Voucher, VoucherStatus,
};

type RowKey = (TenantId, String);

#[derive(Default)]
pub(crate) struct RadiusTables {
    rows: BTreeMap<RowKey, Vec<RadiusRow>>,
}

pub struct MemoryStore {
    tenants: RwLock<BTreeSet<TenantId>>,
    packages: DashMap<Uuid, Package>,
    plans: DashMap<Uuid, ServicePlan>,
    subscriptions: DashMap<Uuid, Subscription>,
    credentials: TenantTable<SubscriberCredential>,
    vouchers: TenantTable<Voucher>,
    accounting: RwLock<Vec<AccountingRecord>>,
    radius: RwLock<RadiusTables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tenants: RwLock::new(BTreeSet::new()),
            packages: DashMap::new(),
            plans: DashMap::new(),
            subscriptions: DashMap::new(),
            credentials: TenantTable::new(),
            vouchers: TenantTable::new(),
            accounting: RwLock::new(Vec::new()),
            radius: RwLock::new(RadiusTables::default()),
        }
    }

    // ── Upstream writes (provisioning, billing, access-control layer) ──

    pub fn add_tenant(&self, tenant: TenantId) {
        self.tenants.write().insert(tenant);
    }

    pub fn put_package(&self, package: Package) {
        self.add_tenant(package.tenant_id);
        self.packages.insert(package.id, package);
    }

    pub fn put_plan(&self, plan: ServicePlan) {
        self.add_tenant(plan.tenant_id);
        self.plans.insert(plan.id, plan);
    }

    pub fn put_subscription(&self, subscription: Subscription) {
        self.add_tenant(subscription.tenant_id);
        self.subscriptions.insert(subscription.id, subscription);
    }

    /// Append a new session or replace the record with the same session id.
    pub fn record_accounting(&self, record: AccountingRecord) {
        self.add_tenant(record.tenant_id);
        let mut sessions = self.accounting.write();
        match sessions
            .iter_mut()
            .find(|r| r.session_id == record.session_id)
        {
            Some(existing) => *existing = record,
            None => sessions.push(record),
        }
    }

    // ── Snapshots ──

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, CoreError> {
        let store = Self::new();
        for tenant in snapshot.tenants {
            store.add_tenant(tenant);
        }
        for package in snapshot.packages {
            store.put_package(package);
        }
        for plan in snapshot.plans {
            store.put_plan(plan);
        }
        for subscription in snapshot.subscriptions {
            store.put_subscription(subscription);
        }
        for credential in snapshot.credentials {
            store.insert_credential(credential)?;
        }
        for voucher in snapshot.vouchers {
            store.insert_voucher(voucher)?;
        }
        for record in snapshot.accounting {
            store.record_accounting(record);
        }
        {
            let mut tables = store.radius.write();
            for row in snapshot.radcheck.into_iter().chain(snapshot.radreply) {
                tables
                    .rows
                    .entry((row.tenant_id, row.username.clone()))
                    .or_default()
                    .push(row);
            }
            for rows in tables.rows.values_mut() {
                rows.sort();
            }
        }
        Ok(store)
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let mut packages: Vec<Package> = self.packages.iter().map(|r| r.value().clone()).collect();
        packages.sort_by_key(|p| p.id);
        let mut plans: Vec<ServicePlan> = self.plans.iter().map(|r| r.value().clone()).collect();
        plans.sort_by_key(|p| p.id);
        let mut subscriptions: Vec<Subscription> =
            self.subscriptions.iter().map(|r| r.value().clone()).collect();
        subscriptions.sort_by_key(|s| s.id);

        let mut credentials = self.credentials.all();
        credentials.sort_by(|a, b| (a.tenant_id, &a.username).cmp(&(b.tenant_id, &b.username)));
        let mut vouchers = self.vouchers.all();
        vouchers.sort_by(|a, b| (a.tenant_id, &a.code).cmp(&(b.tenant_id, &b.code)));

        let (radcheck, radreply): (Vec<RadiusRow>, Vec<RadiusRow>) = {
            let tables = self.radius.read();
            tables
                .rows
                .values()
                .flatten()
                .cloned()
                .partition(|row| row.table == RadiusTable::Check)
        };

        StoreSnapshot {
            tenants: self.tenants.read().iter().copied().collect(),
            packages,
            plans,
            subscriptions,
            credentials,
            vouchers,
            accounting: self.accounting.read().clone(),
            radcheck,
            radreply,
        }
    }
}

// ── Authorization store ─────────────────────────────────────────────

enum Staged {
    Delete(RowKey),
    Insert(RadiusRow),
}

/// Transaction over the in-memory radcheck/radreply tables.
pub struct MemoryTxn<'a> {
    tables: &'a RwLock<RadiusTables>,
    staged: Vec<Staged>,
    committed: bool,
}

impl AuthTxn for MemoryTxn<'_> {
    fn delete_username(&mut self, tenant: TenantId, username: &str) -> Result<(), CoreError> {
        self.staged
            .push(Staged::Delete((tenant, username.to_owned())));
        Ok(())
    }

    fn insert(&mut self, row: RadiusRow) -> Result<(), CoreError> {
        self.staged.push(Staged::Insert(row));
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<(), CoreError> {
        let staged = std::mem::take(&mut self.staged);
        let mut tables = self.tables.write();
        for op in staged {
            match op {
                Staged::Delete(key) => {
                    tables.rows.remove(&key);
                }
                Staged::Insert(row) => {
                    let rows = tables
                        .rows
                        .entry((row.tenant_id, row.username.clone()))
                        .or_default();
                    rows.push(row);
                    rows.sort();
                }
            }
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for MemoryTxn<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.staged.is_empty() {
            debug!(ops = self.staged.len(), "auth transaction rolled back");
        }
    }
}

impl AuthStore for MemoryStore {
    fn begin(&self) -> Result<Box<dyn AuthTxn + '_>, CoreError> {
        Ok(Box::new(MemoryTxn {
            tables: &self.radius,
            staged: Vec::new(),
            committed: false,
        }))
    }

    fn rows_for(&self, tenant: TenantId, username: &str) -> Result<Vec<RadiusRow>, CoreError> {
        Ok(self
            .radius
            .read()
            .rows
            .get(&(tenant, username.to_owned()))
            .cloned()
            .unwrap_or_default())
    }

    fn usernames(&self, tenant: TenantId) -> Result<Vec<String>, CoreError> {
        Ok(self
            .radius
            .read()
            .rows
            .iter()
            .filter(|((t, _), rows)| *t == tenant && !rows.is_empty())
            .map(|((_, username), _)| username.clone())
            .collect())
    }
}

// ── Vouchers ────────────────────────────────────────────────────────

impl VoucherStore for MemoryStore {
    fn insert_voucher(&self, voucher: Voucher) -> Result<(), CoreError> {
        self.add_tenant(voucher.tenant_id);
        self.vouchers.insert_unique(voucher).map_err(|rejected| {
            CoreError::conflict(format!("voucher code '{}' already exists", rejected.code))
        })
    }

    fn voucher_by_code(&self, tenant: TenantId, code: &str) -> Result<Option<Voucher>, CoreError> {
        Ok(self.vouchers.find(tenant, code))
    }

    fn vouchers(&self, tenant: TenantId) -> Result<Vec<Voucher>, CoreError> {
        Ok(self.vouchers.list(tenant))
    }

    fn transition(
        &self,
        tenant: TenantId,
        id: Uuid,
        update: VoucherUpdate,
    ) -> Result<CasOutcome, CoreError> {
        self.vouchers
            .with_row_mut(tenant, id, |voucher| {
                if voucher.status != update.requires() {
                    return CasOutcome::NotApplied {
                        current: voucher.clone(),
                    };
                }
                update.apply(voucher);
                CasOutcome::Applied(voucher.clone())
            })
            .ok_or_else(|| CoreError::not_found("voucher", id))
    }

    fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<Voucher>, CoreError> {
        let mut expired = Vec::new();
        self.vouchers.for_each_mut(|voucher| {
            if voucher.status == VoucherStatus::Active && voucher.is_expired(now) {
                voucher.status = VoucherStatus::Expired;
                expired.push(voucher.clone());
            }
        });
        Ok(expired)
    }

    fn delete_voucher(&self, tenant: TenantId, id: Uuid) -> Result<Voucher, CoreError> {
        if let Some(removed) = self
            .vouchers
            .remove_unless(tenant, id, |v| v.status == VoucherStatus::Active)
        {
            return Ok(removed);
        }
        match self.vouchers.get(tenant, id) {
            Some(v) => Err(CoreError::conflict(format!(
                "voucher '{}' is active and cannot be deleted",
                v.code
            ))),
            None => Err(CoreError::not_found("voucher", id)),
        }
    }
}

// ── Catalog ─────────────────────────────────────────────────────────

impl CatalogStore for MemoryStore {
    fn tenants(&self) -> Result<Vec<TenantId>, CoreError> {
        Ok(self.tenants.read().iter().copied().collect())
    }

    fn package(&self, id: Uuid) -> Result<Option<Package>, CoreError> {
        Ok(self.packages.get(&id).map(|r| r.value().clone()))
    }

    fn plan(&self, id: Uuid) -> Result<Option<ServicePlan>, CoreError> {
        Ok(self.plans.get(&id).map(|r| r.value().clone()))
    }

    fn subscription(&self, id: Uuid) -> Result<Option<Subscription>, CoreError> {
        Ok(self.subscriptions.get(&id).map(|r| r.value().clone()))
    }
}

// ── Subscriber credentials ──────────────────────────────────────────

impl SubscriberStore for MemoryStore {
    fn credential_by_username(
        &self,
        tenant: TenantId,
        username: &str,
    ) -> Result<Option<SubscriberCredential>, CoreError> {
        Ok(self.credentials.find(tenant, username))
    }

    fn credentials(&self, tenant: TenantId) -> Result<Vec<SubscriberCredential>, CoreError> {
        Ok(self.credentials.list(tenant))
    }

    fn insert_credential(&self, credential: SubscriberCredential) -> Result<(), CoreError> {
        self.add_tenant(credential.tenant_id);
        self.credentials.insert_unique(credential).map_err(|rejected| {
            CoreError::conflict(format!("username '{}' already exists", rejected.username))
        })
    }

    fn update_credential(
        &self,
        credential: SubscriberCredential,
    ) -> Result<SubscriberCredential, CoreError> {
        let tenant = credential.tenant_id;
        let id = credential.id;
        self.credentials
            .with_row_mut(tenant, id, |row| {
                if row.username != credential.username {
                    return Err(CoreError::validation(format!(
                        "username cannot change from '{}' to '{}'",
                        row.username, credential.username
                    )));
                }
                let is_active = row.is_active;
                *row = SubscriberCredential {
                    is_active,
                    ..credential
                };
                Ok(row.clone())
            })
            .ok_or_else(|| CoreError::not_found("subscriber", id))?
    }

    fn set_active(
        &self,
        tenant: TenantId,
        username: &str,
        active: bool,
    ) -> Result<SubscriberCredential, CoreError> {
        let id = self
            .credentials
            .find(tenant, username)
            .map(|c| c.id)
            .ok_or_else(|| CoreError::not_found("subscriber", username))?;
        self.credentials
            .with_row_mut(tenant, id, |row| {
                row.is_active = active;
                row.clone()
            })
            .ok_or_else(|| CoreError::not_found("subscriber", username))
    }

    fn delete_credential(
        &self,
        tenant: TenantId,
        username: &str,
    ) -> Result<SubscriberCredential, CoreError> {
        self.credentials
            .find(tenant, username)
            .and_then(|c| self.credentials.remove_unless(tenant, c.id, |_| false))
            .ok_or_else(|| CoreError::not_found("subscriber", username))
    }
}

// ── Accounting ──────────────────────────────────────────────────────

impl AccountingStore for MemoryStore {
    fn sessions(&self, tenant: TenantId) -> Result<Vec<AccountingRecord>, CoreError> {
        let mut sessions: Vec<AccountingRecord> = self
            .accounting
            .read()
            .iter()
            .filter(|r| r.tenant_id == tenant)
            .cloned()
            .collect();
        sessions.sort_by_key(|r| r.start_time);
        Ok(sessions)
    }

    fn session(&self, session_id: &str) -> Result<Option<AccountingRecord>, CoreError> {
        Ok(self
            .accounting
            .read()
            .iter()
            .find(|r| r.session_id == session_id)
            .cloned())
    }
}
