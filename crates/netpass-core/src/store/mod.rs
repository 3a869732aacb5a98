// ── Store seams ──
//
// Synchronous, object-safe traits the services are wired against. Every
// query and delete takes a `TenantId`; nothing here can see or retract
// another tenant's rows.

mod collection;
mod memory;
mod snapshot;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CoreError;
use crate::model::{
    AccountingRecord, MacAddress, Package, RadiusRow, ServicePlan, SubscriberCredential,
    Subscription, TenantId, Voucher, VoucherStatus,
};

pub use memory::{MemoryStore, MemoryTxn};
pub use snapshot::StoreSnapshot;

// ── Authorization store ─────────────────────────────────────────────

/// The radcheck/radreply tables consulted by the access-control layer.
pub trait AuthStore: Send + Sync {
    /// Open a transaction. Work staged on it is invisible until `commit`.
    fn begin(&self) -> Result<Box<dyn AuthTxn + '_>, CoreError>;

    /// Rows for one username across both tables, sorted.
    fn rows_for(&self, tenant: TenantId, username: &str) -> Result<Vec<RadiusRow>, CoreError>;

    /// Every username holding at least one row, sorted.
    fn usernames(&self, tenant: TenantId) -> Result<Vec<String>, CoreError>;
}

/// One atomic unit of work against the authorization store.
///
/// Dropping a transaction without calling `commit` discards it.
pub trait AuthTxn {
    fn delete_username(&mut self, tenant: TenantId, username: &str) -> Result<(), CoreError>;

    fn insert(&mut self, row: RadiusRow) -> Result<(), CoreError>;

    fn commit(self: Box<Self>) -> Result<(), CoreError>;
}

// ── Vouchers ────────────────────────────────────────────────────────

/// Conditional voucher state change, applied only from its source status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoucherUpdate {
    Activate {
        activated_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        device_mac: Option<MacAddress>,
    },
    Expire,
    Consume,
}

impl VoucherUpdate {
    /// Status the voucher must hold for the update to apply.
    pub fn requires(&self) -> VoucherStatus {
        match self {
            Self::Activate { .. } => VoucherStatus::Unused,
            Self::Expire | Self::Consume => VoucherStatus::Active,
        }
    }

    pub(crate) fn apply(self, voucher: &mut Voucher) {
        match self {
            Self::Activate {
                activated_at,
                expires_at,
                device_mac,
            } => {
                voucher.status = VoucherStatus::Active;
                voucher.activated_at = Some(activated_at);
                voucher.expires_at = Some(expires_at);
                voucher.device_mac = device_mac;
            }
            Self::Expire => voucher.status = VoucherStatus::Expired,
            Self::Consume => voucher.status = VoucherStatus::Used,
        }
    }
}

/// Result of a compare-and-swap on voucher status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOutcome {
    Applied(Voucher),
    /// The voucher exists but was not in the required status.
    NotApplied { current: Voucher },
}

pub trait VoucherStore: Send + Sync {
    /// `Conflict` if the code is already taken within the tenant.
    fn insert_voucher(&self, voucher: Voucher) -> Result<(), CoreError>;

    fn voucher_by_code(&self, tenant: TenantId, code: &str) -> Result<Option<Voucher>, CoreError>;

    fn vouchers(&self, tenant: TenantId) -> Result<Vec<Voucher>, CoreError>;

    /// Apply `update` iff the voucher currently holds `update.requires()`.
    ///
    /// The status check and the write happen under the same row lock.
    /// `NotFound` when no such voucher exists for the tenant.
    fn transition(
        &self,
        tenant: TenantId,
        id: Uuid,
        update: VoucherUpdate,
    ) -> Result<CasOutcome, CoreError>;

    /// Bulk `active -> expired` for every tenant's vouchers due at `now`.
    fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<Voucher>, CoreError>;

    /// Remove a voucher record. `Conflict` while it is active.
    fn delete_voucher(&self, tenant: TenantId, id: Uuid) -> Result<Voucher, CoreError>;
}

// ── Upstream catalog (read-only) ────────────────────────────────────

pub trait CatalogStore: Send + Sync {
    fn tenants(&self) -> Result<Vec<TenantId>, CoreError>;

    /// Unscoped so callers can tell `Forbidden` from `NotFound`.
    fn package(&self, id: Uuid) -> Result<Option<Package>, CoreError>;

    fn plan(&self, id: Uuid) -> Result<Option<ServicePlan>, CoreError>;

    fn subscription(&self, id: Uuid) -> Result<Option<Subscription>, CoreError>;
}

// ── Subscriber credentials ──────────────────────────────────────────

pub trait SubscriberStore: Send + Sync {
    fn credential_by_username(
        &self,
        tenant: TenantId,
        username: &str,
    ) -> Result<Option<SubscriberCredential>, CoreError>;

    fn credentials(&self, tenant: TenantId) -> Result<Vec<SubscriberCredential>, CoreError>;

    /// `Conflict` on a duplicate username within the tenant.
    fn insert_credential(&self, credential: SubscriberCredential) -> Result<(), CoreError>;

    /// Overwrite an existing credential's editable fields and return the
    /// stored row. The username cannot change, and `is_active` keeps its
    /// stored value; only `set_active` moves it.
    fn update_credential(
        &self,
        credential: SubscriberCredential,
    ) -> Result<SubscriberCredential, CoreError>;

    fn set_active(
        &self,
        tenant: TenantId,
        username: &str,
        active: bool,
    ) -> Result<SubscriberCredential, CoreError>;

    fn delete_credential(
        &self,
        tenant: TenantId,
        username: &str,
    ) -> Result<SubscriberCredential, CoreError>;
}

// ── Accounting (read-only) ──────────────────────────────────────────

pub trait AccountingStore: Send + Sync {
    fn sessions(&self, tenant: TenantId) -> Result<Vec<AccountingRecord>, CoreError>;

    fn session(&self, session_id: &str) -> Result<Option<AccountingRecord>, CoreError>;
}

// ── Bundle ──────────────────────────────────────────────────────────

/// Store handles shared by every service.
#[derive(Clone)]
pub struct Stores {
    pub auth: Arc<dyn AuthStore>,
    pub vouchers: Arc<dyn VoucherStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub subscribers: Arc<dyn SubscriberStore>,
    pub accounting: Arc<dyn AccountingStore>,
}

impl Stores {
    /// Back every seam with the same in-memory store.
    pub fn memory(store: &Arc<MemoryStore>) -> Self {
        let auth: Arc<dyn AuthStore> = store.clone();
        let vouchers: Arc<dyn VoucherStore> = store.clone();
        let catalog: Arc<dyn CatalogStore> = store.clone();
        let subscribers: Arc<dyn SubscriberStore> = store.clone();
        let accounting: Arc<dyn AccountingStore> = store.clone();
        Self {
            auth,
            vouchers,
            catalog,
            subscribers,
            accounting,
        }
    }
}
