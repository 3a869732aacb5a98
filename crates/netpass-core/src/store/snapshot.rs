// ── Serializable store image ──
//
// What the CLI persists between invocations. Every field defaults so a
// hand-written fixture only needs the sections it uses.

use serde::{Deserialize, Serialize};

use crate::model::{
    AccountingRecord, Package, RadiusRow, ServicePlan, SubscriberCredential, Subscription,
    TenantId, Voucher,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    pub tenants: Vec<TenantId>,
    pub packages: Vec<Package>,
    pub plans: Vec<ServicePlan>,
    pub subscriptions: Vec<Subscription>,
    pub credentials: Vec<SubscriberCredential>,
    pub vouchers: Vec<Voucher>,
    pub accounting: Vec<AccountingRecord>,
    pub radcheck: Vec<RadiusRow>,
    pub radreply: Vec<RadiusRow>,
}
