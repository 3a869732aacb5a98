// ── Upstream catalog records ──
//
// Packages, service plans, and billing subscriptions are owned by the
// provisioning and billing layers. The engine only reads them to resolve
// durations and bandwidth policies.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::ids::TenantId;
use super::policy::BandwidthPolicy;
use crate::error::CoreError;

/// Unit a package duration is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum DurationUnit {
    #[strum(to_string = "hours", serialize = "hour", serialize = "h")]
    Hours,
    #[strum(to_string = "days", serialize = "day", serialize = "d")]
    Days,
}

impl DurationUnit {
    pub fn span(self, amount: u32) -> TimeDelta {
        match self {
            Self::Hours => TimeDelta::hours(i64::from(amount)),
            Self::Days => TimeDelta::days(i64::from(amount)),
        }
    }
}

/// Prepaid hotspot package a voucher is cut from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub name: String,
    pub duration: u32,
    /// Free-form as stored upstream; parsed by [`Package::validity`].
    pub duration_unit: String,
    pub bandwidth: BandwidthPolicy,
    /// Concurrent sessions per voucher. 0 = unlimited.
    #[serde(default)]
    pub max_devices: u32,
    /// Bind the voucher to the MAC it is first activated from.
    #[serde(default)]
    pub bind_device: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Package {
    /// How long a voucher of this package stays valid after activation.
    pub fn validity(&self) -> Result<TimeDelta, CoreError> {
        let unit: DurationUnit = self.duration_unit.parse().map_err(|_| {
            CoreError::validation(format!(
                "package '{}' has unknown duration unit '{}' (expected hours or days)",
                self.name, self.duration_unit
            ))
        })?;
        if self.duration == 0 {
            return Err(CoreError::validation(format!(
                "package '{}' has a zero duration",
                self.name
            )));
        }
        Ok(unit.span(self.duration))
    }
}

/// Billed service plan behind a subscriber account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePlan {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub name: String,
    /// NAS-side profile/group name. Falls back to `name`.
    #[serde(default)]
    pub profile: Option<String>,
    pub bandwidth: BandwidthPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Suspended,
    Cancelled,
}

/// Billing relationship linking a customer to a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub tenant_id: TenantId,
    /// Billed subscriber (customer) the account belongs to.
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }
}

fn default_true() -> bool {
    true
}
