// ── Voucher domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::ids::{MacAddress, TenantId};

/// Lifecycle state of a voucher.
///
/// `Unused -> Active -> (Expired | Used)`. `Expired` and `Used` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum VoucherStatus {
    Unused,
    Active,
    Expired,
    Used,
}

impl VoucherStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Expired | Self::Used)
    }
}

/// Prepaid, time-boxed access credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    pub id: Uuid,
    pub tenant_id: TenantId,
    /// Doubles as the RADIUS username.
    pub code: String,
    /// Argon2 PHC string. The clear password is only shown at generation.
    pub password_hash: String,
    pub package_id: Uuid,
    pub status: VoucherStatus,
    pub created_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    /// Always `activated_at + package validity`; never client supplied.
    pub expires_at: Option<DateTime<Utc>>,
    pub device_mac: Option<MacAddress>,
}

impl Voucher {
    pub fn can_be_activated(&self) -> bool {
        self.status == VoucherStatus::Unused
    }

    /// True once the expiry timestamp has passed, whatever `status` says.
    ///
    /// Lets callers treat a voucher as expired before the sweeper has
    /// caught up with it.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}
