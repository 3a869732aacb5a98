// ── Subscriber credential ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use strum::{Display, EnumString};
use uuid::Uuid;

use super::ids::TenantId;

/// Authentication protocol the NAS negotiates with the subscriber.
///
/// All of them need a recoverable password on the RADIUS side, which is
/// why credentials keep `password` next to `password_hash`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AuthMode {
    #[default]
    Pap,
    Chap,
    MsChapV2,
}

/// Login of a billed subscriber (PPPoE / hotspot account).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberCredential {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub username: String,
    pub password_hash: String,
    /// Recoverable form required by challenge-based auth.
    pub password: String,
    #[serde(default)]
    pub auth_mode: AuthMode,
    /// Explicit NAS profile/group, overriding the plan's.
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub static_ip: Option<IpAddr>,
    pub is_active: bool,
    /// Hard cut-off independent of `is_active`.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subscription_id: Option<Uuid>,
}
