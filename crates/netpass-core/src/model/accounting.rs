// ── Accounting records ──
//
// Written by the access-control layer (RADIUS accounting); read-only here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::ids::TenantId;

/// One network session: appended at start, closed when `stop_time` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingRecord {
    /// `Acct-Session-Id` as reported by the NAS.
    pub session_id: String,
    pub tenant_id: TenantId,
    pub username: String,
    #[serde(default)]
    pub nas_ip: Option<IpAddr>,
    #[serde(default)]
    pub framed_ip: Option<IpAddr>,
    /// Calling-Station-Id, usually the client MAC.
    #[serde(default)]
    pub calling_station_id: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub stop_time: Option<DateTime<Utc>>,
    /// `Acct-Session-Time` when the NAS reported one.
    #[serde(default)]
    pub session_time_secs: Option<u64>,
    #[serde(default)]
    pub input_octets: u64,
    #[serde(default)]
    pub output_octets: u64,
    #[serde(default)]
    pub input_packets: u64,
    #[serde(default)]
    pub output_packets: u64,
    #[serde(default)]
    pub terminate_cause: Option<String>,
}

impl AccountingRecord {
    pub fn is_live(&self) -> bool {
        self.stop_time.is_none()
    }

    /// Session length in seconds, measured up to `now` for live sessions.
    pub fn duration_secs(&self, now: DateTime<Utc>) -> u64 {
        if let Some(reported) = self.session_time_secs {
            return reported;
        }
        let end = self.stop_time.unwrap_or(now);
        u64::try_from((end - self.start_time).num_seconds()).unwrap_or(0)
    }
}
