// ── Bandwidth policy ──

use serde::{Deserialize, Serialize};

/// Download/upload caps in Mbps with optional burst parameters.
///
/// Burst values are only honoured when `burst_enabled` is set and
/// `burst_limit_mbps` is positive; see [`crate::encoder`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthPolicy {
    pub download_mbps: u32,
    pub upload_mbps: u32,
    #[serde(default)]
    pub burst_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst_limit_mbps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst_threshold_mbps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst_time_secs: Option<u32>,
}

impl BandwidthPolicy {
    pub fn new(download_mbps: u32, upload_mbps: u32) -> Self {
        Self {
            download_mbps,
            upload_mbps,
            ..Self::default()
        }
    }

    pub fn with_burst(mut self, limit_mbps: u32, threshold_mbps: u32, time_secs: u32) -> Self {
        self.burst_enabled = true;
        self.burst_limit_mbps = Some(limit_mbps);
        self.burst_threshold_mbps = Some(threshold_mbps);
        self.burst_time_secs = Some(time_secs);
        self
    }

    /// Whether the burst form of the rate-limit string applies.
    pub fn has_burst(&self) -> bool {
        self.burst_enabled && self.burst_limit_mbps.is_some_and(|l| l > 0)
    }
}
