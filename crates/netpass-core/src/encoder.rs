// ── Rate/policy encoder ──
//
// Maps a bandwidth policy onto the NAS simple-queue rate-limit grammar.
// The consumer parses the string positionally, so token count and order
// are fixed:
//
//   <up>k/<down>k
//   <up>k/<down>k <burst_up>k/<burst_down>k <thr_up>k/<thr_down>k <time>/<time>

use crate::model::BandwidthPolicy;

/// Domain rates are stored in Mbps; the NAS expects kbps.
const KBPS_PER_MBPS: u64 = 1000;

fn kbps(mbps: u32) -> u64 {
    u64::from(mbps) * KBPS_PER_MBPS
}

/// Encode `policy` as a `Mikrotik-Rate-Limit` value.
///
/// Burst fields are ignored unless the burst flag is set and a positive
/// burst limit is configured. A missing threshold or time encodes as `0`.
pub fn rate_limit(policy: &BandwidthPolicy) -> String {
    let up = kbps(policy.upload_mbps);
    let down = kbps(policy.download_mbps);

    if !policy.has_burst() {
        return format!("{up}k/{down}k");
    }

    let limit = kbps(policy.burst_limit_mbps.unwrap_or(0));
    let threshold = kbps(policy.burst_threshold_mbps.unwrap_or(0));
    let time = policy.burst_time_secs.unwrap_or(0);

    format!("{up}k/{down}k {limit}k/{limit}k {threshold}k/{threshold}k {time}/{time}")
}
