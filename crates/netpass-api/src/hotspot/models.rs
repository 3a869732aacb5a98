// Wire types for `/rest/ip/hotspot/active`.
//
// RouterOS serializes every scalar as a JSON string, including counters,
// and uses dashed keys. Accessors parse on demand so a malformed counter
// never fails the whole listing.

use serde::{Deserialize, Serialize};

/// One live hotspot session as reported by the NAS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotspotActive {
    /// NAS-internal row id (e.g. `*1A`). Used to remove the session.
    #[serde(rename = ".id")]
    pub id: String,
    /// Authenticated username (voucher code or subscriber login).
    pub user: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(rename = "mac-address", default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub uptime: Option<String>,
    #[serde(rename = "session-time-left", default)]
    pub session_time_left: Option<String>,
    #[serde(rename = "bytes-in", default)]
    pub bytes_in: Option<String>,
    #[serde(rename = "bytes-out", default)]
    pub bytes_out: Option<String>,
}

impl HotspotActive {
    pub fn bytes_in(&self) -> Option<u64> {
        self.bytes_in.as_deref().and_then(|v| v.parse().ok())
    }

    pub fn bytes_out(&self) -> Option<u64> {
        self.bytes_out.as_deref().and_then(|v| v.parse().ok())
    }

    /// Uptime in seconds, parsed from the RouterOS `1w2d3h4m5s` notation.
    pub fn uptime_secs(&self) -> Option<u64> {
        self.uptime.as_deref().and_then(parse_routeros_duration)
    }
}

/// Parse a RouterOS duration such as `1d02:03:04`, `3h4m5s` or `45s`.
pub(crate) fn parse_routeros_duration(raw: &str) -> Option<u64> {
    // Long uptimes switch to `Nd hh:mm:ss` style on some firmware.
    if let Some((days, clock)) = raw.split_once('d') {
        if clock.contains(':') {
            let days: u64 = days.parse().ok()?;
            return Some(days * 86_400 + parse_clock(clock)?);
        }
    }
    if raw.contains(':') {
        return parse_clock(raw);
    }

    let mut total = 0u64;
    let mut digits = String::new();
    for ch in raw.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let value: u64 = digits.parse().ok()?;
        digits.clear();
        let unit = match ch {
            'w' => 604_800,
            'd' => 86_400,
            'h' => 3_600,
            'm' => 60,
            's' => 1,
            _ => return None,
        };
        total += value * unit;
    }
    if digits.is_empty() { Some(total) } else { None }
}

fn parse_clock(raw: &str) -> Option<u64> {
    let mut parts = raw.split(':');
    let h: u64 = parts.next()?.parse().ok()?;
    let m: u64 = parts.next()?.parse().ok()?;
    let s: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(h * 3_600 + m * 60 + s)
}
