// ── Authorization-store rows ──
//
// Mirrors the radcheck / radreply tables consulted by the RADIUS server.
// Absence of rows for a username is the denial signal.

use serde::{Deserialize, Serialize};
use strum::Display;

use super::ids::TenantId;

/// Attribute names produced by the sync engine.
pub mod attr {
    pub const CLEARTEXT_PASSWORD: &str = "Cleartext-Password";
    /// Check attribute whose `Reject` value fails authentication outright.
    pub const AUTH_TYPE: &str = "Auth-Type";
    pub const SIMULTANEOUS_USE: &str = "Simultaneous-Use";
    pub const FRAMED_IP_ADDRESS: &str = "Framed-IP-Address";
    pub const MIKROTIK_RATE_LIMIT: &str = "Mikrotik-Rate-Limit";
    pub const MIKROTIK_GROUP: &str = "Mikrotik-Group";
}

pub const AUTH_TYPE_REJECT: &str = "Reject";

/// Default assignment operator.
pub const OP_SET: &str = ":=";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
pub enum RadiusTable {
    /// Gates authentication.
    #[strum(to_string = "radcheck")]
    Check,
    /// Returned to the NAS on success.
    #[strum(to_string = "radreply")]
    Reply,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RadiusRow {
    pub table: RadiusTable,
    pub tenant_id: TenantId,
    pub username: String,
    pub attribute: String,
    pub op: String,
    pub value: String,
    pub is_active: bool,
}

impl RadiusRow {
    pub fn check(
        tenant_id: TenantId,
        username: &str,
        attribute: &str,
        value: impl Into<String>,
    ) -> Self {
        Self::new(RadiusTable::Check, tenant_id, username, attribute, value)
    }

    pub fn reply(
        tenant_id: TenantId,
        username: &str,
        attribute: &str,
        value: impl Into<String>,
    ) -> Self {
        Self::new(RadiusTable::Reply, tenant_id, username, attribute, value)
    }

    fn new(
        table: RadiusTable,
        tenant_id: TenantId,
        username: &str,
        attribute: &str,
        value: impl Into<String>,
    ) -> Self {
        Self {
            table,
            tenant_id,
            username: username.to_owned(),
            attribute: attribute.to_owned(),
            op: OP_SET.to_owned(),
            value: value.into(),
            is_active: true,
        }
    }
}
