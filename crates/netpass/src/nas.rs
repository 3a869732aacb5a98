//! Live-session channel the CLI hands to the engine.

use netpass_api::HotspotClient;
use netpass_core::{CoreError, LiveSession, LiveSessions, TenantId};

/// The configured NAS, or nothing when `[nas]` is absent.
///
/// Offline listing is empty, so a sweep still expires vouchers; an
/// explicit disconnect fails.
pub enum NasLink {
    Offline,
    Hotspot(HotspotClient),
}

impl LiveSessions for NasLink {
    async fn list_active(&self, tenant: TenantId) -> Result<Vec<LiveSession>, CoreError> {
        match self {
            Self::Offline => Ok(Vec::new()),
            Self::Hotspot(client) => LiveSessions::list_active(client, tenant).await,
        }
    }

    async fn disconnect(&self, tenant: TenantId, live_id: &str) -> Result<(), CoreError> {
        match self {
            Self::Offline => Err(CoreError::LiveSession {
                message: "no [nas] section configured".into(),
                transient: false,
            }),
            Self::Hotspot(client) => LiveSessions::disconnect(client, tenant, live_id).await,
        }
    }
}
