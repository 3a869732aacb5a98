// ── Live-session control channel ──
//
// The access-control layer's view of who is online right now. This crate
// only lists sessions and asks for disconnects.

use std::future::Future;

use netpass_api::{HotspotActive, HotspotClient};
use serde::Serialize;

use crate::error::CoreError;
use crate::model::{MacAddress, TenantId};

/// One session currently established on the NAS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveSession {
    /// NAS-side handle used for disconnects.
    pub id: String,
    pub username: String,
    pub address: Option<String>,
    pub mac: Option<MacAddress>,
    pub uptime_secs: Option<u64>,
    pub bytes_in: Option<u64>,
    pub bytes_out: Option<u64>,
}

impl From<HotspotActive> for LiveSession {
    fn from(active: HotspotActive) -> Self {
        Self {
            mac: active
                .mac_address
                .as_deref()
                .and_then(|m| MacAddress::parse(m).ok()),
            uptime_secs: active.uptime_secs(),
            bytes_in: active.bytes_in(),
            bytes_out: active.bytes_out(),
            id: active.id,
            username: active.user,
            address: active.address,
        }
    }
}

pub trait LiveSessions: Send + Sync {
    fn list_active(
        &self,
        tenant: TenantId,
    ) -> impl Future<Output = Result<Vec<LiveSession>, CoreError>> + Send;

    fn disconnect(
        &self,
        tenant: TenantId,
        live_id: &str,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// A NAS serves exactly one tenant, so the tenant argument is not sent.
impl LiveSessions for HotspotClient {
    async fn list_active(&self, _tenant: TenantId) -> Result<Vec<LiveSession>, CoreError> {
        let active = HotspotClient::list_active(self).await?;
        Ok(active.into_iter().map(LiveSession::from).collect())
    }

    async fn disconnect(&self, _tenant: TenantId, live_id: &str) -> Result<(), CoreError> {
        self.remove_active(live_id).await?;
        Ok(())
    }
}
