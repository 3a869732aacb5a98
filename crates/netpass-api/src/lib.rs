// netpass-api: async client for the NAS live-session control channel

pub mod auth;
pub mod error;
pub mod hotspot;
pub mod transport;

pub use auth::NasCredentials;
pub use error::Error;
pub use hotspot::{HotspotActive, HotspotClient};
pub use transport::{TlsMode, TransportConfig};
