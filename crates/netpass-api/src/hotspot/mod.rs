// Hotspot active-session endpoints of the NAS REST interface.
//
// `client` holds transport mechanics (URL building, auth, error mapping);
// `models` holds the wire types exactly as the NAS serializes them.

mod client;
mod models;

pub use client::HotspotClient;
pub use models::HotspotActive;
