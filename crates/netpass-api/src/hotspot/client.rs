// NAS REST client for hotspot session control.
//
// Wraps `reqwest::Client` with base-URL handling, basic auth on every
// request, and translation of the NAS's `{error, message, detail}` bodies
// into typed errors. Callers only see decoded payloads.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::NasCredentials;
use crate::error::Error;
use crate::hotspot::models::HotspotActive;
use crate::transport::TransportConfig;

/// Error body shape returned by the NAS with non-2xx statuses.
#[derive(serde::Deserialize)]
struct RestError {
    message: Option<String>,
    detail: Option<String>,
}

#[derive(Serialize)]
struct RemoveRequest<'a> {
    #[serde(rename = ".id")]
    id: &'a str,
}

/// HTTP client for the hotspot section of a NAS REST interface.
pub struct HotspotClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: NasCredentials,
}

impl HotspotClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the router root (e.g. `https://10.0.0.1`); the
    /// `/rest/...` paths are appended per request.
    pub fn new(
        base_url: Url,
        credentials: NasCredentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, credentials))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: NasCredentials) -> Self {
        Self {
            http,
            base_url,
            credentials,
        }
    }

    /// The NAS base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// List every active hotspot session.
    pub async fn list_active(&self) -> Result<Vec<HotspotActive>, Error> {
        let url = self.rest_url("ip/hotspot/active")?;
        self.get(url).await
    }

    /// Remove (disconnect) an active session by its NAS row id.
    pub async fn remove_active(&self, id: &str) -> Result<(), Error> {
        let url = self.rest_url("ip/hotspot/active/remove")?;
        let _: serde_json::Value = self.post(url, &RemoveRequest { id }).await?;
        Ok(())
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/rest/{path}`.
    fn rest_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/rest/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let builder = self.credentials.apply(self.http.get(url));
        let resp = builder.send().await.map_err(Error::Transport)?;

        parse_response(resp).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let builder = self.credentials.apply(self.http.post(url).json(body));
        let resp = builder.send().await.map_err(Error::Transport)?;

        parse_response(resp).await
    }
}

/// Decode a response body, mapping error statuses to [`Error`].
///
/// An empty 2xx body decodes as JSON `null` (RouterOS answers `remove`
/// with `[]` or nothing depending on firmware).
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication {
            message: "NAS rejected credentials (HTTP 401)".into(),
        });
    }

    let body = resp.text().await.map_err(Error::Transport)?;

    if !status.is_success() {
        let message = serde_json::from_str::<RestError>(&body)
            .ok()
            .and_then(|e| match (e.message, e.detail) {
                (Some(m), Some(d)) => Some(format!("{m}: {d}")),
                (m, d) => m.or(d),
            })
            .unwrap_or_else(|| body.chars().take(200).collect());
        return Err(Error::Api {
            status: status.as_u16(),
            message,
        });
    }

    let body = if body.trim().is_empty() { "null" } else { body.as_str() };
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}
