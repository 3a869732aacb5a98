use secrecy::{ExposeSecret, SecretString};

/// Credentials for the NAS REST interface.
///
/// RouterOS-style controllers accept HTTP basic auth on every request;
/// there is no session to establish or refresh.
#[derive(Debug, Clone)]
pub struct NasCredentials {
    pub username: String,
    pub password: SecretString,
}

impl NasCredentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Attach basic auth to an outgoing request.
    pub(crate) fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.basic_auth(&self.username, Some(self.password.expose_secret()))
    }
}
