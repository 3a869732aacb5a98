//! Configuration for netpass front ends.
//!
//! TOML file + `NETPASS_` environment layering, translation into
//! `netpass_core::EngineConfig`, and NAS credential resolution
//! (env var, then keyring, then plaintext).

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use netpass_api::{HotspotClient, NasCredentials, TlsMode, TransportConfig};
use netpass_core::{EngineConfig, HashCost, TenantId, VoucherSettings};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no NAS password configured for '{host}'")]
    NoCredentials { host: String },

    #[error("no [nas] section configured")]
    NoNas,

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("NAS client setup failed: {0}")]
    Nas(#[from] netpass_api::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Tenant UUID used when the command line names none.
    pub default_tenant: Option<String>,

    /// Where the CLI keeps its JSON state.
    pub state_file: Option<PathBuf>,

    #[serde(default)]
    pub vouchers: VoucherSection,

    #[serde(default)]
    pub hashing: HashingSection,

    #[serde(default)]
    pub sweeper: SweeperSection,

    /// Live-session control channel. Absent means offline.
    pub nas: Option<NasProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VoucherSection {
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    #[serde(default = "default_password_length")]
    pub password_length: usize,
    #[serde(default = "default_max_batch")]
    pub max_batch: u32,
    #[serde(default = "default_collision_retries")]
    pub collision_retries: u32,
}

impl Default for VoucherSection {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            password_length: default_password_length(),
            max_batch: default_max_batch(),
            collision_retries: default_collision_retries(),
        }
    }
}

fn default_code_length() -> usize {
    VoucherSettings::default().code_length
}
fn default_password_length() -> usize {
    VoucherSettings::default().password_length
}
fn default_max_batch() -> u32 {
    VoucherSettings::default().max_batch
}
fn default_collision_retries() -> u32 {
    VoucherSettings::default().collision_retries
}

/// Argon2id cost. Unset fields keep the argon2 defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct HashingSection {
    pub memory_kib: Option<u32>,
    pub iterations: Option<u32>,
    pub parallelism: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SweeperSection {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl Default for SweeperSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
        }
    }
}

fn default_interval() -> u64 {
    60
}

/// NAS REST endpoint for listing and removing live sessions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NasProfile {
    /// Router base URL (e.g., "https://10.0.0.1").
    pub url: String,

    pub username: String,

    /// Plaintext password (prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    #[serde(default)]
    pub insecure: bool,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    15
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("io", "netpass", "netpass")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from(".netpass").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// State file location: configured path, else the platform data dir.
pub fn state_path(config: &Config) -> PathBuf {
    config.state_file.clone().unwrap_or_else(|| {
        project_dirs().map_or_else(
            || PathBuf::from(".netpass").join("state.json"),
            |dirs| dirs.data_dir().join("state.json"),
        )
    })
}

// ── Loading ─────────────────────────────────────────────────────────

/// Defaults, then the platform config file, then `explicit`, then
/// `NETPASS_*` variables (`__` separates nested keys).
pub fn figment(explicit: Option<&Path>) -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(config_path()));
    if let Some(path) = explicit {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::prefixed("NETPASS_").split("__"))
}

pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config file {} not found", path.display()),
            )));
        }
    }
    Ok(figment(explicit).extract()?)
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    pub fn default_tenant(&self) -> Result<Option<TenantId>, ConfigError> {
        self.default_tenant
            .as_deref()
            .map(|raw| {
                raw.parse()
                    .map_err(|_| invalid("default_tenant", format!("'{raw}' is not a UUID")))
            })
            .transpose()
    }

    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let v = &self.vouchers;
        if v.code_length < 4 {
            return Err(invalid("vouchers.code_length", "must be at least 4"));
        }
        if v.password_length < 4 {
            return Err(invalid("vouchers.password_length", "must be at least 4"));
        }
        if v.max_batch == 0 {
            return Err(invalid("vouchers.max_batch", "must be positive"));
        }
        if self.sweeper.interval_secs == 0 {
            return Err(invalid("sweeper.interval_secs", "must be positive"));
        }

        let defaults = HashCost::default();
        Ok(EngineConfig {
            vouchers: VoucherSettings {
                code_length: v.code_length,
                password_length: v.password_length,
                max_batch: v.max_batch,
                collision_retries: v.collision_retries,
            },
            hash: HashCost {
                memory_kib: self.hashing.memory_kib.unwrap_or(defaults.memory_kib),
                iterations: self.hashing.iterations.unwrap_or(defaults.iterations),
                parallelism: self.hashing.parallelism.unwrap_or(defaults.parallelism),
            },
            sweep_interval: Duration::from_secs(self.sweeper.interval_secs),
        })
    }
}

// ── NAS credentials ─────────────────────────────────────────────────

impl NasProfile {
    pub fn parsed_url(&self) -> Result<url::Url, ConfigError> {
        self.url
            .parse()
            .map_err(|_| invalid("nas.url", format!("invalid URL: {}", self.url)))
    }

    pub fn transport(&self) -> TransportConfig {
        let tls = if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };
        TransportConfig {
            tls,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Resolve the NAS password: env var, then keyring `netpass/<host>`,
/// then plaintext.
pub fn resolve_nas_password(profile: &NasProfile) -> Result<SecretString, ConfigError> {
    let url = profile.parsed_url()?;
    let host = url.host_str().unwrap_or(profile.url.as_str()).to_owned();

    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new("netpass", &host) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials { host })
}

/// Build a live-session client for the configured NAS.
pub fn nas_client(profile: &NasProfile) -> Result<HotspotClient, ConfigError> {
    let url = profile.parsed_url()?;
    let password = resolve_nas_password(profile)?;
    let credentials = NasCredentials::new(profile.username.clone(), password);
    Ok(HotspotClient::new(url, credentials, &profile.transport())?)
}
