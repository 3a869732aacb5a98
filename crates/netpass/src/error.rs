//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use netpass_config::ConfigError;
use netpass_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Tenant ───────────────────────────────────────────────────────
    #[error("No tenant selected")]
    #[diagnostic(
        code(netpass::no_tenant),
        help(
            "Pass --tenant <uuid>, set NETPASS_TENANT, or set default_tenant\n\
             in {config_path}"
        )
    )]
    NoTenant { config_path: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(netpass::not_found), help("{hint}"))]
    NotFound {
        resource_type: String,
        identifier: String,
        hint: String,
    },

    #[error("{resource_type} '{identifier}' belongs to another tenant")]
    #[diagnostic(
        code(netpass::forbidden),
        help("Check --tenant; records are only visible to the tenant that owns them.")
    )]
    Forbidden {
        resource_type: String,
        identifier: String,
    },

    #[error("{message}")]
    #[diagnostic(code(netpass::conflict))]
    Conflict { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(netpass::validation))]
    Validation { field: String, reason: String },

    // ── NAS ──────────────────────────────────────────────────────────
    #[error("NAS request failed: {message}")]
    #[diagnostic(
        code(netpass::nas),
        help("Check the [nas] section of your config and that the router API is reachable.")
    )]
    Nas { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(netpass::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration / state ────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(netpass::config))]
    Config(#[from] ConfigError),

    #[error("State file {path} is unreadable: {reason}")]
    #[diagnostic(
        code(netpass::state),
        help("Restore it from a backup or point --state at another file.")
    )]
    State { path: String, reason: String },

    #[error("Internal error: {0}")]
    #[diagnostic(code(netpass::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Output serialization failed: {0}")]
    #[diagnostic(code(netpass::json))]
    Json(#[from] serde_json::Error),

    #[error("Output serialization failed: {0}")]
    #[diagnostic(code(netpass::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Forbidden { .. } => exit_code::PERMISSION,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Nas { .. } => exit_code::CONNECTION,
            Self::NoTenant { .. }
            | Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub fn validation(field: &str, reason: impl std::fmt::Display) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.to_string(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                hint: list_hint(&entity_type),
                resource_type: entity_type,
                identifier,
            },

            CoreError::Forbidden {
                entity_type,
                identifier,
            } => CliError::Forbidden {
                resource_type: entity_type,
                identifier,
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Conflict { message } => CliError::Conflict { message },

            CoreError::LiveSession { message, .. } => CliError::Nas { message },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

fn list_hint(entity_type: &str) -> String {
    match entity_type {
        "voucher" => "Run: netpass vouchers list".into(),
        "subscriber" => "Run: netpass subscribers list".into(),
        "session" => "Run: netpass sessions active".into(),
        other => format!("The {other} may not be provisioned for this tenant yet."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_distinct_exit_codes() {
        let cases = [
            (CoreError::not_found("voucher", "ABC"), exit_code::NOT_FOUND),
            (CoreError::forbidden("package", "p1"), exit_code::PERMISSION),
            (CoreError::validation("bad"), exit_code::USAGE),
            (CoreError::conflict("taken"), exit_code::CONFLICT),
            (
                CoreError::LiveSession {
                    message: "down".into(),
                    transient: true,
                },
                exit_code::CONNECTION,
            ),
            (CoreError::Internal("boom".into()), exit_code::GENERAL),
        ];
        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }

    #[test]
    fn not_found_hint_points_at_list_command() {
        let err = CliError::from(CoreError::not_found("subscriber", "alice"));
        let CliError::NotFound { hint, .. } = err else {
            panic!("expected NotFound");
        };
        assert_eq!(hint, "Run: netpass subscribers list");
    }
}
