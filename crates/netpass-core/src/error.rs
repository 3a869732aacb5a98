// ── Core error types ──
//
// Error kinds surfaced by the credential engine. Transport failures from
// the NAS control channel are folded into `LiveSession`; callers never see
// HTTP status codes directly.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Lookup errors ────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("{entity_type} '{identifier}' belongs to another tenant")]
    Forbidden {
        entity_type: String,
        identifier: String,
    },

    // ── Request errors ───────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    // ── Collaborator errors ──────────────────────────────────────────
    #[error("Live session channel error: {message}")]
    LiveSession { message: String, transient: bool },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity_type: &str, identifier: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            identifier: identifier.to_string(),
        }
    }

    pub fn forbidden(entity_type: &str, identifier: impl std::fmt::Display) -> Self {
        Self::Forbidden {
            entity_type: entity_type.into(),
            identifier: identifier.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<netpass_api::Error> for CoreError {
    fn from(err: netpass_api::Error) -> Self {
        if err.is_not_found() {
            return CoreError::not_found("live session", "(NAS reported no such item)");
        }
        let transient = err.is_transient();
        match err {
            netpass_api::Error::Authentication { message } => CoreError::LiveSession {
                message: format!("NAS authentication failed: {message}"),
                transient: false,
            },
            netpass_api::Error::InvalidUrl(e) => {
                CoreError::validation(format!("invalid NAS URL: {e}"))
            }
            other => CoreError::LiveSession {
                message: other.to_string(),
                transient,
            },
        }
    }
}
