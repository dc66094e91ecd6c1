// ── Core error types ──
//
// User-facing errors from edadmin-core. Consumers never see raw HTTP
// status codes or JSON parse failures; the `From<edadmin_api::Error>` impl
// translates transport-layer errors into domain variants.

use thiserror::Error;

use crate::patch::PatchError;
use crate::viewstate::ViewStateError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {entity_type} {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Invalid data: {message}")]
    Serialization { message: String },

    // ── Binder errors ────────────────────────────────────────────────
    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("The binder has been unmounted")]
    Unmounted,

    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    ViewState(#[from] ViewStateError),

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// Short error title from the backend, e.g. "400 Bad Request".
        title: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// HTTP status behind this error, when it came from the backend.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            Self::NotFound { .. } => Some(404),
            Self::PermissionDenied { .. } => Some(403),
            Self::Conflict { .. } => Some(409),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization {
            message: err.to_string(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<edadmin_api::Error> for CoreError {
    fn from(err: edadmin_api::Error) -> Self {
        match err {
            edadmin_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            edadmin_api::Error::SessionExpired => CoreError::AuthenticationFailed {
                message: "Session expired -- log in again".into(),
            },
            edadmin_api::Error::NoSession => CoreError::AuthenticationFailed {
                message: "Not logged in".into(),
            },
            edadmin_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        title: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            edadmin_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            edadmin_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            edadmin_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            edadmin_api::Error::Api {
                status,
                title,
                message,
            } => match status {
                400 | 422 => CoreError::ValidationFailed { message },
                403 => CoreError::PermissionDenied { message },
                404 => CoreError::NotFound {
                    entity_type: "resource".into(),
                    identifier: message,
                },
                409 => CoreError::Conflict { message },
                _ => CoreError::Api {
                    message,
                    title,
                    status: Some(status),
                },
            },
            edadmin_api::Error::Deserialization { message, body: _ } => {
                CoreError::Serialization { message }
            }
        }
    }
}
