//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use edadmin_config::ConfigError;
use edadmin_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(edadmin::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             Staging servers with self-signed certificates need --insecure (-k)."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(edadmin::auth_failed),
        help(
            "Log in again with: edadmin login --profile {profile}\n\
             Or store a password with: edadmin config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(edadmin::no_credentials),
        help(
            "Log in with: edadmin login\n\
             Or set EDADMIN_USERNAME and EDADMIN_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    #[error("Access denied: {message}")]
    #[diagnostic(
        code(edadmin::permission_denied),
        help("Admin screens need an admin login; customer screens may need --as <customer>.")
    )]
    PermissionDenied { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(edadmin::not_found),
        help("Run: edadmin {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Conflict: {message}")]
    #[diagnostic(code(edadmin::conflict))]
    Conflict { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(edadmin::api_error))]
    ApiError { code: String, message: String },

    #[error("'{operation}' is not available")]
    #[diagnostic(code(edadmin::unsupported), help("{hint}"))]
    Unsupported { operation: String, hint: String },

    #[error("Another save is still running")]
    #[diagnostic(code(edadmin::save_in_progress), help("Wait for it to finish and retry."))]
    SaveInProgress,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(edadmin::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(edadmin::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: edadmin config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(edadmin::no_config),
        help(
            "Create one with: edadmin config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(edadmin::config))]
    Config(Box<figment::Error>),

    #[error("Keyring unavailable: {0}")]
    #[diagnostic(
        code(edadmin::keyring),
        help("Set EDADMIN_PASSWORD or password_env in the profile instead.")
    )]
    Keyring(#[from] keyring::Error),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(edadmin::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(edadmin::timeout),
        help("Increase timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(edadmin::json), help("Check the JSON contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::PermissionDenied { .. } | Self::Unsupported { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } | Self::SaveInProgress => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "current".into(),
                message,
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: "<resource> list".into(),
                resource_type: entity_type,
                identifier,
            },

            CoreError::Serialization { message } => CliError::ApiError {
                code: "invalid_response".into(),
                message,
            },

            CoreError::SaveInProgress => CliError::SaveInProgress,

            CoreError::Unmounted => CliError::ApiError {
                code: "unmounted".into(),
                message: "the record was closed before the request finished".into(),
            },

            CoreError::Unsupported { operation } => CliError::Unsupported {
                operation,
                hint: "This screen cannot create records; edit an existing one instead.".into(),
            },

            CoreError::Patch(e) => CliError::Validation {
                field: "patch".into(),
                reason: e.to_string(),
            },

            CoreError::ViewState(e) => CliError::Validation {
                field: "tablestate".into(),
                reason: e.to_string(),
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::PermissionDenied { message } => CliError::PermissionDenied { message },

            CoreError::Conflict { message } => CliError::Conflict { message },

            CoreError::Api {
                message,
                title,
                status,
            } => CliError::ApiError {
                code: title
                    .or_else(|| status.map(|s| s.to_string()))
                    .unwrap_or_else(|| "unknown".into()),
                message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

impl From<edadmin_api::Error> for CliError {
    fn from(err: edadmin_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Keyring(e) => CliError::Keyring(e),
            ConfigError::Serialization(e) => CliError::Validation {
                field: "config".into(),
                reason: e.to_string(),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
