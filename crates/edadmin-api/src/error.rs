use thiserror::Error;

/// Errors from talking to the admin API.
///
/// `edadmin-core` folds these into `CoreError`; nothing above the core
/// crate matches on them directly.
#[derive(Debug, Error)]
pub enum Error {
    /// `POST /api/login` was refused.
    #[error("login rejected: {message}")]
    Authentication { message: String },

    /// A request came back 401; the stored session is no longer valid.
    #[error("session is no longer valid, log in again")]
    SessionExpired,

    #[error("no session, run `edadmin login` first")]
    NoSession,

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("bad backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("no response within {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("TLS setup failed: {0}")]
    Tls(String),

    /// Non-2xx reply. `message` is the body's `description` when present.
    #[error("backend answered {status}: {message}")]
    Api {
        status: u16,
        title: Option<String>,
        message: String,
    },

    /// The body was not the JSON we expected; `body` keeps the raw text.
    #[error("unexpected response body: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Logging in again may fix this.
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::SessionExpired | Self::NoSession
        )
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::SessionExpired => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
