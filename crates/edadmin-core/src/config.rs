// ── Runtime connection configuration ──
//
// These types describe how to reach the admin API. They carry credential
// data and connection tuning, but never touch disk. The CLI builds a
// `ClientConfig` from its profile and hands it in.

use std::time::Duration;

use edadmin_api::{ApiClient, Session, TlsMode, TransportConfig};
use secrecy::SecretString;
use tracing::debug;
use url::Url;

use crate::error::CoreError;

/// How to authenticate with the backend.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// A session obtained earlier by `login` (uid + cookie).
    Session { uid: String, cookie: SecretString },
    /// Username and password; a session is obtained on connect.
    Credentials {
        username: String,
        password: SecretString,
    },
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed staging backends).
    DangerAcceptInvalid,
}

/// Configuration for talking to one backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend URL (e.g. `https://mail.example.com`).
    pub url: Url,
    pub auth: AuthCredentials,
    /// Customer id to impersonate on non-admin endpoints.
    pub impersonate: Option<String>,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig::new(tls, self.timeout)
    }

    /// Build an authenticated [`ApiClient`].
    ///
    /// Password credentials are exchanged for a session first.
    pub async fn connect(&self) -> Result<ApiClient, CoreError> {
        let client = ApiClient::new(self.url.as_str(), &self.transport())?;

        let session = match &self.auth {
            AuthCredentials::Session { uid, cookie } => Session::new(uid.clone(), cookie.clone()),
            AuthCredentials::Credentials { username, password } => {
                debug!(username, "exchanging credentials for a session");
                client.login(username, password).await?
            }
        };

        Ok(client.with_session(session.with_impersonate(self.impersonate.clone())))
    }
}
