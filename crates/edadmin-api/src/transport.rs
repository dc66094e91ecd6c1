// HTTP client construction.
//
// The admin API authenticates with per-request headers rather than cookies,
// so the only knobs are certificate trust and the request timeout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How the backend's certificate is checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsMode {
    #[default]
    System,
    /// Trust an extra PEM root, for backends behind a private CA.
    CustomCa(PathBuf),
    /// Skip verification entirely (self-signed staging installs).
    DangerAcceptInvalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    pub fn new(tls: TlsMode, timeout: Duration) -> Self {
        Self { tls, timeout }
    }

    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("edadmin/", env!("CARGO_PKG_VERSION")));

        let builder = match &self.tls {
            TlsMode::System => builder,
            TlsMode::CustomCa(path) => builder.add_root_certificate(load_root(path)?),
            TlsMode::DangerAcceptInvalid => builder.danger_accept_invalid_certs(true),
        };

        builder
            .build()
            .map_err(|e| Error::Tls(format!("cannot set up HTTP client: {e}")))
    }
}

fn load_root(path: &Path) -> Result<reqwest::Certificate, Error> {
    let pem = std::fs::read(path)
        .map_err(|e| Error::Tls(format!("cannot read {}: {e}", path.display())))?;
    reqwest::Certificate::from_pem(&pem)
        .map_err(|e| Error::Tls(format!("{} is not a PEM certificate: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ca_file_is_a_tls_error() {
        let config = TransportConfig::new(
            TlsMode::CustomCa("/nonexistent/edadmin-ca.pem".into()),
            DEFAULT_TIMEOUT,
        );
        match config.build_client() {
            Err(Error::Tls(msg)) => assert!(msg.contains("edadmin-ca.pem"), "{msg}"),
            other => panic!("expected Tls error, got {other:?}"),
        }
    }
}
