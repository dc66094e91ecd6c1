//! Configuration for the edadmin command line.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `edadmin_core::ClientConfig`. Sessions obtained by
//! `edadmin login` are cached per profile: the uid in the config file, the
//! cookie in the system keyring.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use edadmin_core::{AuthCredentials, ClientConfig, TlsVerification};

const KEYRING_SERVICE: &str = "edadmin";
const ENV_PREFIX: &str = "EDADMIN_";
const ENV_USERNAME: &str = "EDADMIN_USERNAME";
const ENV_PASSWORD: &str = "EDADMIN_PASSWORD";
const ENV_COOKIE: &str = "EDADMIN_COOKIE";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "https://mail.example.com").
    pub url: String,

    /// Login name for password authentication.
    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// User id of the cached session; its cookie lives in the keyring.
    pub uid: Option<String>,

    /// Customer id to impersonate on non-admin endpoints.
    pub impersonate: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "edadmin", "edadmin").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("edadmin");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file; a missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Keyring ─────────────────────────────────────────────────────────

fn keyring_entry(profile_name: &str, key: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/{key}"),
    )?)
}

fn keyring_get(profile_name: &str, key: &str) -> Option<SecretString> {
    keyring_entry(profile_name, key)
        .ok()?
        .get_password()
        .ok()
        .map(SecretString::from)
}

/// Store a password for `profile_name` in the system keyring.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name, "password")?.set_password(password.expose_secret())?;
    Ok(())
}

/// Cache a session cookie; the uid goes into the profile.
pub fn store_session_cookie(profile_name: &str, cookie: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name, "cookie")?.set_password(cookie.expose_secret())?;
    Ok(())
}

/// Forget a cached session cookie. Missing entries are not an error.
pub fn clear_session_cookie(profile_name: &str) -> Result<(), ConfigError> {
    match keyring_entry(profile_name, "cookie")?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve the cached session, if any: uid from the profile, cookie from
/// env or keyring.
pub fn resolve_session(profile: &Profile, profile_name: &str) -> Option<(String, SecretString)> {
    let uid = profile.uid.clone().filter(|u| !u.is_empty())?;

    // 1. Env var
    if let Ok(cookie) = std::env::var(ENV_COOKIE) {
        return Some((uid, SecretString::from(cookie)));
    }

    // 2. Keyring
    keyring_get(profile_name, "cookie").map(|cookie| (uid, cookie))
}

/// Resolve username + password without CLI flags.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var(ENV_USERNAME).ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    // 1. Profile's password_env, then the global env var
    let env_password = profile
        .password_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
        .or_else(|| std::env::var(ENV_PASSWORD).ok());
    if let Some(pw) = env_password {
        return Ok((username, SecretString::from(pw)));
    }

    // 2. Keyring
    if let Some(pw) = keyring_get(profile_name, "password") {
        return Ok((username, pw));
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok((username, SecretString::from(pw.clone())));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// A cached session wins over a password login.
pub fn resolve_auth(profile: &Profile, profile_name: &str) -> Result<AuthCredentials, ConfigError> {
    if let Some((uid, cookie)) = resolve_session(profile, profile_name) {
        debug!(profile = profile_name, "using cached session");
        return Ok(AuthCredentials::Session { uid, cookie });
    }
    let (username, password) = resolve_credentials(profile, profile_name)?;
    Ok(AuthCredentials::Credentials { username, password })
}

pub fn parse_url(raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

pub fn tls_for(profile: &Profile, defaults: &Defaults) -> TlsVerification {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Build a `ClientConfig` from a profile with no CLI flag overrides.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let url = parse_url(&profile.url)?;
    let auth = resolve_auth(profile, profile_name)?;

    Ok(ClientConfig {
        url,
        auth,
        impersonate: profile.impersonate.clone().filter(|c| !c.is_empty()),
        tls: tls_for(profile, defaults),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    })
}
