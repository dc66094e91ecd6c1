//! CLI configuration -- thin wrapper around `edadmin_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--url, --as, --insecure, ...).

use std::time::Duration;

use edadmin_core::{ClientConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use edadmin_config::{
    Config, Profile, clear_session_cookie, config_path, load_config_or_default, save_config,
    store_password, store_session_cookie,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ClientConfig` from the config file, profile, and CLI overrides.
pub fn build_client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    match cfg.profiles.get(&profile_name) {
        Some(profile) => resolve_profile(profile, &profile_name, &cfg, global),
        // No profile -- the URL must come from --url / EDADMIN_URL, and
        // credentials from the environment.
        None if global.url.is_some() => {
            resolve_profile(&Profile::default(), &profile_name, &cfg, global)
        }
        None if global.profile.is_some() => Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        }),
        None => Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        }),
    }
}

/// Translate a `Profile` + global flags into a `ClientConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<ClientConfig, CliError> {
    // 1. URL (flag > env > profile)
    let url = edadmin_config::parse_url(global.url.as_deref().unwrap_or(&profile.url))?;

    // 2. Auth: cached session, then password
    let auth = edadmin_config::resolve_auth(profile, profile_name)?;

    // 3. TLS verification
    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        edadmin_config::tls_for(profile, &cfg.defaults)
    };

    // 4. Impersonation (flag > env > profile)
    let impersonate = global
        .impersonate
        .clone()
        .or_else(|| profile.impersonate.clone())
        .filter(|c| !c.is_empty());

    Ok(ClientConfig {
        url,
        auth,
        impersonate,
        tls,
        timeout: Duration::from_secs(global.timeout),
    })
}

pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    names.sort_unstable();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}
