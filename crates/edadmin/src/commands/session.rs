//! `login` / `logout`: obtain and forget the cached session of a profile.
//!
//! The uid is stored in the profile, the cookie in the system keyring.
//! Later commands pick the session up before falling back to a password.

use std::time::Duration;

use secrecy::SecretString;

use edadmin_api::ApiClient;
use edadmin_core::{AuthCredentials, ClientConfig, TlsVerification};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config;
use crate::error::CliError;

use super::util;

pub async fn login(args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);
    let mut profile = cfg.profiles.get(&profile_name).cloned().unwrap_or_default();

    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }
    if profile.url.is_empty() {
        return Err(CliError::NoConfig {
            path: config::config_path().display().to_string(),
        });
    }
    let url = edadmin_config::parse_url(&profile.url)?;

    if let Some(username) = args.username {
        profile.username = Some(username);
    }
    if profile.username.is_none() {
        let username: String = dialoguer::Input::new()
            .with_prompt("Username")
            .interact_text()
            .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
        profile.username = Some(username);
    }

    let (username, password) = match edadmin_config::resolve_credentials(&profile, &profile_name) {
        Ok(creds) => creds,
        Err(_) => {
            let password = rpassword::prompt_password("Password: ")?;
            (
                profile.username.clone().unwrap_or_default(),
                SecretString::from(password),
            )
        }
    };

    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        edadmin_config::tls_for(&profile, &cfg.defaults)
    };
    let client_config = ClientConfig {
        url,
        auth: AuthCredentials::Credentials {
            username: username.clone(),
            password: password.clone(),
        },
        impersonate: None,
        tls,
        timeout: Duration::from_secs(global.timeout),
    };
    let client = ApiClient::new(client_config.url.as_str(), &client_config.transport())?;

    let bar = util::spinner(&format!("Logging in to {}", client_config.url), global);
    let result = client.login(&username, &password).await;
    bar.finish_and_clear();
    let session = result.map_err(|e| match e {
        edadmin_api::Error::Authentication { message } => CliError::AuthFailed {
            profile: profile_name.clone(),
            message,
        },
        other => other.into(),
    })?;

    config::store_session_cookie(&profile_name, &session.cookie)?;
    profile.uid = Some(session.uid.clone());
    cfg.profiles.insert(profile_name.clone(), profile);
    if cfg.default_profile.is_none() {
        cfg.default_profile = Some(profile_name.clone());
    }
    config::save_config(&cfg)?;

    util::status(
        global,
        &format!("Logged in as {username} (uid {}) on profile '{profile_name}'", session.uid),
    );
    Ok(())
}

pub fn logout(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);

    config::clear_session_cookie(&profile_name)?;
    if let Some(profile) = cfg.profiles.get_mut(&profile_name) {
        if profile.uid.take().is_some() {
            config::save_config(&cfg)?;
        }
    }

    util::status(global, &format!("Logged out of profile '{profile_name}'"));
    Ok(())
}
