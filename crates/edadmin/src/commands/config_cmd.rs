//! `edadmin config ...`: profile management. Runs without a backend.

use dialoguer::{Input, Select};
use secrecy::{ExposeSecret, SecretString};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),
        ConfigCommand::Show => show(global),
        ConfigCommand::Set { key, value } => set(global, &key, value),
        ConfigCommand::Profiles => {
            profiles();
            Ok(())
        }
        ConfigCommand::Use { name } => use_profile(&name),
        ConfigCommand::SetPassword { profile } => set_password(global, profile),
    }
}

fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let text = redacted_toml(&cfg)?;
    let out = output::render_single(&global.output, &cfg, |_| text.clone(), |c| {
        c.default_profile.clone().unwrap_or_default()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

/// The config as TOML with plaintext passwords masked.
fn redacted_toml(cfg: &Config) -> Result<String, CliError> {
    let mut doc = toml::Value::try_from(cfg).map_err(toml_err)?;
    let profiles = doc
        .get_mut("profiles")
        .and_then(toml::Value::as_table_mut)
        .into_iter()
        .flat_map(|t| t.iter_mut().map(|(_, v)| v));
    for profile in profiles {
        if let Some(pw) = profile.get_mut("password") {
            *pw = toml::Value::String(MASK.into());
        }
    }
    toml::to_string_pretty(&doc).map_err(toml_err)
}

fn toml_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "config".into(),
        reason: format!("cannot render config: {e}"),
    }
}

fn set(global: &GlobalOpts, key: &str, value: String) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    let name = config::active_profile_name(global, &cfg);
    apply_key(cfg.profiles.entry(name.clone()).or_default(), key, value)?;
    config::save_config(&cfg)?;
    eprintln!("✓ {name}.{key} updated");
    Ok(())
}

/// Apply one `config set` key to a profile. Secrets go through
/// `config set-password` instead.
fn apply_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    let invalid = |reason: &str| CliError::Validation {
        field: key.to_owned(),
        reason: reason.to_owned(),
    };
    match key.replace('-', "_").as_str() {
        "url" => {
            edadmin_config::parse_url(&value)?;
            profile.url = value;
        }
        "username" => profile.username = Some(value),
        "password_env" => profile.password_env = Some(value),
        "impersonate" | "as" => profile.impersonate = Some(value).filter(|v| !v.is_empty()),
        "insecure" => profile.insecure = Some(value.parse().map_err(|_| invalid("expected true or false"))?),
        "timeout" => profile.timeout = Some(value.parse().map_err(|_| invalid("expected whole seconds"))?),
        "ca_cert" => profile.ca_cert = Some(value.into()),
        _ => {
            return Err(invalid(
                "not a profile key (url, username, password_env, impersonate, insecure, timeout, ca_cert)",
            ));
        }
    }
    Ok(())
}

fn profiles() {
    let cfg = config::load_config_or_default();
    if cfg.profiles.is_empty() {
        eprintln!("No profiles yet. Create one with `edadmin config init` or `edadmin login --url ...`.");
        return;
    }
    let mut names: Vec<&String> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let is_default = cfg.default_profile.as_ref() == Some(name);
        let url = &cfg.profiles[name].url;
        println!("{} {name}  {url}", if is_default { "*" } else { " " });
    }
}

fn use_profile(name: &str) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    ensure_profile(&cfg, name)?;
    cfg.default_profile = Some(name.to_owned());
    config::save_config(&cfg)?;
    eprintln!("✓ Using profile '{name}' by default");
    Ok(())
}

fn set_password(global: &GlobalOpts, profile: Option<String>) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
    ensure_profile(&cfg, &name)?;
    let password = ask_password()?;
    config::store_password(&name, &password)?;
    eprintln!("✓ Password for '{name}' saved to the system keyring");
    Ok(())
}

fn ensure_profile(cfg: &Config, name: &str) -> Result<(), CliError> {
    if cfg.profiles.contains_key(name) {
        Ok(())
    } else {
        Err(CliError::ProfileNotFound {
            name: name.to_owned(),
            available: config::available_profiles(cfg),
        })
    }
}

fn prompt_failed(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "prompt".into(),
        reason: e.to_string(),
    }
}

fn ask_password() -> Result<SecretString, CliError> {
    let entered = rpassword::prompt_password("Password: ").map_err(prompt_failed)?;
    if entered.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "empty password".into(),
        });
    }
    Ok(SecretString::from(entered))
}

#[derive(Clone, Copy)]
enum PasswordStore {
    Keyring,
    ConfigFile,
    Nowhere,
}

impl PasswordStore {
    const CHOICES: [(Self, &'static str); 3] = [
        (Self::Keyring, "System keyring"),
        (Self::ConfigFile, "Config file, in plaintext"),
        (Self::Nowhere, "Nowhere; I'll run `edadmin login` when needed"),
    ];
}

/// First-run wizard: one profile, made the default.
fn init() -> Result<(), CliError> {
    let path = config::config_path();
    eprintln!("Setting up {}\n", path.display());

    let name: String = Input::new()
        .with_prompt("Profile")
        .default("default".into())
        .interact_text()
        .map_err(prompt_failed)?;
    let url: String = Input::new()
        .with_prompt("Admin URL")
        .validate_with(|raw: &String| edadmin_config::parse_url(raw).map(drop).map_err(|e| e.to_string()))
        .interact_text()
        .map_err(prompt_failed)?;
    let username: String = Input::new()
        .with_prompt("Admin username")
        .interact_text()
        .map_err(prompt_failed)?;
    let password = ask_password()?;

    let labels = PasswordStore::CHOICES.map(|(_, label)| label);
    let picked = Select::new()
        .with_prompt("Keep the password in")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(prompt_failed)?;
    let store = PasswordStore::CHOICES
        .get(picked)
        .map_or(PasswordStore::Nowhere, |(store, _)| *store);

    let plaintext = match store {
        PasswordStore::Keyring => {
            config::store_password(&name, &password)?;
            None
        }
        PasswordStore::ConfigFile => Some(password.expose_secret().to_owned()),
        PasswordStore::Nowhere => None,
    };

    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(
        name.clone(),
        Profile {
            url,
            username: Some(username),
            password: plaintext,
            ..Profile::default()
        },
    );
    cfg.default_profile = Some(name.clone());
    config::save_config(&cfg)?;

    eprintln!("\n✓ Saved profile '{name}' as the default");
    eprintln!("  Try: edadmin lists list");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn show_masks_plaintext_passwords() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "prod".into(),
            Profile {
                url: "https://mail.example.com".into(),
                password: Some("hunter2".into()),
                uid: Some("u1".into()),
                ..Profile::default()
            },
        );
        let text = redacted_toml(&cfg).unwrap();
        assert!(text.contains("[profiles.prod]"), "{text}");
        assert!(text.contains("password = \"****\""), "{text}");
        assert!(text.contains("uid = \"u1\""), "{text}");
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn set_validates_values() {
        let mut profile = Profile::default();
        apply_key(&mut profile, "timeout", "90".into()).unwrap();
        assert_eq!(profile.timeout, Some(90));
        apply_key(&mut profile, "ca-cert", "/etc/ca.pem".into()).unwrap();
        assert!(profile.ca_cert.is_some());
        assert!(apply_key(&mut profile, "timeout", "soon".into()).is_err());
        assert!(apply_key(&mut profile, "url", "not a url".into()).is_err());
        assert!(apply_key(&mut profile, "colour", "x".into()).is_err());
    }
}
