//! Shared configuration for the gameshelf CLI.
//!
//! TOML profiles, environment overlay, credential resolution (env +
//! keyring + plaintext), session file location, and translation to
//! `gameshelf_core::ShelfConfig`.

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
use url::Url;

use gameshelf_core::{CachePolicy, ShelfConfig};

/// Prefix for every environment variable this crate reads.
pub const ENV_PREFIX: &str = "GAMESHELF_";
const KEYRING_SERVICE: &str = "gameshelf";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("no password configured for profile '{profile}'")]
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
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

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

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds a cached list is reused without refetching.
    #[serde(default = "default_dedupe_secs")]
    pub dedupe_secs: u64,

    /// Seconds the derived game counts are reused.
    #[serde(default = "default_counts_secs")]
    pub counts_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            dedupe_secs: default_dedupe_secs(),
            counts_secs: default_counts_secs(),
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
fn default_dedupe_secs() -> u64 {
    2
}
fn default_counts_secs() -> u64 {
    300
}

/// A named set of service endpoints and credentials.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Collections service base URL (e.g., "http://localhost:8002").
    pub service_url: String,

    /// Auth service base URL. Login and signup need it.
    pub auth_url: Option<String>,

    /// Game catalog base URL. Search needs it.
    pub search_url: Option<String>,

    /// Email used by `login` when none is given on the command line.
    pub email: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Override the default timeout.
    pub timeout: Option<u64>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "gameshelf", "gameshelf")
}

fn home_fallback(parts: &[&str]) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.extend(parts);
    p
}

/// Config file path. `GAMESHELF_CONFIG` overrides the platform default.
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(format!("{ENV_PREFIX}CONFIG")) {
        return PathBuf::from(path);
    }
    project_dirs().map_or_else(
        || home_fallback(&[".config", "gameshelf", "config.toml"]),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory holding per-profile session files. `GAMESHELF_DATA_DIR`
/// overrides the platform default.
pub fn data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(format!("{ENV_PREFIX}DATA_DIR")) {
        return PathBuf::from(path);
    }
    project_dirs().map_or_else(
        || home_fallback(&[".local", "share", "gameshelf"]),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

/// Where the session for `profile_name` is persisted.
pub fn session_dir(profile_name: &str) -> PathBuf {
    data_dir().join("sessions").join(profile_name)
}

// ── Loading and saving ──────────────────────────────────────────────

/// Load the full Config from the default path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path`, then `GAMESHELF_*` variables
/// (`__` separates nesting, e.g. `GAMESHELF_DEFAULTS__TIMEOUT`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    Ok(figment.extract()?)
}

pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

impl Config {
    /// Profile name from an explicit choice, then `default_profile`.
    pub fn active_profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles.get(name).ok_or_else(|| ConfigError::ProfileNotFound {
            name: name.to_owned(),
        })
    }
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))?)
}

/// Email from the profile, then `GAMESHELF_EMAIL`.
pub fn resolve_email(profile: &Profile) -> Option<String> {
    profile
        .email
        .clone()
        .or_else(|| std::env::var(format!("{ENV_PREFIX}EMAIL")).ok())
}

/// Password from `GAMESHELF_PASSWORD`, then the system keyring, then
/// the plaintext profile field.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Env var
    if let Ok(pw) = std::env::var(format!("{ENV_PREFIX}PASSWORD")) {
        return Ok(SecretString::from(pw));
    }

    // 2. Keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Save a password to the system keyring for `profile_name`.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password.expose_secret())?;
    Ok(())
}

// ── Translation to core ─────────────────────────────────────────────

/// Build a `ShelfConfig` from a profile. `GAMESHELF_SERVICE_URL`,
/// `GAMESHELF_AUTH_URL`, and `GAMESHELF_SEARCH_URL` override the
/// profile's endpoints.
pub fn profile_to_shelf_config(profile: &Profile, defaults: &Defaults) -> Result<ShelfConfig, ConfigError> {
    shelf_config_with_env(profile, defaults, |name| std::env::var(name).ok())
}

/// [`profile_to_shelf_config`] with an explicit environment lookup.
pub fn shelf_config_with_env(
    profile: &Profile,
    defaults: &Defaults,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ShelfConfig, ConfigError> {
    let endpoint = |field: &str, configured: Option<&str>| -> Result<Option<Url>, ConfigError> {
        let raw = env(&format!("{ENV_PREFIX}{}", field.to_uppercase()))
            .or_else(|| configured.map(str::to_owned))
            .filter(|s| !s.trim().is_empty());
        raw.map(|s| parse_url(field, &s)).transpose()
    };

    let service_url = endpoint("service_url", Some(&profile.service_url))?.ok_or_else(|| {
        ConfigError::Validation {
            field: "service_url".into(),
            reason: "not set".into(),
        }
    })?;

    Ok(ShelfConfig {
        service_url,
        auth_url: endpoint("auth_url", profile.auth_url.as_deref())?,
        search_url: endpoint("search_url", profile.search_url.as_deref())?,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        cache: CachePolicy {
            dedupe_interval: Duration::from_secs(defaults.dedupe_secs),
            counts_dedupe_interval: Duration::from_secs(defaults.counts_secs),
        },
    })
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn profile() -> Profile {
        Profile {
            service_url: "http://localhost:8002".into(),
            auth_url: Some("http://localhost:8001".into()),
            ..Profile::default()
        }
    }

    #[test]
    fn shelf_config_from_profile() {
        let cfg = shelf_config_with_env(&profile(), &Defaults::default(), |_| None).unwrap();
        assert_eq!(cfg.service_url.as_str(), "http://localhost:8002/");
        assert_eq!(cfg.auth_url.unwrap().as_str(), "http://localhost:8001/");
        assert!(cfg.search_url.is_none());
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.cache.counts_dedupe_interval, Duration::from_secs(300));
    }

    #[test]
    fn env_overrides_profile_endpoints() {
        let cfg = shelf_config_with_env(&profile(), &Defaults::default(), |name| {
            (name == "GAMESHELF_AUTH_URL").then(|| "https://auth.example.com".to_owned())
        })
        .unwrap();
        assert_eq!(cfg.auth_url.unwrap().host_str(), Some("auth.example.com"));
    }

    #[test]
    fn invalid_url_is_a_validation_error() {
        let bad = Profile {
            service_url: "not a url".into(),
            ..Profile::default()
        };
        let err = shelf_config_with_env(&bad, &Defaults::default(), |_| None).unwrap_err();
        assert_eq!(err.to_string(), "invalid service_url: invalid URL: not a url");
    }

    #[test]
    fn missing_service_url() {
        let err = shelf_config_with_env(&Profile::default(), &Defaults::default(), |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "service_url"));
    }

    #[test]
    fn file_then_env_overlay() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                default_profile = "home"

                [defaults]
                timeout = 10

                [profiles.home]
                service_url = "http://localhost:8002"
                email = "me@example.com"
                "#,
            )?;
            jail.set_env("GAMESHELF_DEFAULTS__OUTPUT", "json");

            let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.active_profile_name(None), "home");
            assert_eq!(cfg.active_profile_name(Some("work")), "work");
            assert_eq!(cfg.defaults.timeout, 10);
            assert_eq!(cfg.defaults.output, "json");
            assert_eq!(cfg.defaults.counts_secs, 300);
            let home = cfg.profile("home").map_err(|e| e.to_string())?;
            assert_eq!(home.email.as_deref(), Some("me@example.com"));
            assert!(cfg.profile("work").is_err());
            Ok(())
        });
    }

    #[test]
    fn save_round_trips_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert("default".into(), profile());

        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(
            loaded.profile("default").unwrap().auth_url.as_deref(),
            Some("http://localhost:8001")
        );
    }
}
