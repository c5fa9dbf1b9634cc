//! CLI configuration: thin wrapper around `gameshelf_config`.
//!
//! Resolves the active profile from `GlobalOpts` and builds the `Shelf`
//! the command handlers run against.

use std::sync::Arc;
use std::time::Duration;

use gameshelf_core::{FileStorage, Shelf};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use gameshelf_config::{Config, Profile, config_path, load_config_or_default, save_config};

/// Everything a service-bound command needs.
pub struct Context {
    pub shelf: Shelf,
    pub profile_name: String,
    pub profile: Profile,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Names of all configured profiles, sorted, for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build a `Shelf` for the active profile. The session lives in the
/// profile's data directory, so each profile stays logged in separately.
pub fn build_context(global: &GlobalOpts) -> Result<Context, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    // Without a profile, the endpoint env vars alone can drive the CLI.
    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if std::env::var("GAMESHELF_SERVICE_URL").is_ok() => Profile::default(),
        None => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
    };

    let mut shelf_config = gameshelf_config::profile_to_shelf_config(&profile, &cfg.defaults)?;
    if let Some(secs) = global.timeout {
        shelf_config.timeout = Duration::from_secs(secs);
    }

    let storage = Arc::new(FileStorage::in_dir(gameshelf_config::session_dir(&profile_name)));
    tracing::debug!(profile = %profile_name, service = %shelf_config.service_url, "building shelf");
    let shelf = Shelf::new(shelf_config, storage)?;

    Ok(Context {
        shelf,
        profile_name,
        profile,
    })
}
