use std::env;

use folio_core::config::SyncClientConfig;
use folio_core::util::normalize_text_option;

use crate::cli::ConfigCommands;
use crate::config_profiles::{CliProfile, CliProfilesConfig, API_BASE_URL_ENV};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            api_base_url,
            timeout_secs,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(global_profile),
            api_base_url,
            timeout_secs,
            no_activate,
        ),
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    api_base_url: Option<String>,
    timeout_secs: Option<u64>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing = config.profile(&profile_name).cloned().unwrap_or_default();

    let updated = merge_profile(
        &existing,
        api_base_url,
        normalize_text_option(env::var(API_BASE_URL_ENV).ok()),
        timeout_secs,
    )?;
    *config.profile_mut_or_default(&profile_name) = updated;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );
    println!(
        "Store a session with `folio auth login --profile {profile_name} --user-id <ID> --access-token <TOKEN>`."
    );
    Ok(())
}

/// Merge explicit flags, then the environment, then existing values, and validate.
pub fn merge_profile(
    existing: &CliProfile,
    explicit_api_base_url: Option<String>,
    env_api_base_url: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<CliProfile, CliError> {
    let api_base_url = normalize_text_option(explicit_api_base_url)
        .or(env_api_base_url)
        .or_else(|| normalize_text_option(existing.api_base_url.clone()));

    let candidate = SyncClientConfig {
        api_base_url,
        request_timeout_secs: timeout_secs.or(existing.request_timeout_secs),
    };
    let endpoint = candidate.validate().map_err(CliError::Config)?;

    Ok(CliProfile {
        api_base_url: Some(endpoint.api_base_url),
        request_timeout_secs: candidate.request_timeout_secs,
    })
}
