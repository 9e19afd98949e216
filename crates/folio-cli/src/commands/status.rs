use folio_core::store::{KeyValueStore, LAST_SYNC_TIME_KEY};
use folio_core::sync::DeviceIdentity;
use serde::Serialize;

use crate::auth::load_stored_session;
use crate::commands::common::{format_last_sync, open_state_store, resolve_profile};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub profile: String,
    pub api_base_url: Option<String>,
    pub device_id: String,
    pub last_sync_time: Option<i64>,
    pub signed_in: bool,
}

pub fn run_status(as_json: bool, profile: Option<&str>) -> Result<(), CliError> {
    let (config, profile_name) = resolve_profile(profile)?;
    let store = open_state_store(&profile_name)?;
    let last_sync_time = read_last_sync_time(store.as_ref())?;
    let device_id = DeviceIdentity::new(store).device_id();
    let api_base_url = config
        .profile(&profile_name)
        .cloned()
        .unwrap_or_default()
        .sync_config()
        .api_base_url;
    let signed_in = load_stored_session(&profile_name)
        .map_err(|error| CliError::Auth(error.to_string()))?
        .is_some_and(|session| session.is_usable());

    let report = StatusReport {
        profile: profile_name,
        api_base_url,
        device_id,
        last_sync_time,
        signed_in,
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Profile:   {}", report.profile);
    println!(
        "Endpoint:  {}",
        report.api_base_url.as_deref().unwrap_or("(not configured)")
    );
    println!("Device:    {}", report.device_id);
    println!("Signed in: {}", if report.signed_in { "yes" } else { "no" });
    println!("Last sync: {}", format_last_sync(report.last_sync_time));
    Ok(())
}

pub fn read_last_sync_time(store: &dyn KeyValueStore) -> Result<Option<i64>, CliError> {
    Ok(store
        .get(LAST_SYNC_TIME_KEY)?
        .and_then(|raw| raw.trim().parse().ok()))
}
