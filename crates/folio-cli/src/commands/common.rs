use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use folio_core::auth::SessionIdentity;
use folio_core::store::{FileKeyValueStore, KeyValueStore};
use folio_core::sync::{HttpTransport, SyncCoordinator};
use folio_core::{SyncConflict, SyncRecord, SyncableRecord};
use serde::Serialize;

use crate::auth::FileSessionStore;
use crate::config_profiles::{CliProfilesConfig, APP_DIR_NAME};
use crate::error::CliError;

pub const DATA_DIR_ENV: &str = "FOLIO_DATA_DIR";
const SYNC_STATE_FILE_NAME: &str = "sync-state.json";

pub type CliCoordinator = SyncCoordinator<HttpTransport, SessionIdentity<FileSessionStore>>;

#[derive(Debug, Serialize)]
pub struct SyncConflictItem {
    pub id: String,
    pub kind: String,
    pub local_updated_at: i64,
    pub remote_updated_at: i64,
    pub remote_device_id: String,
    pub remote_updated_at_iso: String,
}

pub fn resolve_profile(explicit: Option<&str>) -> Result<(CliProfilesConfig, String), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(explicit);
    Ok((config, profile_name))
}

pub fn resolve_data_dir() -> Result<PathBuf, CliError> {
    if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

pub fn sync_state_path(data_dir: &Path, profile_name: &str) -> PathBuf {
    data_dir.join(profile_name).join(SYNC_STATE_FILE_NAME)
}

pub fn open_state_store(profile_name: &str) -> Result<Arc<dyn KeyValueStore>, CliError> {
    let path = sync_state_path(&resolve_data_dir()?, profile_name);
    Ok(Arc::new(FileKeyValueStore::new(path)))
}

pub fn open_coordinator(explicit_profile: Option<&str>) -> Result<CliCoordinator, CliError> {
    let (config, profile_name) = resolve_profile(explicit_profile)?;
    let sync_config = config
        .profile(&profile_name)
        .cloned()
        .unwrap_or_default()
        .sync_config();
    if sync_config.api_base_url.is_none() {
        return Err(CliError::SyncNotConfigured(profile_name));
    }
    let endpoint = sync_config.validate().map_err(CliError::Config)?;

    let transport = HttpTransport::new(&endpoint)?;
    let sessions =
        FileSessionStore::for_profile(&profile_name).map_err(|error| CliError::Auth(error.to_string()))?;
    let store = open_state_store(&profile_name)?;

    tracing::debug!(
        "Using profile '{}' against {}",
        profile_name,
        endpoint.api_base_url
    );
    Ok(SyncCoordinator::new(
        transport,
        SessionIdentity::new(sessions),
        store,
    ))
}

pub fn read_records<R: SyncRecord>(path: &Path) -> Result<Vec<R>, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|error| CliError::RecordFile {
        path: path.to_path_buf(),
        message: error.to_string(),
    })?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&raw).map_err(|error| CliError::RecordFile {
        path: path.to_path_buf(),
        message: error.to_string(),
    })
}

pub fn write_records<R: SyncRecord>(path: &Path, records: &[R]) -> Result<(), CliError> {
    let serialized = serde_json::to_string_pretty(records)?;
    std::fs::write(path, serialized)?;
    Ok(())
}

/// Append incoming remote records whose id is not already present.
pub fn merge_incoming<R: SyncRecord>(local: &mut Vec<R>, incoming: Vec<SyncableRecord<R>>) -> usize {
    let mut added = 0;
    for remote in incoming {
        if local.iter().any(|record| record.id() == remote.id()) {
            continue;
        }
        local.push(remote.into_record());
        added += 1;
    }
    added
}

/// Overwrite the record with the same id, or append it.
pub fn replace_record<R: SyncRecord>(local: &mut Vec<R>, record: R) {
    if let Some(slot) = local.iter_mut().find(|existing| existing.id() == record.id()) {
        *slot = record;
    } else {
        local.push(record);
    }
}

pub fn sync_conflict_to_item<R: SyncRecord>(conflict: &SyncConflict<R>) -> SyncConflictItem {
    let remote = &conflict.remote_version;
    SyncConflictItem {
        id: conflict.id().to_string(),
        kind: conflict.kind.to_string(),
        local_updated_at: conflict.local_version.updated_at(),
        remote_updated_at: remote.updated_at(),
        remote_device_id: remote.sync_metadata.device_id.clone(),
        remote_updated_at_iso: format_sync_timestamp(remote.updated_at()),
    }
}

pub fn format_sync_conflict_lines<R: SyncRecord>(conflicts: &[SyncConflict<R>]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            let remote = &conflict.remote_version;
            format!(
                "{:<8}  {}  local={} remote={} remote_device={}",
                conflict.kind,
                conflict.id(),
                conflict.local_version.updated_at(),
                remote.updated_at(),
                remote.sync_metadata.device_id
            )
        })
        .collect()
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_last_sync(last_sync_time: Option<i64>) -> String {
    last_sync_time.map_or_else(
        || "never".to_string(),
        |timestamp| {
            let now_ms = Utc::now().timestamp_millis();
            format!(
                "{} ({})",
                format_sync_timestamp(timestamp),
                format_relative_time(timestamp, now_ms)
            )
        },
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}
