//! Sync client configuration.
//!
//! Provides `SyncClientConfig`, the endpoint and timeout settings shared by
//! every front end that talks to the remote sync service.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::{is_http_url, normalize_text_option};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Raw, user-editable sync client configuration.
///
/// Values are public endpoints only. Credentials come from the identity
/// collaborator and must never be stored here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SyncClientConfig {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// Validated endpoint settings ready to build a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEndpoint {
    pub api_base_url: String,
    pub request_timeout: Duration,
}

impl SyncClientConfig {
    /// Parse a config from a raw JSON payload.
    pub fn from_json(payload: &str) -> Result<Self, String> {
        serde_json::from_str(payload).map_err(|error| format!("invalid sync config JSON: {error}"))
    }

    /// Overlay non-empty values from `other` onto `self`.
    #[must_use]
    pub fn merged_with(mut self, other: Self) -> Self {
        if let Some(url) = normalize_text_option(other.api_base_url) {
            self.api_base_url = Some(url);
        }
        if other.request_timeout_secs.is_some() {
            self.request_timeout_secs = other.request_timeout_secs;
        }
        self
    }

    /// Validate and normalize into a `SyncEndpoint`.
    pub fn validate(&self) -> Result<SyncEndpoint, String> {
        let api_base_url = normalize_text_option(self.api_base_url.clone())
            .ok_or_else(|| "sync config field 'api_base_url' is required".to_string())?;
        if !is_http_url(&api_base_url) {
            return Err("sync config field 'api_base_url' must include http:// or https://".to_string());
        }

        let timeout_secs = self
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err("sync config field 'request_timeout_secs' must be positive".to_string());
        }

        Ok(SyncEndpoint {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
