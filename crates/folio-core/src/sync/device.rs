//! Stable per-installation device identifier.

use std::fmt;
use std::sync::{Arc, OnceLock};

use uuid::Uuid;

use crate::store::{KeyValueStore, DEVICE_ID_KEY};

/// Generates the installation's device id once and persists it.
///
/// If durable storage is unavailable the id is still generated and kept for
/// the lifetime of this process, at the cost of device continuity across
/// restarts.
#[derive(Clone)]
pub struct DeviceIdentity {
    store: Arc<dyn KeyValueStore>,
    cached: Arc<OnceLock<String>>,
}

impl fmt::Debug for DeviceIdentity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DeviceIdentity")
            .field("device_id", &self.cached.get())
            .finish_non_exhaustive()
    }
}

impl DeviceIdentity {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            cached: Arc::new(OnceLock::new()),
        }
    }

    /// Return the persisted device id, creating it on first use.
    pub fn device_id(&self) -> String {
        self.cached.get_or_init(|| self.load_or_create()).clone()
    }

    fn load_or_create(&self) -> String {
        match self.store.get(DEVICE_ID_KEY) {
            Ok(Some(existing)) if !existing.trim().is_empty() => return existing.trim().to_string(),
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(
                    "Device id storage unavailable, using a process-local id: {}",
                    error
                );
                return Uuid::new_v4().to_string();
            }
        }

        let device_id = Uuid::new_v4().to_string();
        if let Err(error) = self.store.set(DEVICE_ID_KEY, &device_id) {
            tracing::warn!(
                "Failed to persist device id, continuity across restarts is lost: {}",
                error
            );
        } else {
            tracing::info!("Registered new device id {}", device_id);
        }
        device_id
    }
}
