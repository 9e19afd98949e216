//! Sync metadata stamping.

use crate::models::{SyncMetadata, SCHEMA_VERSION};
use crate::util::unix_timestamp_millis_now;

use super::device::DeviceIdentity;

/// Produces the `SyncMetadata` attached to outgoing records.
///
/// Stamp once per batch, immediately before transmission, so `timestamp`
/// reflects send time rather than edit time.
#[derive(Debug, Clone)]
pub struct MetadataStamper {
    device: DeviceIdentity,
}

impl MetadataStamper {
    pub const fn new(device: DeviceIdentity) -> Self {
        Self { device }
    }

    pub const fn device(&self) -> &DeviceIdentity {
        &self.device
    }

    /// Stamp for `user_id` using this installation's device id.
    pub fn stamp(&self, user_id: &str) -> SyncMetadata {
        self.stamp_as(user_id, &self.device.device_id())
    }

    /// Stamp for `user_id` attributing the record to an explicit device.
    pub fn stamp_as(&self, user_id: &str, device_id: &str) -> SyncMetadata {
        SyncMetadata {
            user_id: user_id.to_string(),
            device_id: device_id.to_string(),
            timestamp: unix_timestamp_millis_now(),
            version: SCHEMA_VERSION,
        }
    }
}
