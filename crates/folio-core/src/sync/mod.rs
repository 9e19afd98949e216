//! Offline multi-device sync engine.
//!
//! One session per call: pull remote records, detect divergence against the
//! local batch, and push the stamped batch only when nothing unresolved stands
//! in the way.
//!
//! ```text
//! Idle -> Syncing -> { Synced | ConflictsPending | Failed } -> Idle
//! ```

mod coordinator;
mod detect;
mod device;
mod error;
mod http;
mod memory;
mod resolve;
mod stamp;
mod state;
mod transport;

pub use coordinator::{ResolveStrategy, SyncCoordinator, SyncOptions, SyncResult};
pub use detect::ConflictDetector;
pub use device::DeviceIdentity;
pub use error::SyncError;
pub use http::HttpTransport;
pub use memory::MemoryTransport;
pub use resolve::ConflictResolver;
pub use stamp::MetadataStamper;
pub use state::{SyncOutcome, SyncPhase, SyncState};
pub use transport::{RequestContext, SyncTransport, TransportError};
