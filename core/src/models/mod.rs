//! Data models for the registry
//!
//! Records, identifiers, pricing and threshold parameters, plus the events the
//! registry appends for off-system indexers.

mod record;
mod event;

pub use record::{DataId, WorkerId, EncryptionSchema, PriceInfo, DataStatus, DataRecord};
pub use event::{RegistryEvent, EventRecord};

/// Domain constants for registry hashing
pub mod domains {
    /// Domain for data id derivation
    pub const DATA_ID: &str = "DATAREGISTRY_DATA_ID";

    /// Domain for record digests
    pub const RECORD: &str = "DATAREGISTRY_RECORD";

    /// Domain for the registry state root
    pub const STATE_ROOT: &str = "DATAREGISTRY_STATE";
}
