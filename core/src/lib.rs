//! # Confidential Data Registry Core
//!
//! A registry for threshold-encrypted data. Registration happens in two
//! phases: `prepare_registry` reserves a data id, assigns `n` workers and
//! hands each one a key share; `register` later binds the ciphertext, price
//! and owner to that reservation. Records are never physically removed;
//! deletion leaves a queryable tombstone.
//!
//! ```text
//!  (none) --prepare_registry--> Reserved --register--> Registered --delete_data_by_id--> Deleted
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod registry;
pub mod store;
pub mod utils;
pub mod workers;

/// Re-export common types for ease of use
pub use config::RegistryConfig;
pub use crypto::{KeyMaterial, KeyShare, ShamirKeyGenerator, ThresholdKeyGenerator};
pub use error::{RegistryError, Result};
pub use models::{DataId, DataRecord, DataStatus, EncryptionSchema, EventRecord, PriceInfo, RegistryEvent, WorkerId};
pub use registry::{create_registry, Preparation, Registry, RegistryState, SharedRegistry};
pub use store::RegistryStore;
pub use workers::{ChannelWorkerDirectory, ShareDelivery, WorkerDirectory};

/// Version of the core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
