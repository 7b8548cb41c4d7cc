//! Confidential Data Registry
//!
//! Workspace root crate. The implementation lives in `data-registry-core`,
//! re-exported here so applications can depend on a single crate.

pub use data_registry_core::*;

/// Returns the version of the package.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
