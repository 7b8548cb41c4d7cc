//! Read-only lookups
//!
//! Queries run under the read lock and return owned copies, so a caller never
//! observes a half-applied mutation and never changes registry state.

use ethers::types::Address;

use crate::error::Result;
use crate::models::{DataId, DataRecord, EventRecord};
use super::Registry;

impl Registry {
    /// The record for `data_id` in any status, or `None` if never reserved
    pub fn get_data_by_id(&self, data_id: DataId) -> Result<Option<DataRecord>> {
        Ok(self.read_state()?.store.get(&data_id).cloned())
    }

    /// Records owned by `owner` in any status, in finalization order
    pub fn get_data_by_owner(&self, owner: Address) -> Result<Vec<DataRecord>> {
        Ok(self.read_state()?.store.list_by_owner(&owner))
    }

    /// Every record, in reservation order
    pub fn get_all_data(&self) -> Result<Vec<DataRecord>> {
        Ok(self.read_state()?.store.list_all())
    }

    /// [`Registry::get_all_data`] as an ABI `DataInfo[]` return value
    pub fn get_all_data_abi(&self) -> Result<Vec<u8>> {
        Ok(DataRecord::encode_abi_list(&self.get_all_data()?))
    }

    /// [`Registry::get_data_by_owner`] as an ABI `DataInfo[]` return value
    pub fn get_data_by_owner_abi(&self, owner: Address) -> Result<Vec<u8>> {
        Ok(DataRecord::encode_abi_list(&self.get_data_by_owner(owner)?))
    }

    /// The full event log
    pub fn events(&self) -> Result<Vec<EventRecord>> {
        Ok(self.read_state()?.events.clone())
    }

    /// Events with `sequence >= from`
    pub fn events_since(&self, from: u64) -> Result<Vec<EventRecord>> {
        let state = self.read_state()?;
        let start = (from as usize).min(state.events.len());
        Ok(state.events[start..].to_vec())
    }

    /// Digest over every record in reservation order
    pub fn state_root(&self) -> Result<[u8; 32]> {
        Ok(self.read_state()?.store.state_root(&self.hasher))
    }

    /// Whether `initialize` has run
    pub fn is_initialized(&self) -> Result<bool> {
        Ok(self.read_state()?.version.is_some())
    }

    /// Initializer version, once initialized
    pub fn version(&self) -> Result<Option<u8>> {
        Ok(self.read_state()?.version)
    }

    /// Caller of `initialize`
    pub fn administrator(&self) -> Result<Option<Address>> {
        Ok(self.read_state()?.administrator)
    }
}
