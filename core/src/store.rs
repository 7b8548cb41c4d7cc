//! Registry store
//!
//! Records live in an insertion-ordered arena keyed by [`DataId`]. The owner
//! index lists ids in finalization order and is only ever touched by the same
//! call that changes the record's owner, so the two cannot diverge. The store
//! itself is not synchronized; [`crate::registry::Registry`] owns it behind a
//! lock and applies each mutation as one unit.

use std::collections::HashMap;
use std::path::Path;
use serde::{Serialize, Deserialize};
use ethers::types::{Address, Bytes};
use log::debug;

use crate::crypto::DomainHasher;
use crate::error::{RegistryError, Result};
use crate::models::{domains, DataId, DataRecord, DataStatus, PriceInfo};

/// Fields bound to a reservation by finalization
#[derive(Debug, Clone)]
pub struct Finalization {
    /// Label
    pub data_tag: String,
    /// Pricing
    pub price_info: PriceInfo,
    /// Ciphertext
    pub data_content: Bytes,
    /// Submitter
    pub owner: Address,
    /// Logical finalization time
    pub registered_timestamp: u64,
}

/// Keyed record storage with global and per-owner indices
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryStore {
    /// Records in insertion order
    records: Vec<DataRecord>,

    /// Owner -> ids in finalization order
    owner_index: HashMap<Address, Vec<DataId>>,

    /// Id -> arena position, rebuilt on load
    #[serde(skip)]
    positions: HashMap<DataId, usize>,
}

impl RegistryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in any status
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether `data_id` has ever been reserved
    pub fn contains(&self, data_id: &DataId) -> bool {
        self.positions.contains_key(data_id)
    }

    /// Insert a new record. Ids are never reused.
    pub fn put(&mut self, record: DataRecord) -> Result<()> {
        if self.contains(&record.data_id) {
            return Err(RegistryError::StateError(format!("data id {} already stored", record.data_id)));
        }

        if record.status != DataStatus::Reserved {
            self.owner_index.entry(record.owner).or_default().push(record.data_id);
        }
        self.positions.insert(record.data_id, self.records.len());
        self.records.push(record);

        Ok(())
    }

    /// Latest committed state of a record
    pub fn get(&self, data_id: &DataId) -> Option<&DataRecord> {
        self.positions.get(data_id).map(|&position| &self.records[position])
    }

    fn get_mut(&mut self, data_id: &DataId) -> Result<&mut DataRecord> {
        let position = *self
            .positions
            .get(data_id)
            .ok_or(RegistryError::UnknownDataId(*data_id))?;
        Ok(&mut self.records[position])
    }

    /// Records finalized by `owner`, in finalization order
    pub fn list_by_owner(&self, owner: &Address) -> Vec<DataRecord> {
        self.owner_index
            .get(owner)
            .map(|ids| ids.iter().filter_map(|id| self.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    /// Every record, in insertion order
    pub fn list_all(&self) -> Vec<DataRecord> {
        self.records.clone()
    }

    /// Bind content and ownership to a reservation and mark it registered
    pub fn finalize(&mut self, data_id: &DataId, finalization: Finalization) -> Result<&DataRecord> {
        let position = *self
            .positions
            .get(data_id)
            .ok_or(RegistryError::UnknownDataId(*data_id))?;

        let record = &mut self.records[position];
        let next = record.status.transition(*data_id, DataStatus::Registered)?;

        record.data_tag = finalization.data_tag;
        record.price_info = finalization.price_info;
        record.data_content = finalization.data_content;
        record.owner = finalization.owner;
        record.registered_timestamp = finalization.registered_timestamp;
        record.status = next;

        self.owner_index.entry(finalization.owner).or_default().push(*data_id);

        Ok(&self.records[position])
    }

    /// Move a record along the lifecycle, returning the previous status.
    ///
    /// Registration binds an owner and must go through [`RegistryStore::finalize`].
    pub fn set_status(&mut self, data_id: &DataId, new_status: DataStatus) -> Result<DataStatus> {
        let record = self.get_mut(data_id)?;
        let previous = record.status;
        let next = previous.transition(*data_id, new_status)?;

        if next == DataStatus::Registered {
            return Err(RegistryError::StateError(format!(
                "{} cannot be registered without an owner",
                data_id
            )));
        }

        record.status = next;
        Ok(previous)
    }

    /// Drop the ciphertext of a record, keeping its metadata queryable
    pub fn redact_content(&mut self, data_id: &DataId) -> Result<()> {
        let record = self.get_mut(data_id)?;
        record.data_content = Bytes::default();
        Ok(())
    }

    /// Digest over all records in insertion order
    pub fn state_root(&self, hasher: &DomainHasher) -> [u8; 32] {
        self.records.iter().fold([0u8; 32], |root, record| {
            let digest = record.calculate_hash(hasher);
            hasher.hash_parts(domains::STATE_ROOT, &[&root[..], &digest[..]])
        })
    }

    /// Serialize the store
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize a store, rebuilding and checking its indices
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut store: RegistryStore = bincode::deserialize(bytes)?;
        store.reindex()?;
        Ok(store)
    }

    /// Rebuild the id lookup after deserialization and check the owner index
    pub(crate) fn reindex(&mut self) -> Result<()> {
        self.rebuild_positions()?;
        self.check_owner_index()
    }

    /// Write a snapshot to `path`
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)?;
        debug!("Saved registry snapshot with {} records to {}", self.len(), path.as_ref().display());
        Ok(())
    }

    /// Load a snapshot from `path`
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let store = Self::from_bytes(&bytes)?;
        debug!("Loaded registry snapshot with {} records from {}", store.len(), path.as_ref().display());
        Ok(store)
    }

    fn rebuild_positions(&mut self) -> Result<()> {
        self.positions.clear();
        for (position, record) in self.records.iter().enumerate() {
            if self.positions.insert(record.data_id, position).is_some() {
                return Err(RegistryError::StateError(format!("duplicate data id {} in snapshot", record.data_id)));
            }
        }
        Ok(())
    }

    fn check_owner_index(&self) -> Result<()> {
        let mut indexed = 0usize;
        for (owner, ids) in &self.owner_index {
            for id in ids {
                match self.get(id) {
                    Some(record) if record.owner == *owner && record.status != DataStatus::Reserved => indexed += 1,
                    _ => {
                        return Err(RegistryError::StateError(format!(
                            "owner index entry {} does not match the store",
                            id
                        )))
                    }
                }
            }
        }

        let finalized = self.records.iter().filter(|r| r.status != DataStatus::Reserved).count();
        if indexed != finalized {
            return Err(RegistryError::StateError(format!(
                "owner index covers {} of {} finalized records",
                indexed, finalized
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EncryptionSchema, WorkerId};
    use tempfile::NamedTempFile;

    fn reservation(seed: u8) -> DataRecord {
        DataRecord::reserved(
            DataId::new([seed; 32]),
            EncryptionSchema::new(1, 2),
            vec![WorkerId::new([1; 32]), WorkerId::new([2; 32])],
        )
        .unwrap()
    }

    fn finalization(owner: Address, timestamp: u64) -> Finalization {
        Finalization {
            data_tag: format!("tag-{}", timestamp),
            price_info: PriceInfo::new("USDC", timestamp),
            data_content: Bytes::from(vec![0xaa, 0xbb]),
            owner,
            registered_timestamp: timestamp,
        }
    }

    #[test]
    fn test_put_and_get() {
        let mut store = RegistryStore::new();
        store.put(reservation(1)).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&DataId::new([1; 32])).unwrap().status, DataStatus::Reserved);
        assert!(store.get(&DataId::new([2; 32])).is_none());
        assert!(store.put(reservation(1)).is_err());
    }

    #[test]
    fn test_owner_index_follows_finalization_order() {
        let alice = Address::repeat_byte(0xa1);
        let bob = Address::repeat_byte(0xb0);
        let mut store = RegistryStore::new();
        for seed in 1..=3 {
            store.put(reservation(seed)).unwrap();
        }

        store.finalize(&DataId::new([3; 32]), finalization(alice, 1)).unwrap();
        store.finalize(&DataId::new([2; 32]), finalization(bob, 2)).unwrap();
        store.finalize(&DataId::new([1; 32]), finalization(alice, 3)).unwrap();

        let ids: Vec<DataId> = store.list_by_owner(&alice).iter().map(|r| r.data_id).collect();
        assert_eq!(ids, vec![DataId::new([3; 32]), DataId::new([1; 32])]);
        assert_eq!(store.list_by_owner(&bob).len(), 1);
        assert!(store.list_by_owner(&Address::zero()).is_empty());

        let all: Vec<DataId> = store.list_all().iter().map(|r| r.data_id).collect();
        assert_eq!(all, vec![DataId::new([1; 32]), DataId::new([2; 32]), DataId::new([3; 32])]);
    }

    #[test]
    fn test_finalize_twice_keeps_first() {
        let owner = Address::repeat_byte(1);
        let mut store = RegistryStore::new();
        store.put(reservation(1)).unwrap();
        let id = DataId::new([1; 32]);

        store.finalize(&id, finalization(owner, 5)).unwrap();
        let err = store.finalize(&id, finalization(Address::repeat_byte(2), 6)).unwrap_err();

        assert!(matches!(err, RegistryError::AlreadyRegistered(_)));
        let record = store.get(&id).unwrap();
        assert_eq!(record.owner, owner);
        assert_eq!(record.registered_timestamp, 5);
        assert_eq!(store.list_by_owner(&owner).len(), 1);
        assert!(store.list_by_owner(&Address::repeat_byte(2)).is_empty());
    }

    #[test]
    fn test_set_status() {
        let owner = Address::repeat_byte(1);
        let mut store = RegistryStore::new();
        store.put(reservation(1)).unwrap();
        let id = DataId::new([1; 32]);

        assert!(store.set_status(&id, DataStatus::Registered).is_err());
        assert!(store.set_status(&id, DataStatus::Deleted).is_err());

        store.finalize(&id, finalization(owner, 1)).unwrap();
        assert_eq!(store.set_status(&id, DataStatus::Deleted).unwrap(), DataStatus::Registered);
        assert_eq!(store.get(&id).unwrap().status, DataStatus::Deleted);
        assert!(store.set_status(&id, DataStatus::Deleted).is_err());

        // Tombstones stay in the owner's listing
        assert_eq!(store.list_by_owner(&owner).len(), 1);

        assert!(matches!(
            store.set_status(&DataId::new([9; 32]), DataStatus::Deleted),
            Err(RegistryError::UnknownDataId(_))
        ));
    }

    #[test]
    fn test_state_root_changes_with_content() {
        let hasher = DomainHasher::default();
        let mut store = RegistryStore::new();
        let empty_root = store.state_root(&hasher);

        store.put(reservation(1)).unwrap();
        let reserved_root = store.state_root(&hasher);
        assert_ne!(empty_root, reserved_root);

        store.finalize(&DataId::new([1; 32]), finalization(Address::repeat_byte(1), 1)).unwrap();
        assert_ne!(reserved_root, store.state_root(&hasher));
    }

    #[test]
    fn test_snapshot_file_io() {
        let owner = Address::repeat_byte(7);
        let mut store = RegistryStore::new();
        store.put(reservation(1)).unwrap();
        store.put(reservation(2)).unwrap();
        store.finalize(&DataId::new([2; 32]), finalization(owner, 9)).unwrap();

        let temp_file = NamedTempFile::new().unwrap();
        store.save_to_file(temp_file.path()).unwrap();
        let loaded = RegistryStore::load_from_file(temp_file.path()).unwrap();

        assert_eq!(loaded.list_all(), store.list_all());
        assert_eq!(loaded.list_by_owner(&owner), store.list_by_owner(&owner));
        assert!(loaded.contains(&DataId::new([1; 32])));
        assert_eq!(loaded.state_root(&DomainHasher::default()), store.state_root(&DomainHasher::default()));
    }

    #[test]
    fn test_snapshot_rejects_inconsistent_owner_index() {
        let mut store = RegistryStore::new();
        store.put(reservation(1)).unwrap();
        store.owner_index.entry(Address::repeat_byte(3)).or_default().push(DataId::new([1; 32]));

        let bytes = store.to_bytes().unwrap();
        assert!(matches!(RegistryStore::from_bytes(&bytes), Err(RegistryError::StateError(_))));
    }
}
