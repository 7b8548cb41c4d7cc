//! Deletion of registered records
//!
//! Deletion tombstones a record: it stays queryable with status `Deleted` and
//! keeps its place in every index. Ciphertext is dropped only when the
//! configuration asks for it.

use ethers::types::Address;
use log::info;

use crate::error::{RegistryError, Result};
use crate::models::{DataId, DataStatus};
use super::Registry;

impl Registry {
    /// Delete `data_id` on behalf of its owner or the administrator
    pub fn delete_data_by_id(&self, caller: Address, data_id: DataId) -> Result<()> {
        let mut state = self.write_state()?;
        state.ensure_initialized()?;

        let (status, owner) = match state.store.get(&data_id) {
            Some(record) => (record.status, record.owner),
            None => return Err(RegistryError::UnknownDataId(data_id)),
        };

        status.transition(data_id, DataStatus::Deleted)?;

        let acting_as_admin =
            self.config.admin_can_delete && owner != caller && state.administrator == Some(caller);
        if owner != caller && !acting_as_admin {
            let error = RegistryError::NotOwner(data_id);
            self.log_rejection("deletion", caller, &error);
            return Err(error);
        }

        state.store.set_status(&data_id, DataStatus::Deleted)?;
        if self.config.redact_content_on_delete {
            state.store.redact_content(&data_id)?;
        }

        if acting_as_admin {
            info!("Deleted {} by administrator {:?}", data_id, caller);
        } else {
            info!("Deleted {} by owner {:?}", data_id, caller);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::models::{EncryptionSchema, PriceInfo};
    use crate::registry::test_support::*;

    fn registered(h: &Harness, owner: Address) -> DataId {
        let id = h
            .registry
            .prepare_registry(owner, EncryptionSchema::new(1, 2))
            .unwrap()
            .data_id;
        h.registry
            .register(owner, id, "tag".to_string(), PriceInfo::new("USDC", 5u64), vec![0xaau8, 0xbb].into())
            .unwrap();
        id
    }

    #[test]
    fn test_owner_deletes() {
        let h = harness();
        let owner = Address::repeat_byte(1);
        let id = registered(&h, owner);

        h.registry.delete_data_by_id(owner, id).unwrap();

        let record = h.registry.get_data_by_id(id).unwrap().unwrap();
        assert_eq!(record.status, DataStatus::Deleted);
        assert_eq!(record.data_content.to_vec(), vec![0xaa, 0xbb]);
        assert_eq!(h.registry.get_data_by_owner(owner).unwrap().len(), 1);
    }

    #[test]
    fn test_non_owner_is_rejected() {
        let h = harness();
        let owner = Address::repeat_byte(1);
        let id = registered(&h, owner);

        let result = h.registry.delete_data_by_id(Address::repeat_byte(2), id);

        assert!(matches!(result, Err(RegistryError::NotOwner(_))));
        assert_eq!(h.registry.get_data_by_id(id).unwrap().unwrap().status, DataStatus::Registered);
    }

    #[test]
    fn test_administrator_may_delete() {
        let h = harness();
        let id = registered(&h, Address::repeat_byte(1));

        h.registry.delete_data_by_id(h.admin, id).unwrap();
        assert_eq!(h.registry.get_data_by_id(id).unwrap().unwrap().status, DataStatus::Deleted);
    }

    #[test]
    fn test_administrator_override_can_be_disabled() {
        let config = RegistryConfig { admin_can_delete: false, ..RegistryConfig::testing() };
        let h = harness_with(config, 5);
        let id = registered(&h, Address::repeat_byte(1));

        assert!(matches!(h.registry.delete_data_by_id(h.admin, id), Err(RegistryError::NotOwner(_))));
    }

    #[test]
    fn test_no_resurrection_after_delete() {
        let h = harness();
        let owner = Address::repeat_byte(1);
        let id = registered(&h, owner);
        h.registry.delete_data_by_id(owner, id).unwrap();

        assert!(matches!(
            h.registry.delete_data_by_id(owner, id),
            Err(RegistryError::InvalidTransition { from: DataStatus::Deleted, .. })
        ));
        assert!(matches!(
            h.registry.register(owner, id, "again".to_string(), PriceInfo::default(), vec![1u8].into()),
            Err(RegistryError::AlreadyRegistered(_))
        ));
        assert_eq!(h.registry.get_data_by_id(id).unwrap().unwrap().data_tag, "tag");
    }

    #[test]
    fn test_unknown_and_reserved_ids() {
        let h = harness();
        let caller = Address::repeat_byte(1);

        assert!(matches!(
            h.registry.delete_data_by_id(caller, DataId::new([0x77; 32])),
            Err(RegistryError::UnknownDataId(_))
        ));

        let reserved = h.registry.prepare_registry(caller, EncryptionSchema::new(1, 1)).unwrap().data_id;
        assert!(matches!(
            h.registry.delete_data_by_id(caller, reserved),
            Err(RegistryError::InvalidTransition { from: DataStatus::Reserved, .. })
        ));
    }

    #[test]
    fn test_redaction_keeps_metadata() {
        let config = RegistryConfig { redact_content_on_delete: true, ..RegistryConfig::testing() };
        let h = harness_with(config, 5);
        let owner = Address::repeat_byte(1);
        let id = registered(&h, owner);

        h.registry.delete_data_by_id(owner, id).unwrap();

        let record = h.registry.get_data_by_id(id).unwrap().unwrap();
        assert_eq!(record.status, DataStatus::Deleted);
        assert!(record.data_content.is_empty());
        assert_eq!(record.data_tag, "tag");
        assert_eq!(record.owner, owner);
    }
}
