//! Key preparation: the first phase of registration
//!
//! `prepare_registry` picks the workers, generates the key material, derives a
//! fresh data id and commits a `Reserved` record. Shares go out to the workers
//! only after the commit, and the caller never waits on their delivery.

use ethers::types::Address;
use log::{info, warn};

use crate::crypto::KeyMaterial;
use crate::error::{RegistryError, Result};
use crate::models::{domains, DataId, DataRecord, EncryptionSchema, RegistryEvent};
use crate::workers::{select_workers, ShareDelivery};
use super::{Registry, RegistryState};

/// Result of a successful preparation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preparation {
    /// Reserved id
    pub data_id: DataId,

    /// Public key of each share, in worker order
    pub public_keys: Vec<Vec<u8>>,
}

impl Registry {
    /// Reserve a data id for `schema` and distribute its key shares
    pub fn prepare_registry(&self, caller: Address, schema: EncryptionSchema) -> Result<Preparation> {
        if caller.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        if let Err(e) = schema.validate(self.config.max_workers_per_schema) {
            self.log_rejection("preparation", caller, &e);
            return Err(e);
        }

        let eligible = self.workers.eligible_workers();

        let (data_id, material, worker_ids) = {
            let mut state = self.write_state()?;
            state.ensure_initialized()?;

            let (worker_ids, next_cursor) = select_workers(&eligible, schema.n, state.worker_cursor)?;
            let material = self.key_generator.generate(schema.t, schema.n)?;
            check_material(&material, schema.n)?;
            let (data_id, next_sequence) = self.derive_data_id(&state, caller)?;

            let record = DataRecord::reserved(data_id, schema, worker_ids.clone())?;
            state.store.put(record)?;
            state.worker_cursor = next_cursor;
            state.id_sequence = next_sequence;
            state.emit(RegistryEvent::PrepareRegistry {
                data_id,
                public_keys: material.public_keys.clone(),
            });

            (data_id, material, worker_ids)
        };

        info!(
            "Reserved {} for {:?} with t={} n={}",
            data_id, caller, schema.t, schema.n
        );

        for (worker_id, share) in worker_ids.into_iter().zip(material.shares) {
            let delivery = ShareDelivery { worker_id, data_id, share };
            if let Err(e) = self.workers.dispatch_share(delivery) {
                warn!("Share delivery for {} to {} failed: {}", data_id, worker_id, e);
            }
        }

        Ok(Preparation { data_id, public_keys: material.public_keys })
    }

    /// Derive an id not yet present in the store.
    ///
    /// The id hashes the caller, a registry-wide sequence number and a random
    /// nonce. It is claim-checked under the write lock, so concurrent
    /// preparations cannot both take it.
    fn derive_data_id(&self, state: &RegistryState, caller: Address) -> Result<(DataId, u64)> {
        for attempt in 0..self.config.max_id_attempts as u64 {
            let sequence = state.id_sequence + attempt;
            let nonce: u64 = rand::random();
            let data_id = DataId::new(self.hasher.hash_parts(
                domains::DATA_ID,
                &[caller.as_bytes(), &sequence.to_be_bytes()[..], &nonce.to_be_bytes()[..]],
            ));

            if !state.store.contains(&data_id) {
                return Ok((data_id, sequence + 1));
            }
            warn!("Data id collision at sequence {}, retrying", sequence);
        }

        Err(RegistryError::StateError(format!(
            "no fresh data id after {} attempts",
            self.config.max_id_attempts
        )))
    }
}

fn check_material(material: &KeyMaterial, n: u32) -> Result<()> {
    if material.shares.len() != n as usize || material.public_keys.len() != n as usize {
        return Err(RegistryError::CryptoError(format!(
            "key generator returned {} shares and {} public keys for n={}",
            material.shares.len(),
            material.public_keys.len(),
            n
        )));
    }
    Ok(())
}
