//! Registration: the second phase
//!
//! Binds tag, price, ciphertext and owner to a reservation exactly once. The
//! schema and workers chosen at preparation are left untouched.

use ethers::types::{Address, Bytes};
use log::info;

use crate::error::{RegistryError, Result};
use crate::models::{DataId, DataStatus, PriceInfo, RegistryEvent};
use crate::store::Finalization;
use super::{Registry, RegistryState};

impl Registry {
    /// Finalize the reservation `data_id`; `caller` becomes its owner
    pub fn register(
        &self,
        caller: Address,
        data_id: DataId,
        data_tag: String,
        price_info: PriceInfo,
        data_content: Bytes,
    ) -> Result<DataId> {
        if caller.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }

        let mut state = self.write_state()?;
        state.ensure_initialized()?;

        // Lookup and status errors take precedence over the size limit
        if let Err(e) = precheck(&state, data_id, &data_content, self.config.max_content_size) {
            self.log_rejection("registration", caller, &e);
            return Err(e);
        }

        // Never hand out a timestamp older than one already committed
        let registered_timestamp = self.clock.now().max(state.last_timestamp);

        let finalization = Finalization {
            data_tag,
            price_info,
            data_content,
            owner: caller,
            registered_timestamp,
        };
        state.store.finalize(&data_id, finalization)?;

        state.last_timestamp = registered_timestamp;
        state.emit(RegistryEvent::Register { data_id });

        info!("Registered {} for {:?} at {}", data_id, caller, registered_timestamp);
        Ok(data_id)
    }
}

fn precheck(state: &RegistryState, data_id: DataId, data_content: &Bytes, limit: usize) -> Result<()> {
    let record = state.store.get(&data_id).ok_or(RegistryError::UnknownDataId(data_id))?;
    record.status.transition(data_id, DataStatus::Registered)?;

    if data_content.len() > limit {
        return Err(RegistryError::ContentTooLarge { size: data_content.len(), limit });
    }
    Ok(())
}
