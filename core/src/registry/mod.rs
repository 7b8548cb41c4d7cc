//! The registry service
//!
//! [`Registry`] owns the store, the event log and the counters behind one
//! `RwLock`. Every mutating operation validates under the write lock before it
//! touches anything and then commits its record write, index update and event
//! together, so a rejected call leaves no trace. Reads take the read lock and
//! only ever see committed state.
//!
//! The operations are split by component:
//! - [`prepare`]: reserving ids and distributing key material
//! - [`finalize`]: binding content, price and owner to a reservation
//! - [`lifecycle`]: owner or administrator deletion
//! - [`query`]: read-only lookups

pub mod prepare;
pub mod finalize;
pub mod lifecycle;
pub mod query;

pub use prepare::Preparation;

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Serialize, Deserialize};
use ethers::types::Address;
use log::{debug, info};

use crate::config::RegistryConfig;
use crate::crypto::{DomainHasher, ShamirKeyGenerator, ThresholdKeyGenerator};
use crate::error::{to_state_error, RegistryError, Result};
use crate::models::{EventRecord, RegistryEvent};
use crate::store::RegistryStore;
use crate::utils::{Clock, SystemClock};
use crate::workers::WorkerDirectory;

/// Version recorded by `initialize`
pub const INITIALIZER_VERSION: u8 = 1;

/// Everything the registry commits, as one serializable unit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryState {
    /// Records and indices
    store: RegistryStore,

    /// Append-only event log
    events: Vec<EventRecord>,

    /// Initializer version, once initialized
    version: Option<u8>,

    /// Caller of `initialize`
    administrator: Option<Address>,

    /// Next data id sequence number
    id_sequence: u64,

    /// Round-robin position in the worker directory
    worker_cursor: usize,

    /// Latest registration timestamp handed out
    last_timestamp: u64,
}

impl RegistryState {
    /// Records and indices
    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    /// Event log
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Write the state to `path`
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, bincode::serialize(self)?)?;
        Ok(())
    }

    /// Read a state written by [`RegistryState::save_to_file`]
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let mut state: RegistryState = bincode::deserialize(&bytes)?;
        state.store.reindex()?;
        Ok(state)
    }

    fn ensure_initialized(&self) -> Result<()> {
        match self.version {
            Some(_) => Ok(()),
            None => Err(RegistryError::NotInitialized),
        }
    }

    fn emit(&mut self, event: RegistryEvent) {
        let sequence = self.events.len() as u64;
        self.events.push(EventRecord { sequence, event });
    }
}

/// Confidential data registry
pub struct Registry {
    /// Configuration
    config: RegistryConfig,

    /// Hasher for ids and digests
    hasher: DomainHasher,

    /// Threshold key generation capability
    key_generator: Arc<dyn ThresholdKeyGenerator>,

    /// Worker directory collaborator
    workers: Arc<dyn WorkerDirectory>,

    /// Source of registration timestamps
    clock: Arc<dyn Clock>,

    /// Committed state
    state: RwLock<RegistryState>,
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Create an empty, uninitialized registry
    pub fn new(
        config: RegistryConfig,
        key_generator: Arc<dyn ThresholdKeyGenerator>,
        workers: Arc<dyn WorkerDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Self::restore(config, key_generator, workers, clock, RegistryState::default())
    }

    /// Create a registry with Shamir key generation and the system clock
    pub fn with_workers(config: RegistryConfig, workers: Arc<dyn WorkerDirectory>) -> Result<Self> {
        Self::new(config, Arc::new(ShamirKeyGenerator::new()), workers, Arc::new(SystemClock))
    }

    /// Resume from previously committed state
    pub fn restore(
        config: RegistryConfig,
        key_generator: Arc<dyn ThresholdKeyGenerator>,
        workers: Arc<dyn WorkerDirectory>,
        clock: Arc<dyn Clock>,
        mut state: RegistryState,
    ) -> Result<Self> {
        config.validate()?;
        state.store.reindex()?;

        Ok(Registry {
            hasher: DomainHasher::new(config.hash_algorithm),
            config,
            key_generator,
            workers,
            clock,
            state: RwLock::new(state),
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// One-time setup. The caller becomes the registry administrator.
    pub fn initialize(&self, caller: Address) -> Result<()> {
        let mut state = self.write_state()?;

        if let Some(version) = state.version {
            return Err(RegistryError::AlreadyInitialized(version));
        }

        state.version = Some(INITIALIZER_VERSION);
        state.administrator = Some(caller);
        state.emit(RegistryEvent::Initialized { version: INITIALIZER_VERSION });

        info!("Registry initialized at version {} by {:?}", INITIALIZER_VERSION, caller);
        Ok(())
    }

    /// Copy of the committed state, for persistence
    pub fn snapshot(&self) -> Result<RegistryState> {
        Ok(self.read_state()?.clone())
    }

    /// Rejected calls are reported at info level in debug mode, debug otherwise
    fn log_rejection(&self, operation: &str, caller: Address, error: &RegistryError) {
        if self.config.debug_mode {
            info!("Rejected {} by {:?}: {}", operation, caller, error);
        } else {
            debug!("Rejected {} by {:?}: {}", operation, caller, error);
        }
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, RegistryState>> {
        self.state
            .read()
            .map_err(|e| to_state_error(format!("Failed to read registry state: {}", e)))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, RegistryState>> {
        self.state
            .write()
            .map_err(|e| to_state_error(format!("Failed to write registry state: {}", e)))
    }
}

/// Thread-safe registry handle
pub type SharedRegistry = Arc<Registry>;

/// Create a shared registry with Shamir key generation and the system clock.
///
/// Installs the process logger from the configuration on first use.
pub fn create_registry(config: RegistryConfig, workers: Arc<dyn WorkerDirectory>) -> Result<SharedRegistry> {
    config.init_logging();
    Ok(Arc::new(Registry::with_workers(config, workers)?))
}
