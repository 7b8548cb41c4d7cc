//! Configuration for the registry
//!
//! Limits on schemas and content, deletion policy, identifier hashing and
//! logging. Loaded from and saved to JSON.

use std::path::Path;
use serde::{Serialize, Deserialize};

use crate::crypto::HashAlgorithm;
use crate::error::{to_config_error, Result};

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Hash algorithm for data ids and record digests
    pub hash_algorithm: HashAlgorithm,

    /// Upper bound on `n` in an encryption schema
    pub max_workers_per_schema: u32,

    /// Upper bound on submitted ciphertext, in bytes
    pub max_content_size: usize,

    /// Drop ciphertext when a record is deleted
    pub redact_content_on_delete: bool,

    /// Let the administrator delete records it does not own
    pub admin_can_delete: bool,

    /// Collision retries when deriving a data id
    pub max_id_attempts: u32,

    /// Log level
    pub log_level: String,

    /// Whether to enable debug mode
    pub debug_mode: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            hash_algorithm: HashAlgorithm::default(),
            max_workers_per_schema: 256,
            max_content_size: 16 * 1024 * 1024,
            redact_content_on_delete: false,
            admin_can_delete: true,
            max_id_attempts: 8,
            log_level: "info".to_string(),
            debug_mode: false,
        }
    }
}

impl RegistryConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject settings the registry cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_workers_per_schema == 0 {
            return Err(to_config_error("max_workers_per_schema must be at least 1"));
        }
        if self.max_id_attempts == 0 {
            return Err(to_config_error("max_id_attempts must be at least 1"));
        }
        Ok(())
    }

    /// Log filter to install: debug mode forces `debug`
    pub fn effective_log_level(&self) -> &str {
        if self.debug_mode {
            "debug"
        } else {
            self.log_level.as_str()
        }
    }

    /// Install the process logger at [`RegistryConfig::effective_log_level`]
    pub fn init_logging(&self) {
        crate::utils::init_logging(self.effective_log_level());
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config: RegistryConfig = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Create a development configuration
    pub fn development() -> Self {
        RegistryConfig {
            debug_mode: true,
            log_level: "debug".to_string(),
            ..Self::default()
        }
    }

    /// Create a production configuration
    pub fn production() -> Self {
        RegistryConfig {
            debug_mode: false,
            log_level: "info".to_string(),
            redact_content_on_delete: true,
            ..Self::default()
        }
    }

    /// Create a testing configuration
    pub fn testing() -> Self {
        RegistryConfig {
            debug_mode: true,
            log_level: "debug".to_string(),
            max_workers_per_schema: 16,
            max_content_size: 64 * 1024,
            ..Self::default()
        }
    }
}
