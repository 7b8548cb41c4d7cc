//! Error types for the registry core
//!
//! Every failing registry call surfaces one of these variants synchronously
//! and leaves the registry exactly as it was before the call.

use thiserror::Error;
use std::io;

use crate::models::{DataId, DataStatus};

/// Registry error type
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Threshold parameters out of range
    #[error("Invalid encryption schema: t={t}, n={n} ({reason})")]
    InvalidSchema {
        /// Requested threshold
        t: u32,
        /// Requested share count
        n: u32,
        /// Which bound was violated
        reason: String,
    },

    /// Operation on a data id that was never reserved
    #[error("Unknown data id: {0}")]
    UnknownDataId(DataId),

    /// Finalization of a record that is no longer reserved
    #[error("Data id {0} is already registered")]
    AlreadyRegistered(DataId),

    /// Caller is neither the owner nor the administrator
    #[error("Caller is not the owner of data id {0}")]
    NotOwner(DataId),

    /// The zero address marks unowned reservations and cannot act as a caller
    #[error("The zero address cannot act as a caller")]
    ZeroAddress,

    /// The worker directory cannot supply enough distinct workers
    #[error("Worker unavailable: need {required} distinct workers, {available} eligible")]
    WorkerUnavailable {
        /// Workers needed for the schema
        required: u32,
        /// Distinct workers currently eligible
        available: usize,
    },

    /// Status change not allowed by the lifecycle
    #[error("Invalid status transition for {data_id}: {from:?} -> {to:?}")]
    InvalidTransition {
        /// Affected record
        data_id: DataId,
        /// Current status
        from: DataStatus,
        /// Requested status
        to: DataStatus,
    },

    /// Mutation attempted before `initialize`
    #[error("Registry is not initialized")]
    NotInitialized,

    /// `initialize` called a second time
    #[error("Registry already initialized at version {0}")]
    AlreadyInitialized(u8),

    /// Submitted ciphertext exceeds the configured limit
    #[error("Data content too large: {size} bytes (limit {limit})")]
    ContentTooLarge {
        /// Submitted size
        size: usize,
        /// Configured limit
        limit: usize,
    },

    /// Cryptographic operation error
    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    /// State management error
    #[error("State management error: {0}")]
    StateError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Bincode error
    #[error("Bincode error: {0}")]
    BincodeError(#[from] bincode::Error),

    /// Hex decoding error
    #[error("Hex decoding error: {0}")]
    HexError(#[from] hex::FromHexError),
}

/// Result type for the registry core
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Convert a displayable error to a CryptoError
pub fn to_crypto_error<E: std::fmt::Display>(err: E) -> RegistryError {
    RegistryError::CryptoError(err.to_string())
}

/// Convert a displayable error to a StateError
pub fn to_state_error<E: std::fmt::Display>(err: E) -> RegistryError {
    RegistryError::StateError(err.to_string())
}

/// Convert a displayable error to a ConfigError
pub fn to_config_error<E: std::fmt::Display>(err: E) -> RegistryError {
    RegistryError::ConfigError(err.to_string())
}
