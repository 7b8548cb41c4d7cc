//! Registry events
//!
//! Events form an ordered, append-only log. Each carries the same topic and
//! ABI data layout an on-chain indexer would expect for the registry
//! interface, so external consumers can decode them with standard tooling.

use serde::{Serialize, Deserialize};
use ethers::abi::{self, Token};

use crate::crypto;
use super::DataId;

/// An observable registry event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    /// The registry was initialized
    Initialized {
        /// Initializer version
        version: u8,
    },

    /// A data id was reserved and key material prepared
    PrepareRegistry {
        /// Reserved id
        data_id: DataId,
        /// Public key of each share, in worker order
        public_keys: Vec<Vec<u8>>,
    },

    /// A reservation was finalized
    Register {
        /// Finalized id
        data_id: DataId,
    },
}

impl RegistryEvent {
    /// Canonical event signature
    pub fn signature(&self) -> &'static str {
        match self {
            RegistryEvent::Initialized { .. } => "Initialized(uint8)",
            RegistryEvent::PrepareRegistry { .. } => "PrepareRegistry(bytes32,bytes[])",
            RegistryEvent::Register { .. } => "Register(bytes32)",
        }
    }

    /// Event topic, `keccak256(signature)`
    pub fn topic(&self) -> [u8; 32] {
        crypto::keccak256(self.signature().as_bytes())
    }

    /// ABI-encoded event data (all inputs are non-indexed)
    pub fn encode_data(&self) -> Vec<u8> {
        let tokens = match self {
            RegistryEvent::Initialized { version } => vec![Token::Uint((*version).into())],
            RegistryEvent::PrepareRegistry { data_id, public_keys } => vec![
                Token::FixedBytes(data_id.as_bytes().to_vec()),
                Token::Array(public_keys.iter().cloned().map(Token::Bytes).collect()),
            ],
            RegistryEvent::Register { data_id } => vec![Token::FixedBytes(data_id.as_bytes().to_vec())],
        };
        abi::encode(&tokens)
    }

    /// The data id the event concerns, if any
    pub fn data_id(&self) -> Option<DataId> {
        match self {
            RegistryEvent::Initialized { .. } => None,
            RegistryEvent::PrepareRegistry { data_id, .. } | RegistryEvent::Register { data_id } => Some(*data_id),
        }
    }
}

/// An event with its position in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Zero-based position in the log
    pub sequence: u64,

    /// The event
    pub event: RegistryEvent,
}
