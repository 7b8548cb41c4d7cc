//! Data record representation
//!
//! A [`DataRecord`] is created `Reserved` by key preparation, filled in once by
//! registration and finally tombstoned by deletion. All status changes go
//! through [`DataStatus::transition`].

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use ethers::abi::{self, Token};
use ethers::types::{Address, Bytes, U256};

use crate::crypto::DomainHasher;
use crate::error::{RegistryError, Result};
use super::domains;

macro_rules! bytes32_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        pub struct $name([u8; 32]);

        impl $name {
            /// Wrap raw bytes
            pub const fn new(bytes: [u8; 32]) -> Self {
                $name(bytes)
            }

            /// Raw bytes
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Parse from hex, with or without a `0x` prefix
            pub fn from_hex(value: &str) -> Result<Self> {
                let value = value.strip_prefix("0x").unwrap_or(value);
                let mut bytes = [0u8; 32];
                hex::decode_to_slice(value, &mut bytes)?;
                Ok($name(bytes))
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                $name(bytes)
            }
        }

        impl FromStr for $name {
            type Err = RegistryError;

            fn from_str(value: &str) -> Result<Self> {
                $name::from_hex(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
                write!(f, "{}({})", stringify!($name), self)
            }
        }
    };
}

bytes32_id!(
    /// 32-byte identifier of a data record
    DataId
);

bytes32_id!(
    /// 32-byte identifier of a worker holding a key share
    WorkerId
);

/// Threshold parameters: any `t` of `n` share holders can decrypt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncryptionSchema {
    /// Reconstruction threshold
    pub t: u32,

    /// Number of shares, one per worker
    pub n: u32,
}

impl EncryptionSchema {
    /// Create a schema without validating it
    pub fn new(t: u32, n: u32) -> Self {
        EncryptionSchema { t, n }
    }

    /// Check `1 <= t <= n <= max_n`
    pub fn validate(&self, max_n: u32) -> Result<()> {
        let reason = if self.n == 0 {
            "n must be at least 1".to_string()
        } else if self.t == 0 {
            "t must be at least 1".to_string()
        } else if self.t > self.n {
            "t must not exceed n".to_string()
        } else if self.n > max_n {
            format!("n must not exceed {}", max_n)
        } else {
            return Ok(());
        };

        Err(RegistryError::InvalidSchema { t: self.t, n: self.n, reason })
    }

    fn to_token(self) -> Token {
        Token::Tuple(vec![Token::Uint(self.t.into()), Token::Uint(self.n.into())])
    }
}

/// Informational pricing attached at registration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceInfo {
    /// Symbol of the settlement token, e.g. `USDC`
    pub token_symbol: String,

    /// Price in the token's smallest unit
    pub price: U256,
}

impl PriceInfo {
    /// Create a price
    pub fn new(token_symbol: impl Into<String>, price: impl Into<U256>) -> Self {
        PriceInfo { token_symbol: token_symbol.into(), price: price.into() }
    }

    fn to_token(&self) -> Token {
        Token::Tuple(vec![Token::String(self.token_symbol.clone()), Token::Uint(self.price)])
    }
}

/// Lifecycle status of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataStatus {
    /// Key material prepared, content not yet submitted
    Reserved = 0,

    /// Content, price and owner bound
    Registered = 1,

    /// Tombstoned by its owner or the administrator
    Deleted = 2,
}

impl DataStatus {
    /// Whether `self -> next` is an edge of the lifecycle
    pub fn can_transition_to(self, next: DataStatus) -> bool {
        matches!(
            (self, next),
            (DataStatus::Reserved, DataStatus::Registered) | (DataStatus::Registered, DataStatus::Deleted)
        )
    }

    /// Validate `self -> next` for `data_id`, returning the new status.
    ///
    /// Re-finalizing a record that already left `Reserved` reports
    /// `AlreadyRegistered`; every other illegal edge reports `InvalidTransition`.
    pub fn transition(self, data_id: DataId, next: DataStatus) -> Result<DataStatus> {
        if self.can_transition_to(next) {
            return Ok(next);
        }

        match (self, next) {
            (DataStatus::Registered | DataStatus::Deleted, DataStatus::Registered) => {
                Err(RegistryError::AlreadyRegistered(data_id))
            }
            _ => Err(RegistryError::InvalidTransition { data_id, from: self, to: next }),
        }
    }

    /// ABI enum ordinal
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// The unit of registration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRecord {
    /// Unique identifier
    pub data_id: DataId,

    /// Human-readable label, not unique
    pub data_tag: String,

    /// Informational pricing
    pub price_info: PriceInfo,

    /// Ciphertext, never decrypted by the registry
    pub data_content: Bytes,

    /// Threshold parameters fixed at preparation
    pub encryption_schema: EncryptionSchema,

    /// One worker per key share, fixed at preparation
    pub worker_ids: Vec<WorkerId>,

    /// Logical time of finalization, zero while reserved
    pub registered_timestamp: u64,

    /// Submitter, zero address while reserved
    pub owner: Address,

    /// Lifecycle status
    pub status: DataStatus,
}

impl Debug for DataRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DataRecord")
            .field("id", &self.data_id)
            .field("tag", &self.data_tag)
            .field("schema", &self.encryption_schema)
            .field("workers", &self.worker_ids.len())
            .field("content_len", &self.data_content.len())
            .field("owner", &self.owner)
            .field("status", &self.status)
            .finish()
    }
}

impl DataRecord {
    /// Create a reservation. `worker_ids` must hold exactly `schema.n` entries.
    pub fn reserved(data_id: DataId, schema: EncryptionSchema, worker_ids: Vec<WorkerId>) -> Result<Self> {
        if worker_ids.len() != schema.n as usize {
            return Err(RegistryError::StateError(format!(
                "reservation {} has {} workers for n={}",
                data_id,
                worker_ids.len(),
                schema.n
            )));
        }

        Ok(DataRecord {
            data_id,
            data_tag: String::new(),
            price_info: PriceInfo::default(),
            data_content: Bytes::default(),
            encryption_schema: schema,
            worker_ids,
            registered_timestamp: 0,
            owner: Address::zero(),
            status: DataStatus::Reserved,
        })
    }

    /// Calculate the digest of the record with domain separation
    pub fn calculate_hash(&self, hasher: &DomainHasher) -> [u8; 32] {
        let mut price_bytes = [0u8; 32];
        self.price_info.price.to_big_endian(&mut price_bytes);
        let schema_bytes = [self.encryption_schema.t.to_be_bytes(), self.encryption_schema.n.to_be_bytes()].concat();
        let workers: Vec<u8> = self.worker_ids.iter().flat_map(|w| w.as_bytes().to_vec()).collect();
        let timestamp_bytes = self.registered_timestamp.to_be_bytes();
        let status_bytes = [self.status.as_u8()];

        hasher.hash_parts(
            domains::RECORD,
            &[
                &self.data_id.as_bytes()[..],
                self.data_tag.as_bytes(),
                self.price_info.token_symbol.as_bytes(),
                &price_bytes[..],
                &self.data_content[..],
                &schema_bytes[..],
                &workers[..],
                &timestamp_bytes[..],
                self.owner.as_bytes(),
                &status_bytes[..],
            ],
        )
    }

    /// ABI token of the `DataInfo` tuple
    pub fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::FixedBytes(self.data_id.as_bytes().to_vec()),
            Token::String(self.data_tag.clone()),
            self.price_info.to_token(),
            Token::Bytes(self.data_content.to_vec()),
            self.encryption_schema.to_token(),
            Token::Array(
                self.worker_ids
                    .iter()
                    .map(|w| Token::FixedBytes(w.as_bytes().to_vec()))
                    .collect(),
            ),
            Token::Uint(self.registered_timestamp.into()),
            Token::Address(self.owner),
            Token::Uint(self.status.as_u8().into()),
        ])
    }

    /// ABI encoding of the record as a single `DataInfo` return value
    pub fn encode_abi(&self) -> Vec<u8> {
        abi::encode(&[self.to_token()])
    }

    /// ABI encoding of a `DataInfo[]` return value
    pub fn encode_abi_list(records: &[DataRecord]) -> Vec<u8> {
        abi::encode(&[Token::Array(records.iter().map(DataRecord::to_token).collect())])
    }
}
