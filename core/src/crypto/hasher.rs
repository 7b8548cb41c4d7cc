//! Domain-separated hashing over a selectable digest
//!
//! Identifier derivation and record digests run through [`DomainHasher`] so the
//! registry can be configured for SHA-256, Blake2s or Keccak-256 while keeping
//! the same framing: `domain ‖ len(domain) ‖ count ‖ (len(part) ‖ part)*`.

use std::fmt::Debug;
use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};
use blake2::Blake2s256;
use sha3::Keccak256;

/// Hash algorithm to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA-256
    #[default]
    Sha256,

    /// Blake2s
    Blake2s,

    /// Keccak-256
    Keccak256,
}

/// Hashes length-prefixed parts under a domain tag with a fixed algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainHasher {
    algorithm: HashAlgorithm,
}

impl DomainHasher {
    /// Create a hasher for the given algorithm
    pub fn new(algorithm: HashAlgorithm) -> Self {
        DomainHasher { algorithm }
    }

    /// The algorithm this hasher runs
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash a single buffer under `domain`
    pub fn hash(&self, domain: &str, data: &[u8]) -> [u8; 32] {
        self.hash_parts(domain, &[data])
    }

    /// Hash several buffers under `domain`; order and boundaries matter
    pub fn hash_parts(&self, domain: &str, parts: &[&[u8]]) -> [u8; 32] {
        match self.algorithm {
            HashAlgorithm::Sha256 => framed_digest::<Sha256>(domain, parts),
            HashAlgorithm::Blake2s => framed_digest::<Blake2s256>(domain, parts),
            HashAlgorithm::Keccak256 => framed_digest::<Keccak256>(domain, parts),
        }
    }
}

impl Default for DomainHasher {
    fn default() -> Self {
        DomainHasher::new(HashAlgorithm::default())
    }
}

fn framed_digest<D: Digest>(domain: &str, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = D::new();

    hasher.update(domain.as_bytes());
    hasher.update([domain.len() as u8]);
    hasher.update([parts.len() as u8]);

    for part in parts {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part);
    }

    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result[..32]);
    output
}
