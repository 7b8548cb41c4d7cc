//! Cryptographic primitives for the registry
//!
//! Domain-separated hashing for identifiers and record digests, event topic
//! hashing, and the threshold key generation capability.

mod hasher;
pub mod keygen;

pub use hasher::{DomainHasher, HashAlgorithm};
pub use keygen::{KeyMaterial, KeyShare, ShamirKeyGenerator, ThresholdKeyGenerator};

use sha3::{Digest, Keccak256};
use constant_time_eq::constant_time_eq;

/// Domain-separated SHA-256 of a single buffer
pub fn secure_hash(domain: &str, data: &[u8]) -> [u8; 32] {
    DomainHasher::default().hash(domain, data)
}

/// Domain-separated SHA-256 of several length-prefixed buffers
pub fn secure_hash_multiple(domain: &str, data: &[&[u8]]) -> [u8; 32] {
    DomainHasher::default().hash_parts(domain, data)
}

/// Plain Keccak-256, as used for event topics
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut output = [0u8; 32];
    output.copy_from_slice(&Keccak256::digest(data));
    output
}

/// Compare two digests in constant time
pub fn verify_hash(expected: &[u8; 32], actual: &[u8; 32]) -> bool {
    constant_time_eq(expected, actual)
}
