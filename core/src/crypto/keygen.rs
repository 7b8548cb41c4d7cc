//! Threshold key generation
//!
//! The registry only needs `n` shares and `n` matching public keys for a
//! `(t, n)` schema; how they are produced is pluggable through
//! [`ThresholdKeyGenerator`]. [`ShamirKeyGenerator`] is the bundled
//! implementation: Shamir sharing over the Ristretto scalar field, where share
//! `i` is `f(i)` of a random degree `t - 1` polynomial and its public key is
//! `f(i)·G`.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::scalar::Scalar;
use rand::rngs::OsRng;
use serde::{Serialize, Deserialize};

use crate::error::{to_crypto_error, Result};

/// One key share destined for one worker
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyShare {
    /// 1-based evaluation point of the share
    pub index: u32,

    /// Canonical little-endian scalar encoding
    pub secret: [u8; 32],
}

impl Debug for KeyShare {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("KeyShare")
            .field("index", &self.index)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Output of one key generation round
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    /// Shares, one per worker, in worker order
    pub shares: Vec<KeyShare>,

    /// Public key of each share, same order as `shares`
    pub public_keys: Vec<Vec<u8>>,

    /// Public key of the shared secret
    pub group_key: [u8; 32],
}

/// Produces `n` key shares with a reconstruction threshold of `t`
#[cfg_attr(test, mockall::automock)]
pub trait ThresholdKeyGenerator: Send + Sync {
    /// Generate key material for a `(t, n)` schema
    fn generate(&self, t: u32, n: u32) -> Result<KeyMaterial>;
}

/// Shamir secret sharing over the Ristretto group
#[derive(Debug, Clone, Copy, Default)]
pub struct ShamirKeyGenerator;

impl ShamirKeyGenerator {
    /// Create a new generator
    pub fn new() -> Self {
        ShamirKeyGenerator
    }
}

impl ThresholdKeyGenerator for ShamirKeyGenerator {
    fn generate(&self, t: u32, n: u32) -> Result<KeyMaterial> {
        if t == 0 || t > n {
            return Err(to_crypto_error(format!(
                "cannot split a secret with threshold {} into {} shares",
                t, n
            )));
        }

        let mut rng = OsRng;
        let coefficients: Vec<Scalar> = (0..t).map(|_| Scalar::random(&mut rng)).collect();

        let mut shares = Vec::with_capacity(n as usize);
        let mut public_keys = Vec::with_capacity(n as usize);

        for index in 1..=n {
            let value = evaluate(&coefficients, Scalar::from(index as u64));
            public_keys.push((RISTRETTO_BASEPOINT_POINT * value).compress().to_bytes().to_vec());
            shares.push(KeyShare { index, secret: value.to_bytes() });
        }

        let group_key = (RISTRETTO_BASEPOINT_POINT * coefficients[0]).compress().to_bytes();

        Ok(KeyMaterial { shares, public_keys, group_key })
    }
}

/// Horner evaluation of the polynomial at `x`
fn evaluate(coefficients: &[Scalar], x: Scalar) -> Scalar {
    coefficients
        .iter()
        .rev()
        .fold(Scalar::ZERO, |acc, coefficient| acc * x + coefficient)
}

/// Recover the group public key from at least `t` distinct shares.
///
/// With fewer than `t` shares the result is a well-formed but unrelated key.
pub fn recover_group_key(shares: &[KeyShare]) -> Result<[u8; 32]> {
    if shares.is_empty() {
        return Err(to_crypto_error("no shares supplied"));
    }

    let mut points: Vec<(u32, Scalar)> = Vec::with_capacity(shares.len());
    for share in shares {
        if share.index == 0 {
            return Err(to_crypto_error("share index 0 is reserved"));
        }
        if points.iter().any(|(x, _)| *x == share.index) {
            return Err(to_crypto_error(format!("duplicate share index {}", share.index)));
        }
        let secret = Option::<Scalar>::from(Scalar::from_canonical_bytes(share.secret))
            .ok_or_else(|| to_crypto_error(format!("share {} is not a canonical scalar", share.index)))?;
        points.push((share.index, secret));
    }

    let mut secret = Scalar::ZERO;
    for (i, (xi, yi)) in points.iter().enumerate() {
        let xi = Scalar::from(*xi as u64);
        let mut numerator = Scalar::ONE;
        let mut denominator = Scalar::ONE;
        for (j, (xj, _)) in points.iter().enumerate() {
            if i == j {
                continue;
            }
            let xj = Scalar::from(*xj as u64);
            numerator *= xj;
            denominator *= xj - xi;
        }
        secret += yi * numerator * denominator.invert();
    }

    Ok((RISTRETTO_BASEPOINT_POINT * secret).compress().to_bytes())
}
