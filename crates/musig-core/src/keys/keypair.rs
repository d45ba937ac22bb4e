//! Key pair generation
//!
//! Candidate scalars come from the OS entropy source (or a seed hash)
//! and are rejection-sampled: zero and values at or above the group
//! order are discarded, under a bounded retry budget.

use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroize;

use crate::hash::keccak256_packed;
use crate::types::{KeyPair, PrivateKey};
use crate::{Error, Result};

/// Retry budget for rejection sampling
const MAX_SAMPLING_ATTEMPTS: u8 = 64;

impl KeyPair {
    /// Generate a fresh key pair from the OS entropy source
    pub fn random() -> Result<Self> {
        let mut candidate = [0u8; 32];
        for _ in 0..MAX_SAMPLING_ATTEMPTS {
            OsRng.fill_bytes(&mut candidate);
            if let Ok(private_key) = PrivateKey::from_bytes(&candidate) {
                candidate.zeroize();
                return Ok(Self::from_private(private_key));
            }
        }
        candidate.zeroize();
        Err(Error::RandomnessExhausted)
    }

    /// Derive a key pair deterministically from a seed string: the
    /// candidate scalar is keccak256(seed ‖ round), with the round
    /// counter bumped until the digest is a valid private key. The same
    /// seed always yields the same pair.
    pub fn from_seed(seed: &str) -> Result<Self> {
        for round in 0..MAX_SAMPLING_ATTEMPTS {
            let mut digest = keccak256_packed(&[seed.as_bytes(), &[round]]);
            match PrivateKey::from_bytes(&digest) {
                Ok(private_key) => {
                    digest.zeroize();
                    return Ok(Self::from_private(private_key));
                }
                Err(_) => digest.zeroize(),
            }
        }
        Err(Error::RandomnessExhausted)
    }

    /// Build the pair for an existing private key
    pub fn from_private(private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();
        Self {
            public_key,
            private_key,
        }
    }
}

/// A fresh random secret suitable for keyed aggregation: the hex of a
/// random compressed public key, which fits the 33-byte secret bound.
pub fn random_aggregation_secret() -> Result<String> {
    Ok(KeyPair::random()?.public_key.to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_keys_are_distinct() {
        let one = KeyPair::random().unwrap();
        let two = KeyPair::random().unwrap();
        assert_ne!(one.public_key, two.public_key);
    }

    #[test]
    fn public_key_matches_private_key() {
        let pair = KeyPair::random().unwrap();
        assert_eq!(pair.private_key.public_key(), pair.public_key);
    }

    #[test]
    fn seed_derivation_is_deterministic() {
        let one = KeyPair::from_seed("remember this").unwrap();
        let two = KeyPair::from_seed("remember this").unwrap();
        assert_eq!(one.public_key, two.public_key);
        assert_eq!(one.private_key.as_bytes(), two.private_key.as_bytes());
    }

    #[test]
    fn different_seeds_give_different_keys() {
        let one = KeyPair::from_seed("seed a").unwrap();
        let two = KeyPair::from_seed("seed b").unwrap();
        assert_ne!(one.public_key, two.public_key);
    }

    #[test]
    fn aggregation_secret_is_valid_hex_within_bound() {
        let secret = random_aggregation_secret().unwrap();
        let bytes = hex::decode(&secret).unwrap();
        assert_eq!(bytes.len(), 33);
    }
}
