//! MuSig key aggregation
//!
//! A set of participant keys is collapsed into one combined key:
//! L = keccak256 over the sorted compressed keys (plus an optional
//! secret), a_i = keccak256(L ‖ P_i) mod n, combined = Σ a_i·P_i.
//! Sorting makes L independent of the order the keys were supplied in,
//! so every participant converges on the same combined key without
//! coordination.

use k256::{
    elliptic_curve::{bigint::U256, ops::Reduce},
    ProjectivePoint, Scalar,
};
use tracing::{debug, instrument};

use crate::hash::{keccak256, keccak256_packed};
use crate::keys::random_aggregation_secret;
use crate::types::{CombinedPublicKey, PublicKey};
use crate::{Error, Result, SecretError};

/// How the key-set hash L is derived
#[derive(Debug, Clone, Copy)]
pub enum AggregationMode<'a> {
    /// L = keccak256(sorted keys ‖ optional secret). The same key set
    /// and secret always produce the same combined key.
    Deterministic { secret: Option<&'a str> },

    /// L is keyed with a fresh random secret on every call, so repeated
    /// aggregations of the same key set yield unlinkable combined keys.
    /// Not a drop-in replacement for deterministic aggregation:
    /// co-signers can only reconstruct coefficients if they are handed
    /// the resulting `hashed_key`. Intended for session-scoped
    /// proof-of-knowledge challenges.
    Salted,
}

/// Aggregate at least two public keys into a [`CombinedPublicKey`]
#[instrument(skip_all, fields(participants = public_keys.len()))]
pub fn combine_public_keys(
    public_keys: &[PublicKey],
    mode: AggregationMode<'_>,
) -> Result<CombinedPublicKey> {
    if public_keys.len() < 2 {
        return Err(Error::InsufficientParticipants {
            required: 2,
            actual: public_keys.len(),
        });
    }

    let hashed_key = match mode {
        AggregationMode::Deterministic { secret } => hash_public_keys(public_keys, secret)?,
        AggregationMode::Salted => {
            let salt = random_aggregation_secret()?;
            hash_public_keys(public_keys, Some(&salt))?
        }
    };

    let mut combined = ProjectivePoint::IDENTITY;
    for public_key in public_keys {
        let a = a_coefficient(public_key, &hashed_key);
        combined += public_key.to_point()? * a;
    }

    let combined_key = PublicKey::from_point(&combined)?;
    debug!(combined_key = %combined_key, "aggregated public keys");

    Ok(CombinedPublicKey {
        combined_key,
        hashed_key,
    })
}

/// Aggregation with a fresh random salt per call. Produces a different
/// combined key for the same key set on every invocation; see
/// [`AggregationMode::Salted`] for when that is actually what you want.
pub fn combine_public_keys_salted(public_keys: &[PublicKey]) -> Result<CombinedPublicKey> {
    combine_public_keys(public_keys, AggregationMode::Salted)
}

/// Per-key coefficient a_i = keccak256(L ‖ P_i) mod n
pub(crate) fn a_coefficient(public_key: &PublicKey, hashed_key: &[u8; 32]) -> Scalar {
    let digest = keccak256_packed(&[hashed_key, public_key.as_bytes()]);
    <Scalar as Reduce<U256>>::reduce_bytes(&digest.into())
}

/// L = keccak256 of the lexicographically sorted compressed keys, with
/// the decoded secret bytes sorted in alongside them
fn hash_public_keys(public_keys: &[PublicKey], secret: Option<&str>) -> Result<[u8; 32]> {
    let mut parts: Vec<Vec<u8>> = public_keys
        .iter()
        .map(|public_key| public_key.as_bytes().to_vec())
        .collect();

    if let Some(secret) = secret {
        parts.push(decode_secret(secret)?);
    }

    parts.sort();

    let mut preimage = Vec::with_capacity(parts.iter().map(Vec::len).sum());
    for part in &parts {
        preimage.extend_from_slice(part);
    }

    Ok(keccak256(&preimage))
}

fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    if secret.is_empty() {
        return Err(SecretError::Empty.into());
    }
    let bytes = hex::decode(secret).map_err(|_| SecretError::NotHex)?;
    if bytes.len() > 33 {
        return Err(SecretError::TooLong(bytes.len()).into());
    }
    Ok(bytes)
}
