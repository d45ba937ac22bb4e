//! ECDSA proof-of-knowledge helpers
//!
//! A non-interactive way for a party to prove control of a private key
//! before being admitted into an aggregation set. Plain prehash ECDSA
//! over the same curve; entirely disjoint from the multi-signature
//! path.

use k256::ecdsa::{
    signature::hazmat::{PrehashSigner, PrehashVerifier},
    Signature as EcdsaSignature, SigningKey, VerifyingKey,
};

use crate::types::{PrivateKey, PublicKey};
use crate::{Error, Result};

/// Sign a 32-byte digest with plain ECDSA
pub fn sign_proof(private_key: &PrivateKey, msg_hash: &[u8; 32]) -> Result<EcdsaSignature> {
    let key = SigningKey::from_bytes(k256::FieldBytes::from_slice(private_key.as_bytes()))
        .map_err(|e| Error::Crypto(e.to_string()))?;
    key.sign_prehash(msg_hash)
        .map_err(|e| Error::Crypto(e.to_string()))
}

/// Check an ECDSA proof against a compressed public key. `Ok(false)`
/// for a proof that does not verify; errors only for malformed keys.
pub fn verify_proof(
    public_key: &PublicKey,
    msg_hash: &[u8; 32],
    proof: &EcdsaSignature,
) -> Result<bool> {
    let key = VerifyingKey::from_sec1_bytes(public_key.as_bytes())
        .map_err(|e| Error::InvalidPoint(e.to_string()))?;
    Ok(key.verify_prehash(msg_hash, proof).is_ok())
}
