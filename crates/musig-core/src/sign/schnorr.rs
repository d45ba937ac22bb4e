//! Single-signer Schnorr over the shared challenge function

use k256::ProjectivePoint;
use tracing::instrument;

use super::challenge::challenge;
use crate::hash::hash_message;
use crate::types::{KeyPair, PrivateKey, PublicKey, Signature, SignatureOutput};
use crate::Result;

/// Sign `message` with a single key: R = k·G for a fresh one-time k,
/// e = challenge(R, H(m), P), s = k + x·e mod n
#[instrument(skip_all)]
pub fn sign(private_key: &PrivateKey, message: &str) -> Result<SignatureOutput> {
    let public_key = private_key.public_key();
    let msg_hash = hash_message(message);

    let nonce = KeyPair::random()?;
    let r = nonce.public_key.to_point()?;

    let e = challenge(&r, &msg_hash, &public_key)?;
    let s = nonce.private_key.scalar() + private_key.scalar() * e.to_scalar();

    Ok(SignatureOutput {
        signature: Signature::from_scalar(&s),
        challenge: e,
        final_public_nonce: nonce.public_key,
    })
}

/// Check s·G == R + e·P.
///
/// Verifies single-signer and aggregated signatures alike: for a
/// multi-signature, pass the combined key as `public_key` and the
/// summed partial signatures as `signature`. Returns `Ok(false)` for a
/// signature that does not verify; errors only signal malformed
/// encodings.
pub fn verify(
    signature: &Signature,
    message: &str,
    final_public_nonce: &PublicKey,
    public_key: &PublicKey,
) -> Result<bool> {
    let msg_hash = hash_message(message);
    let r = final_public_nonce.to_point()?;
    let p = public_key.to_point()?;

    let e = challenge(&r, &msg_hash, public_key)?;

    let lhs = ProjectivePoint::GENERATOR * signature.to_scalar();
    let rhs = r + p * e.to_scalar();
    Ok(lhs == rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let pair = KeyPair::random().unwrap();
        let output = sign(&pair.private_key, "test message").unwrap();

        assert!(verify(
            &output.signature,
            "test message",
            &output.final_public_nonce,
            &pair.public_key,
        )
        .unwrap());
    }

    #[test]
    fn rejects_a_different_message() {
        let pair = KeyPair::random().unwrap();
        let output = sign(&pair.private_key, "test message").unwrap();

        assert!(!verify(
            &output.signature,
            "another message",
            &output.final_public_nonce,
            &pair.public_key,
        )
        .unwrap());
    }

    #[test]
    fn rejects_a_different_public_key() {
        let pair = KeyPair::random().unwrap();
        let other = KeyPair::random().unwrap();
        let output = sign(&pair.private_key, "test message").unwrap();

        assert!(!verify(
            &output.signature,
            "test message",
            &output.final_public_nonce,
            &other.public_key,
        )
        .unwrap());
    }

    #[test]
    fn fresh_nonce_per_signature() {
        let pair = KeyPair::random().unwrap();
        let one = sign(&pair.private_key, "same message").unwrap();
        let two = sign(&pair.private_key, "same message").unwrap();
        assert_ne!(one.final_public_nonce, two.final_public_nonce);
        assert_ne!(one.signature, two.signature);
    }

    #[test]
    fn seeded_key_signs_and_verifies() {
        let pair = KeyPair::from_seed("a seed phrase").unwrap();
        let output = sign(&pair.private_key, "signed with a seeded key").unwrap();
        assert!(verify(
            &output.signature,
            "signed with a seeded key",
            &output.final_public_nonce,
            &pair.public_key,
        )
        .unwrap());
    }
}
