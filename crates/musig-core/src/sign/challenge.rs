//! Address-binding challenge derivation
//!
//! The challenge is deliberately not the textbook e = H(R ‖ P ‖ m).
//! The nonce point is first collapsed to a 20-byte account address and
//! the public key is carried as its X coordinate plus a 27/28 recovery
//! marker, so an on-chain verifier can check the signature with
//! address recovery alone. Byte boundaries here must not change.

use k256::{elliptic_curve::sec1::ToEncodedPoint, ProjectivePoint};

use crate::hash::{keccak256, keccak256_packed};
use crate::types::{Challenge, PublicKey};
use crate::{Error, Result};

/// Account address of a point: keccak256 of the uncompressed X ‖ Y
/// bytes, low-order 20 bytes
pub(crate) fn point_address(point: &ProjectivePoint) -> Result<[u8; 20]> {
    let encoded = point.to_affine().to_encoded_point(false);
    let bytes = encoded.as_bytes();
    if bytes.len() != 65 {
        return Err(Error::InvalidPoint("cannot address the point at infinity".into()));
    }

    let digest = keccak256(&bytes[1..65]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[12..32]);
    Ok(address)
}

/// e = keccak256(address(R) ‖ marker ‖ P.x ‖ msgHash), tight-packed.
///
/// `marker` is the key's SEC1 tag byte shifted into the 27/28 recovery
/// convention (tag + 27 − 2).
pub fn challenge(
    r: &ProjectivePoint,
    msg_hash: &[u8; 32],
    public_key: &PublicKey,
) -> Result<Challenge> {
    let address = point_address(r)?;
    let marker = public_key.tag() + 27 - 2;

    let digest = keccak256_packed(&[&address, &[marker], public_key.x_bytes(), msg_hash]);
    Ok(Challenge::from_digest(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_message;
    use crate::types::KeyPair;

    #[test]
    fn challenge_is_deterministic() {
        let pair = KeyPair::random().unwrap();
        let nonce = KeyPair::random().unwrap();
        let r = nonce.public_key.to_point().unwrap();
        let msg_hash = hash_message("hello");

        let one = challenge(&r, &msg_hash, &pair.public_key).unwrap();
        let two = challenge(&r, &msg_hash, &pair.public_key).unwrap();
        assert_eq!(one, two);
    }

    #[test]
    fn challenge_binds_every_input() {
        let pair = KeyPair::random().unwrap();
        let other = KeyPair::random().unwrap();
        let nonce = KeyPair::random().unwrap();
        let nonce_two = KeyPair::random().unwrap();
        let r = nonce.public_key.to_point().unwrap();
        let msg_hash = hash_message("hello");

        let base = challenge(&r, &msg_hash, &pair.public_key).unwrap();

        let different_key = challenge(&r, &msg_hash, &other.public_key).unwrap();
        assert_ne!(base, different_key);

        let different_msg = challenge(&r, &hash_message("goodbye"), &pair.public_key).unwrap();
        assert_ne!(base, different_msg);

        let different_nonce = challenge(
            &nonce_two.public_key.to_point().unwrap(),
            &msg_hash,
            &pair.public_key,
        )
        .unwrap();
        assert_ne!(base, different_nonce);
    }

    #[test]
    fn identity_point_has_no_address() {
        use k256::ProjectivePoint;
        assert!(point_address(&ProjectivePoint::IDENTITY).is_err());
    }
}
