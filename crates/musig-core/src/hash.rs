//! Keccak hashing shared across the protocol
//!
//! Every hash in the scheme is keccak-256 over a tight-packed byte
//! concatenation, matching the `abi.encodePacked` convention used by
//! on-chain verifiers. There is no length-prefixing or domain tag
//! beyond what the protocol itself packs into each preimage.

use tiny_keccak::{Hasher, Keccak};

/// keccak-256 of a single byte string
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// keccak-256 over the tight-packed concatenation of `parts`
pub fn keccak256_packed(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Message digest used throughout signing and verification:
/// keccak-256 of the message's UTF-8 bytes.
pub fn hash_message(message: &str) -> [u8; 32] {
    keccak256(message.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_matches_plain_concatenation() {
        let digest = keccak256_packed(&[b"abc", b"def"]);
        assert_eq!(digest, keccak256(b"abcdef"));
    }

    #[test]
    fn known_keccak_vector() {
        // keccak-256 of the empty string
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn message_hash_is_utf8_keccak() {
        assert_eq!(hash_message("test message"), keccak256(b"test message"));
    }
}
