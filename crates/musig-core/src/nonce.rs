//! Nonce lifecycle management for signing rounds
//!
//! Each signing round needs a pair of one-time secret nonces. The store
//! keeps at most one open pair per signer identity and is the only
//! state the protocol persists: it can be exported to JSON so a round
//! survives a process boundary, and an entry is destroyed the moment it
//! has been used to produce a partial signature. Reusing a nonce pair
//! across two signatures reveals the private key through two linear
//! equations in two unknowns.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::hash::keccak256;
use crate::types::{KeyPair, PrivateKey, PublicKey};
use crate::{Error, Result};

/// Identifies a signer in the store without retaining the key itself:
/// keccak256 of the private key bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonceIdentity([u8; 32]);

impl NonceIdentity {
    pub fn of(private_key: &PrivateKey) -> Self {
        Self(keccak256(private_key.as_bytes()))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(raw: &str) -> Result<Self> {
        let bytes = hex::decode(raw).map_err(|e| Error::InvalidState(e.to_string()))?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::InvalidState("identity must be 32 bytes".into()))?;
        Ok(Self(array))
    }
}

impl fmt::Display for NonceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for NonceIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for NonceIdentity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// Both halves of a signer's two-nonce commitment for one round.
/// Two independent nonces are committed per round; the second one is
/// bound in later with a post-hoc coefficient, which blocks an attacker
/// who would otherwise bias the aggregate nonce after seeing the other
/// parties' commitments.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NoncePair {
    pub(crate) k: PrivateKey,
    pub(crate) k_two: PrivateKey,
    pub(crate) k_public: PublicKey,
    pub(crate) k_two_public: PublicKey,
}

impl NoncePair {
    fn generate() -> Result<Self> {
        let KeyPair {
            public_key: k_public,
            private_key: k,
        } = KeyPair::random()?;
        let KeyPair {
            public_key: k_two_public,
            private_key: k_two,
        } = KeyPair::random()?;

        Ok(Self {
            k,
            k_two,
            k_public,
            k_two_public,
        })
    }

    /// The exchangeable half
    pub(crate) fn public(&self) -> PublicNonces {
        PublicNonces {
            k_public: self.k_public,
            k_two_public: self.k_two_public,
        }
    }
}

/// The non-secret half of a [`NoncePair`], exchanged between signers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicNonces {
    pub k_public: PublicKey,
    pub k_two_public: PublicKey,
}

/// Per-signer storage of open signing rounds, keyed by [`NonceIdentity`]
///
/// An entry exists for an identity exactly while a round is open:
/// created by [`generate_public_nonces`](Self::generate_public_nonces),
/// destroyed by signing or [`clear`](Self::clear).
#[derive(Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NonceStore {
    nonces: BTreeMap<NonceIdentity, NoncePair>,
}

impl NonceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a signing round for `private_key`: generate a fresh nonce
    /// pair, store it under the key's identity and return the public
    /// half. Starting a fresh round replaces any unused pair for the
    /// same identity.
    pub fn generate_public_nonces(&mut self, private_key: &PrivateKey) -> Result<PublicNonces> {
        let identity = NonceIdentity::of(private_key);
        let pair = NoncePair::generate()?;
        let public = pair.public();
        self.nonces.insert(identity, pair);
        debug!(%identity, "opened nonce round");
        Ok(public)
    }

    /// The public nonces of the open round for `private_key`
    pub fn get_public_nonces(&self, private_key: &PrivateKey) -> Result<PublicNonces> {
        let identity = NonceIdentity::of(private_key);
        self.nonces
            .get(&identity)
            .map(NoncePair::public)
            .ok_or(Error::NoncesNotFound(identity))
    }

    /// Whether a round is open for `private_key`
    pub fn has_nonces(&self, private_key: &PrivateKey) -> bool {
        self.nonces.contains_key(&NonceIdentity::of(private_key))
    }

    /// Drop the open round for `private_key`, if any
    pub fn clear(&mut self, private_key: &PrivateKey) {
        self.discard(&NonceIdentity::of(private_key));
    }

    pub(crate) fn pair(&self, identity: &NonceIdentity) -> Option<&NoncePair> {
        self.nonces.get(identity)
    }

    pub(crate) fn discard(&mut self, identity: &NonceIdentity) {
        if self.nonces.remove(identity).is_some() {
            debug!(%identity, "nonce round closed");
        }
    }

    pub fn len(&self) -> usize {
        self.nonces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nonces.is_empty()
    }

    /// Export the store as a JSON state blob
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore a store from a JSON state blob produced by
    /// [`to_json`](Self::to_json)
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidState(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyPair;

    #[test]
    fn generate_then_get_returns_same_nonces() {
        let pair = KeyPair::random().unwrap();
        let mut store = NonceStore::new();

        let generated = store.generate_public_nonces(&pair.private_key).unwrap();
        let fetched = store.get_public_nonces(&pair.private_key).unwrap();
        assert_eq!(generated, fetched);
    }

    #[test]
    fn get_without_generate_fails() {
        let pair = KeyPair::random().unwrap();
        let store = NonceStore::new();

        let err = store.get_public_nonces(&pair.private_key);
        assert!(matches!(err, Err(Error::NoncesNotFound(_))));
    }

    #[test]
    fn regenerating_replaces_the_open_round() {
        let pair = KeyPair::random().unwrap();
        let mut store = NonceStore::new();

        let first = store.generate_public_nonces(&pair.private_key).unwrap();
        let second = store.generate_public_nonces(&pair.private_key).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_public_nonces(&pair.private_key).unwrap(), second);
    }

    #[test]
    fn clear_closes_the_round() {
        let pair = KeyPair::random().unwrap();
        let mut store = NonceStore::new();

        store.generate_public_nonces(&pair.private_key).unwrap();
        store.clear(&pair.private_key);
        assert!(store.is_empty());
        assert!(store.get_public_nonces(&pair.private_key).is_err());
    }

    #[test]
    fn json_round_trip_is_exact() {
        let one = KeyPair::random().unwrap();
        let two = KeyPair::random().unwrap();
        let mut store = NonceStore::new();
        store.generate_public_nonces(&one.private_key).unwrap();
        store.generate_public_nonces(&two.private_key).unwrap();

        let exported = store.to_json().unwrap();
        let restored = NonceStore::from_json(&exported).unwrap();
        assert_eq!(restored.to_json().unwrap(), exported);

        // Private halves survive the round trip too.
        let identity = NonceIdentity::of(&one.private_key);
        let original = store.pair(&identity).unwrap();
        let recovered = restored.pair(&identity).unwrap();
        assert_eq!(original.k.as_bytes(), recovered.k.as_bytes());
        assert_eq!(original.k_two.as_bytes(), recovered.k_two.as_bytes());
        assert_eq!(original.public(), recovered.public());
    }

    #[test]
    fn malformed_state_is_rejected() {
        assert!(matches!(
            NonceStore::from_json("not json"),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(
            NonceStore::from_json("{}"),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(
            NonceStore::from_json(r#"{"nonces":{"00":{"k":"01"}}}"#),
            Err(Error::InvalidState(_))
        ));
    }
}
