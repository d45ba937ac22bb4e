//! Core types for the multi-signature protocol
//!
//! Scalars are 32-byte big-endian values reduced mod the secp256k1
//! group order; points travel in 33-byte SEC1 compressed form and are
//! hex-encoded at every serialization boundary.

use std::fmt;

use k256::{
    elliptic_curve::{
        bigint::U256,
        ops::Reduce,
        sec1::{FromEncodedPoint, ToEncodedPoint},
        Field, PrimeField,
    },
    AffinePoint, ProjectivePoint, Scalar,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{Error, Result};

/// A secp256k1 public key in SEC1 compressed form (33 bytes)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey([u8; 33]);

impl PublicKey {
    /// Parse from compressed SEC1 bytes, validating the encoding
    /// decodes to a curve point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; 33] = bytes
            .try_into()
            .map_err(|_| Error::InvalidPoint(format!("expected 33 bytes, got {}", bytes.len())))?;
        let key = Self(array);
        key.to_point()?;
        Ok(key)
    }

    /// Encode a curve point. Fails for the point at infinity, which has
    /// no compressed representation.
    pub fn from_point(point: &ProjectivePoint) -> Result<Self> {
        let encoded = point.to_affine().to_encoded_point(true);
        let array: [u8; 33] = encoded
            .as_bytes()
            .try_into()
            .map_err(|_| Error::InvalidPoint("cannot encode the point at infinity".into()))?;
        Ok(Self(array))
    }

    /// Decode into a point for curve arithmetic
    pub fn to_point(&self) -> Result<ProjectivePoint> {
        let encoded = k256::EncodedPoint::from_bytes(self.0)
            .map_err(|e| Error::InvalidPoint(e.to_string()))?;
        let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
            .ok_or_else(|| Error::InvalidPoint("not a point on secp256k1".into()))?;
        Ok(ProjectivePoint::from(affine))
    }

    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(raw: &str) -> Result<Self> {
        let bytes = hex::decode(raw).map_err(|e| Error::InvalidPoint(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// SEC1 tag byte: 0x02 for even Y, 0x03 for odd Y
    pub(crate) fn tag(&self) -> u8 {
        self.0[0]
    }

    /// X coordinate bytes
    pub(crate) fn x_bytes(&self) -> &[u8] {
        &self.0[1..33]
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// A secret scalar: private key or secret nonce (32 bytes, non-zero,
/// canonical mod the group order). Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; 32]);

impl PrivateKey {
    /// Parse from big-endian bytes. Rejects zero and values at or above
    /// the group order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::InvalidScalar(format!("expected 32 bytes, got {}", bytes.len())))?;
        let scalar = Option::<Scalar>::from(Scalar::from_repr(array.into()))
            .ok_or_else(|| Error::InvalidScalar("value exceeds the group order".into()))?;
        if scalar == Scalar::ZERO {
            return Err(Error::InvalidScalar("value must be non-zero".into()));
        }
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(raw: &str) -> Result<Self> {
        let bytes = hex::decode(raw).map_err(|e| Error::InvalidScalar(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// The scalar value. Constructors only accept canonical non-zero
    /// encodings, so the conversion cannot fail.
    pub(crate) fn scalar(&self) -> Scalar {
        Option::<Scalar>::from(Scalar::from_repr(self.0.into())).expect("canonical scalar")
    }

    /// The corresponding public key sk·G
    pub fn public_key(&self) -> PublicKey {
        let point = ProjectivePoint::GENERATOR * self.scalar();
        // A non-zero scalar times the generator is never the identity.
        PublicKey::from_point(&point).expect("valid point")
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey([redacted])")
    }
}

impl Serialize for PrivateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PrivateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// A private/public key pair with pk = sk·G
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub private_key: PrivateKey,
}

/// A partial or aggregated signature scalar s (32 bytes mod n)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 32]);

impl Signature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::InvalidScalar(format!("expected 32 bytes, got {}", bytes.len())))?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(raw: &str) -> Result<Self> {
        let bytes = hex::decode(raw).map_err(|e| Error::InvalidScalar(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub(crate) fn from_scalar(scalar: &Scalar) -> Self {
        Self(scalar.to_bytes().into())
    }

    pub(crate) fn to_scalar(&self) -> Scalar {
        <Scalar as Reduce<U256>>::reduce_bytes(&self.0.into())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// The challenge digest e binding message, aggregate nonce and key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge([u8; 32]);

impl Challenge {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(raw: &str) -> Result<Self> {
        let bytes = hex::decode(raw).map_err(|e| Error::InvalidScalar(e.to_string()))?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::InvalidScalar("expected 32 bytes".into()))?;
        Ok(Self(array))
    }

    pub(crate) fn from_digest(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    pub(crate) fn to_scalar(&self) -> Scalar {
        <Scalar as Reduce<U256>>::reduce_bytes(&self.0.into())
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Challenge {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Challenge {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// Aggregated public key plus the key-set hash L needed to recompute
/// per-signer coefficients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedPublicKey {
    pub combined_key: PublicKey,
    #[serde(with = "hex32")]
    pub hashed_key: [u8; 32],
}

/// Everything a signing operation produces: the signature scalar, the
/// challenge it answers, and the aggregate nonce it verifies against
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureOutput {
    pub signature: Signature,
    pub challenge: Challenge,
    pub final_public_nonce: PublicKey,
}

pub(crate) mod hex32 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &[u8; 32],
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<[u8; 32], D::Error> {
        let raw = String::deserialize(deserializer)?;
        let bytes = hex::decode(&raw).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
    }
}
