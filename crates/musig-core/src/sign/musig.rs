//! Two-round MuSig signing engine
//!
//! Round one: every signer opens a nonce round and exchanges the
//! public halves. Round two: every signer computes its partial
//! signature against the full commitment set, and the partials sum to
//! a signature that verifies against the combined key.

use k256::{
    elliptic_curve::{bigint::U256, ops::Reduce, Field},
    ProjectivePoint, Scalar,
};
use subtle::{Choice, ConstantTimeEq};
use tracing::{debug, instrument};

use super::challenge::challenge;
use crate::hash::{hash_message, keccak256_packed};
use crate::keys::{a_coefficient, combine_public_keys, AggregationMode};
use crate::nonce::{NonceIdentity, NonceStore, PublicNonces};
use crate::types::{CombinedPublicKey, PrivateKey, PublicKey, Signature, SignatureOutput};
use crate::{Error, Result};

/// A participant in multi-signature rounds
///
/// Owns the nonce store for its open rounds; `&mut self` on the
/// signing entry points keeps rounds serialized per key, matching the
/// one-in-flight-round-per-key contract. Distinct signers share no
/// state.
#[derive(Default)]
pub struct MusigSigner {
    nonces: NonceStore,
}

impl MusigSigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a signing round for `private_key` (replacing any unused
    /// one) and return the commitments to hand to the other signers
    pub fn generate_public_nonces(&mut self, private_key: &PrivateKey) -> Result<PublicNonces> {
        self.nonces.generate_public_nonces(private_key)
    }

    /// The commitments of the currently open round for `private_key`
    pub fn get_public_nonces(&self, private_key: &PrivateKey) -> Result<PublicNonces> {
        self.nonces.get_public_nonces(private_key)
    }

    /// Whether `private_key` has an open round
    pub fn has_nonces(&self, private_key: &PrivateKey) -> bool {
        self.nonces.has_nonces(private_key)
    }

    /// Abandon the open round for `private_key` without signing
    pub fn clear_nonces(&mut self, private_key: &PrivateKey) {
        self.nonces.clear(private_key);
    }

    /// Produce a partial signature with the key-set hash derived fresh
    /// from `public_keys` (no aggregation secret)
    #[instrument(skip_all, fields(participants = public_keys.len()))]
    pub fn multi_sig_sign(
        &mut self,
        private_key: &PrivateKey,
        message: &str,
        public_keys: &[PublicKey],
        public_nonces: &[PublicNonces],
    ) -> Result<SignatureOutput> {
        let combined = combine_public_keys(public_keys, AggregationMode::Deterministic { secret: None })?;
        self.sign_partial(private_key, message, &combined, public_nonces)
    }

    /// Produce a partial signature against a pre-computed combined key,
    /// e.g. one built with an aggregation secret or by salted
    /// aggregation
    #[instrument(skip_all)]
    pub fn multi_sig_sign_with_key(
        &mut self,
        private_key: &PrivateKey,
        message: &str,
        combined_public_key: &CombinedPublicKey,
        public_nonces: &[PublicNonces],
    ) -> Result<SignatureOutput> {
        self.sign_partial(private_key, message, combined_public_key, public_nonces)
    }

    fn sign_partial(
        &mut self,
        private_key: &PrivateKey,
        message: &str,
        combined: &CombinedPublicKey,
        public_nonces: &[PublicNonces],
    ) -> Result<SignatureOutput> {
        let identity = NonceIdentity::of(private_key);
        let pair = self
            .nonces
            .pair(&identity)
            .ok_or(Error::NoncesNotExchanged(identity))?;

        if public_nonces.is_empty() {
            return Err(Error::InvalidNonces);
        }

        let public_key = private_key.public_key();
        let msg_hash = hash_message(message);
        let a = a_coefficient(&public_key, &combined.hashed_key);
        let b = b_coefficient(&combined.combined_key, &msg_hash, public_nonces)?;

        let effective_nonces = public_nonces
            .iter()
            .map(|nonce| effective_nonce(nonce, &b))
            .collect::<Result<Vec<_>>>()?;

        // The signer's own commitment must be among the supplied set,
        // or an aggregator has substituted the round's nonces.
        let own = PublicKey::from_point(&effective_nonce(&pair.public(), &b)?)?;
        let mut found = Choice::from(0u8);
        for nonce in &effective_nonces {
            let bytes = PublicKey::from_point(nonce)?;
            found |= bytes.as_bytes().ct_eq(own.as_bytes());
        }
        if !bool::from(found) {
            return Err(Error::InvalidNonces);
        }

        let mut r = ProjectivePoint::IDENTITY;
        for nonce in &effective_nonces {
            r += nonce;
        }

        let e = challenge(&r, &msg_hash, &combined.combined_key)?;

        // s = k + kTwo·b + a·e·x mod n
        let s = pair.k.scalar()
            + pair.k_two.scalar() * b
            + a * e.to_scalar() * private_key.scalar();

        let output = SignatureOutput {
            signature: Signature::from_scalar(&s),
            challenge: e,
            final_public_nonce: PublicKey::from_point(&r)?,
        };

        // The pair has signed; it must never sign again.
        self.nonces.discard(&identity);
        debug!(%identity, "partial signature produced");

        Ok(output)
    }

    /// Export the signer's nonce store as a JSON state blob
    pub fn to_json(&self) -> Result<String> {
        self.nonces.to_json()
    }

    /// Restore a signer (and its open rounds) from a JSON state blob
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self {
            nonces: NonceStore::from_json(json)?,
        })
    }
}

/// Sum partial signatures mod n into the aggregate signature
pub fn sum_signatures(signatures: &[Signature]) -> Result<Signature> {
    if signatures.is_empty() {
        return Err(Error::InsufficientParticipants {
            required: 1,
            actual: 0,
        });
    }

    let mut sum = Scalar::ZERO;
    for signature in signatures {
        sum += signature.to_scalar();
    }
    Ok(Signature::from_scalar(&sum))
}

/// b = keccak256(combinedKey ‖ msgHash ‖ Σ kPublic ‖ Σ kTwoPublic)
/// mod n: the nonce-binding coefficient, tied to the message and the
/// whole commitment set so nonces cannot be replayed across sessions
fn b_coefficient(
    combined_key: &PublicKey,
    msg_hash: &[u8; 32],
    public_nonces: &[PublicNonces],
) -> Result<Scalar> {
    let mut k_sum = ProjectivePoint::IDENTITY;
    let mut k_two_sum = ProjectivePoint::IDENTITY;
    for nonce in public_nonces {
        k_sum += nonce.k_public.to_point()?;
        k_two_sum += nonce.k_two_public.to_point()?;
    }

    let k_sum = PublicKey::from_point(&k_sum)?;
    let k_two_sum = PublicKey::from_point(&k_two_sum)?;

    let digest = keccak256_packed(&[
        combined_key.as_bytes(),
        msg_hash,
        k_sum.as_bytes(),
        k_two_sum.as_bytes(),
    ]);
    Ok(<Scalar as Reduce<U256>>::reduce_bytes(&digest.into()))
}

/// A signer's effective nonce for the round: kPublic + b·kTwoPublic
fn effective_nonce(nonce: &PublicNonces, b: &Scalar) -> Result<ProjectivePoint> {
    Ok(nonce.k_public.to_point()? + nonce.k_two_public.to_point()? * *b)
}
