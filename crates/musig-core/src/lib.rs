//! # MuSig Core
//!
//! Two-round Schnorr multi-signature engine over secp256k1.
//!
//! This crate provides the building blocks for N parties to jointly
//! produce one compact signature that verifies against an aggregated
//! public key:
//! - Key generation and MuSig key aggregation
//! - Two-nonce commitment rounds with a strict single-use lifecycle
//! - Partial signing, aggregation and verification
//! - A single-signer baseline over the same challenge function
//!
//! ## Protocol Overview
//!
//! The challenge binds the aggregate nonce as a 20-byte account
//! address rather than a raw point, so signatures can be checked by
//! address-recovery-based on-chain verifiers.
//!
//! ## Example
//!
//! ```rust,ignore
//! use musig_core::{combine_public_keys, sum_signatures, verify, AggregationMode, MusigSigner};
//!
//! // Round 1: each party opens a nonce round and shares the public half.
//! let nonces_alice = alice.generate_public_nonces(&alice_key.private_key)?;
//! let nonces_bob = bob.generate_public_nonces(&bob_key.private_key)?;
//!
//! // Round 2: each party signs against the full commitment set.
//! let keys = [alice_key.public_key, bob_key.public_key];
//! let nonces = [nonces_alice, nonces_bob];
//! let partial_a = alice.multi_sig_sign(&alice_key.private_key, msg, &keys, &nonces)?;
//! let partial_b = bob.multi_sig_sign(&bob_key.private_key, msg, &keys, &nonces)?;
//!
//! // Anyone can aggregate and verify.
//! let combined = combine_public_keys(&keys, AggregationMode::Deterministic { secret: None })?;
//! let signature = sum_signatures(&[partial_a.signature, partial_b.signature])?;
//! assert!(verify(&signature, msg, &partial_a.final_public_nonce, &combined.combined_key)?);
//! ```

pub mod error;
pub mod hash;
pub mod keys;
pub mod nonce;
pub mod proof;
pub mod sign;
pub mod types;

pub use error::{Error, Result, SecretError};
pub use keys::{
    combine_public_keys, combine_public_keys_salted, random_aggregation_secret, AggregationMode,
};
pub use nonce::{NonceIdentity, NonceStore, PublicNonces};
pub use proof::{sign_proof, verify_proof};
pub use sign::{challenge, sign, sum_signatures, verify, MusigSigner};
pub use types::{
    Challenge, CombinedPublicKey, KeyPair, PrivateKey, PublicKey, Signature, SignatureOutput,
};

/// Protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
