//! Signing, aggregation and verification
//!
//! The multi-signature engine and the single-signer baseline share one
//! challenge derivation and one verification equation, so a combined
//! key verifies exactly like a plain public key.

mod challenge;
mod musig;
mod schnorr;

pub use challenge::challenge;
pub use musig::{sum_signatures, MusigSigner};
pub use schnorr::{sign, verify};
