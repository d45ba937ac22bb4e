//! Key generation and MuSig key aggregation

mod aggregate;
mod keypair;

pub use aggregate::{combine_public_keys, combine_public_keys_salted, AggregationMode};
pub use keypair::random_aggregation_secret;

pub(crate) use aggregate::a_coefficient;
