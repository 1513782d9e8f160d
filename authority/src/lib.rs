//! The secret-holding side of the split-key signing scheme.
//!
//! One RSA keypair is expanded into two parallel tables of masked
//! exponents, one per hash bit position. The private table is released only
//! row by row, a bounded number of times per key epoch; the public table is
//! free. Neither the private exponent nor the totient ever leaves this
//! crate.

mod gate;
pub use gate::QueryGate;

mod epoch;
pub use epoch::KeyEpoch;

mod service;
pub use service::Authority;
