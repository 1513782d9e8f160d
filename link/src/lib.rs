//! Typed request/response contract between the key-table authority and its
//! clients, together with one concrete transport: a length-prefixed binary
//! protocol over a blocking TCP socket.
//!
//! The contract is deliberately synchronous. A call either completes or
//! fails; there is no retry layer, because the private-table row query is
//! not idempotent — resending it after a lost reply would burn a second
//! bounded query.

mod error;
pub use error::{LinkError, ServiceError};

mod wire;

mod client;
pub use client::TcpLink;

mod server;
pub use server::serve;

use num_bigint::BigUint;

/// The service's configured widths and query bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parameters {
    pub rsa_bits: usize,
    pub hash_bits: usize,
    pub max_queries: usize,
}

/// Operations the key-table authority answers. Implementations use interior
/// mutual exclusion, so every method takes `&self`.
pub trait KeyTableService {
    fn parameters(&self) -> Result<Parameters, LinkError>;

    fn is_initialized(&self) -> Result<bool, LinkError>;

    fn set_rsa_bits(&self, bits: usize) -> Result<(), LinkError>;

    fn set_hash_bits(&self, bits: usize) -> Result<(), LinkError>;

    fn set_max_queries(&self, max_queries: usize) -> Result<(), LinkError>;

    fn generate_new_key(&self) -> Result<(), LinkError>;

    fn delete_keys(&self) -> Result<(), LinkError>;

    fn modulus_n(&self) -> Result<BigUint, LinkError>;

    /// Private-table rows at the set-bit indices of `message_hash`, in
    /// increasing index order. Consumes one bounded query on success.
    fn private_key_table_rows(&self, message_hash: &BigUint) -> Result<Vec<BigUint>, LinkError>;

    /// The full public table. Unbounded and side-effect free.
    fn public_key_table(&self) -> Result<Vec<BigUint>, LinkError>;
}
