//! The hashing and recombination side of the split-key signing scheme.
//!
//! Works entirely from values the key-table service releases: a message is
//! hashed to a fixed-width integer, the hash's set bits select table rows,
//! and a chain of modular exponentiations folds those rows into a signature
//! (private rows) or back into the hash (public rows).

mod error;
pub use error::CombineError;

mod hash;
pub use hash::HashEncoder;

mod combine;
pub use combine::{Combiner, Verdict};

mod scheme;
pub use scheme::SignatureScheme;
