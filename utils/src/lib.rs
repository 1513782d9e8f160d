mod bigint;
pub use bigint::{gen_below, generate_prime, modinv, probably_prime};

mod rand;
pub use rand::{DefaultRand, Rand};
