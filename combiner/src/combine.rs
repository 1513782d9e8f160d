use crate::{CombineError, HashEncoder};
use link::KeyTableService;
use num_bigint::BigUint;

/// Verification outcome. A signature that fails to reproduce the hash is a
/// routine input, kept apart from the error channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid,
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

/// Signs and verifies by folding key-table rows, talking to the service
/// that owns the tables.
pub struct Combiner<S> {
    service: S,
    encoder: HashEncoder,
}

impl<S: KeyTableService> Combiner<S> {
    /// Build the hash encoder from the service's configured width.
    pub fn connect(service: S) -> Result<Self, CombineError> {
        let params = service.parameters()?;
        let encoder = HashEncoder::new(params.hash_bits)?;
        Ok(Self { service, encoder })
    }

    pub fn with_encoder(service: S, encoder: HashEncoder) -> Self {
        Self { service, encoder }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn sign(&self, message: &str) -> Result<BigUint, CombineError> {
        self.sign_digest(&self.encoder.encode(message))
    }

    pub fn verify(&self, message: &str, signature: &BigUint) -> Result<Verdict, CombineError> {
        self.verify_digest(&self.encoder.encode(message), signature)
    }

    /// Fold the private rows selected by `hash` into a signature:
    /// `s_0 = hash mod N`, then `s_j = s_{j-1}^{t_j} mod N` over the
    /// released rows in ascending index order.
    ///
    /// The row request consumes one bounded query.
    pub fn sign_digest(&self, hash: &BigUint) -> Result<BigUint, CombineError> {
        let rows = self.service.private_key_table_rows(hash)?;
        let modulus = self.service.modulus_n()?;

        let mut signature = hash % &modulus;
        for row in rows.iter() {
            signature = signature.modpow(row, &modulus);
        }
        Ok(signature)
    }

    /// Fold the public rows at `hash`'s set bits over `signature`; the
    /// masked exponent pairs cancel, so a genuine signature lands back on
    /// `hash mod N`.
    pub fn verify_digest(
        &self,
        hash: &BigUint,
        signature: &BigUint,
    ) -> Result<Verdict, CombineError> {
        let table = self.service.public_key_table()?;
        let modulus = self.service.modulus_n()?;

        let width = hash.bits();
        if width as usize > table.len() {
            return Err(CombineError::TableTooShort {
                rows: table.len(),
                width: width as usize,
            });
        }

        let mut folded = signature.clone();
        for i in 0..width {
            if hash.bit(i) {
                folded = folded.modpow(&table[i as usize], &modulus);
            }
        }

        Ok(if folded == hash % &modulus {
            Verdict::Valid
        } else {
            Verdict::Invalid
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Combiner, Verdict};
    use crate::{CombineError, HashEncoder};
    use authority::Authority;
    use link::{KeyTableService, LinkError, ServiceError};
    use num_bigint::BigUint;

    fn debug_combiner(max_queries: usize) -> Combiner<Authority> {
        let authority = Authority::new(9, 7, max_queries);
        authority.install_debug_key();
        // the demo tables are 7 rows; fold tests feed digests directly
        Combiner::with_encoder(authority, HashEncoder::new(8).unwrap())
    }

    #[test]
    fn sign_fold_matches_known_values() {
        let combiner = debug_combiner(10);
        // H = 0b101: 5 mod 323 = 5, 5^59 = 28, 28^145 = 28 (mod 323)
        let signature = combiner.sign_digest(&BigUint::from(5u32)).unwrap();
        assert_eq!(signature, BigUint::from(28u32));
    }

    #[test]
    fn verify_fold_accepts_the_genuine_signature() {
        let combiner = debug_combiner(10);
        let verdict = combiner
            .verify_digest(&BigUint::from(5u32), &BigUint::from(28u32))
            .unwrap();
        assert_eq!(verdict, Verdict::Valid);
        assert!(verdict.is_valid());
    }

    #[test]
    fn verify_fold_rejects_a_tampered_signature() {
        let combiner = debug_combiner(10);
        let verdict = combiner
            .verify_digest(&BigUint::from(5u32), &BigUint::from(29u32))
            .unwrap();
        assert_eq!(verdict, Verdict::Invalid);
    }

    #[test]
    fn verification_is_unbounded() {
        let combiner = debug_combiner(1);
        let signature = combiner.sign_digest(&BigUint::from(5u32)).unwrap();
        for _ in 0..8 {
            let verdict = combiner
                .verify_digest(&BigUint::from(5u32), &signature)
                .unwrap();
            assert_eq!(verdict, Verdict::Valid);
        }
    }

    #[test]
    fn signing_consumes_the_query_bound() {
        let combiner = debug_combiner(1);
        combiner.sign_digest(&BigUint::from(5u32)).unwrap();
        match combiner.sign_digest(&BigUint::from(5u32)) {
            Err(CombineError::Link(LinkError::Service(ServiceError::Exhausted))) => {}
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[test]
    fn full_scheme_round_trip() {
        let authority = Authority::new(64, 64, 8);
        authority.generate_new_key().unwrap();
        let combiner = Combiner::connect(authority).unwrap();

        let signature = combiner.sign("message").unwrap();
        assert_eq!(
            combiner.verify("message", &signature).unwrap(),
            Verdict::Valid
        );
        assert_eq!(
            combiner.verify("message2", &signature).unwrap(),
            Verdict::Invalid
        );
        assert_eq!(
            combiner
                .verify("message", &(signature + 1u32))
                .unwrap(),
            Verdict::Invalid
        );
    }

    #[test]
    fn connect_refuses_odd_hash_widths() {
        let authority = Authority::new(9, 7, 10);
        authority.install_debug_key();
        match Combiner::connect(authority) {
            Err(CombineError::HashWidth(7)) => {}
            other => panic!("expected HashWidth, got {:?}", other.map(|_| ())),
        }
    }
}
