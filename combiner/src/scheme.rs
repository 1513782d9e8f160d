use crate::{CombineError, Combiner, Verdict};
use link::KeyTableService;
use num_bigint::BigUint;

/// The capability set a timing harness drives against any signing backend:
/// fresh key, sign, verify. Picking a backend is a compile-time choice of
/// implementor; there is deliberately no by-name registry.
pub trait SignatureScheme {
    fn generate_key(&self) -> Result<(), CombineError>;

    fn sign(&self, message: &str) -> Result<BigUint, CombineError>;

    fn verify(&self, message: &str, signature: &BigUint) -> Result<Verdict, CombineError>;
}

impl<S: KeyTableService> SignatureScheme for Combiner<S> {
    fn generate_key(&self) -> Result<(), CombineError> {
        Ok(self.service().generate_new_key()?)
    }

    fn sign(&self, message: &str) -> Result<BigUint, CombineError> {
        Combiner::sign(self, message)
    }

    fn verify(&self, message: &str, signature: &BigUint) -> Result<Verdict, CombineError> {
        Combiner::verify(self, message, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::SignatureScheme;
    use crate::{Combiner, Verdict};
    use authority::Authority;
    use link::KeyTableService;

    // exercise the scheme through the trait object a harness would hold
    #[test]
    fn scheme_surface_round_trips() {
        let authority = Authority::new(64, 64, 8);
        authority.generate_new_key().unwrap();
        let combiner = Combiner::connect(authority).unwrap();
        let scheme: &dyn SignatureScheme = &combiner;

        scheme.generate_key().unwrap();
        let signature = scheme.sign("timed message").unwrap();
        assert_eq!(
            scheme.verify("timed message", &signature).unwrap(),
            Verdict::Valid
        );
    }
}
