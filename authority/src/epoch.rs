use crate::QueryGate;
use link::ServiceError;
use num_bigint::BigUint;
use num_traits::Zero;
use utils::{gen_below, generate_prime, modinv, Rand};

/// F4, the fixed public exponent convention.
const PUB_EXP: u32 = 65537;

/// Miller-Rabin rounds for the keypair primes.
const PRIME_TEST_ROUNDS: usize = 19;

/// Attempts at a usable prime pair before generation gives up.
const MAX_KEYGEN_ATTEMPTS: usize = 128;

/// One generated keypair, its derived masked-exponent tables, and the query
/// gate that bounds private-table exposure. The unit of key rotation.
pub struct KeyEpoch {
    modulus: BigUint,
    private_table: Vec<BigUint>,
    public_table: Vec<BigUint>,
    gate: QueryGate,
}

// Secret intermediates of key generation. Cleared on drop so that every
// exit path, not only the successful one, leaves no copies behind.
struct KeyMaterial {
    p: BigUint,
    q: BigUint,
    phi: BigUint,
    d: BigUint,
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.p.set_zero();
        self.q.set_zero();
        self.phi.set_zero();
        self.d.set_zero();
    }
}

impl KeyEpoch {
    /// Generate a fresh epoch: an RSA keypair of `rsa_bits` modulus width,
    /// expanded into `hash_bits` pairs of masked exponents.
    ///
    /// For each index an independent uniform mask `r` in `(0, phi)` is
    /// drawn and the pair `(d^r mod phi, e^r mod phi)` stored. Since
    /// `d*e = 1 mod phi`, the entries of a pair are multiplicative inverses
    /// of each other mod `phi`, whatever `r` was; that is what makes the
    /// per-bit folds of signing and verification cancel.
    pub fn generate<R: Rand>(
        rsa_bits: usize,
        hash_bits: usize,
        max_queries: usize,
        rng: &mut R,
    ) -> Result<Self, ServiceError> {
        if rsa_bits < 8 {
            return Err(ServiceError::Generation(format!(
                "modulus width `{rsa_bits}` is too small"
            )));
        }
        if hash_bits == 0 {
            return Err(ServiceError::Generation(
                "hash width must be positive".to_string(),
            ));
        }

        let (modulus, material) = keypair(rsa_bits, rng)?;
        let (private_table, public_table) = masked_tables(&material, hash_bits, rng);

        let size_bits = 2 * hash_bits * material.phi.bits() as usize;
        let size_kib = (size_bits / 8) as f64 / 1024.0;
        if size_kib < 1024.0 {
            log::info!("size of generated tables: {:.1} KiB", size_kib);
        } else {
            log::info!("size of generated tables: {:.3} MiB", size_kib / 1024.0);
        }

        Ok(Self {
            modulus,
            private_table,
            public_table,
            gate: QueryGate::new(max_queries),
        })
    }

    /// Fixed tiny key: p=17, q=19, N=323, e=59, d=83, seven table rows.
    /// Hopelessly insecure; exists so behaviour can be checked against
    /// known values.
    pub fn debug_fixture(max_queries: usize) -> Self {
        let private = [59u32, 179, 145, 11, 241, 169, 203];
        let public = [83u32, 251, 145, 131, 49, 121, 227];
        Self {
            modulus: BigUint::from(323u32),
            private_table: private.into_iter().map(BigUint::from).collect(),
            public_table: public.into_iter().map(BigUint::from).collect(),
            gate: QueryGate::new(max_queries),
        }
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Table length; one row per hash bit position.
    pub fn hash_bits(&self) -> usize {
        self.public_table.len()
    }

    pub fn public_table(&self) -> &[BigUint] {
        self.public_table.as_slice()
    }

    pub fn gate(&self) -> &QueryGate {
        &self.gate
    }

    pub(crate) fn gate_mut(&mut self) -> &mut QueryGate {
        &mut self.gate
    }

    /// Private rows at the set-bit indices of `hash`, ascending. The caller
    /// has already validated `hash` against the table length.
    pub(crate) fn private_rows(&self, hash: &BigUint) -> Vec<BigUint> {
        let mut rows = Vec::with_capacity(hash.count_ones() as usize);
        for i in 0..hash.bits() {
            if hash.bit(i) {
                rows.push(self.private_table[i as usize].clone());
            }
        }
        rows
    }
}

impl Drop for KeyEpoch {
    fn drop(&mut self) {
        for row in self.private_table.iter_mut() {
            row.set_zero();
        }
        self.private_table.clear();
        self.public_table.clear();
        self.modulus.set_zero();
    }
}

fn keypair<R: Rand>(rsa_bits: usize, rng: &mut R) -> Result<(BigUint, KeyMaterial), ServiceError> {
    let e = BigUint::from(PUB_EXP);
    let p_bits = rsa_bits - rsa_bits / 2;

    for _ in 0..MAX_KEYGEN_ATTEMPTS {
        let p = generate_prime(p_bits, PRIME_TEST_ROUNDS, rng).map_err(ServiceError::Generation)?;
        let q = generate_prime(rsa_bits - p_bits, PRIME_TEST_ROUNDS, rng)
            .map_err(ServiceError::Generation)?;
        if p == q {
            continue;
        }

        let mut material = KeyMaterial {
            p,
            q,
            phi: BigUint::zero(),
            d: BigUint::zero(),
        };

        let modulus = &material.p * &material.q;
        if modulus.bits() as usize != rsa_bits {
            continue;
        }

        material.phi = (&material.p - 1u32) * (&material.q - 1u32);
        match modinv(&e, &material.phi) {
            Some(d) => {
                material.d = d;
                return Ok((modulus, material));
            }
            None => continue,
        }
    }

    Err(ServiceError::Generation(format!(
        "no usable prime pair of {rsa_bits} bits within {MAX_KEYGEN_ATTEMPTS} attempts"
    )))
}

fn masked_tables<R: Rand>(
    material: &KeyMaterial,
    hash_bits: usize,
    rng: &mut R,
) -> (Vec<BigUint>, Vec<BigUint>) {
    let e = BigUint::from(PUB_EXP);
    let (mut private_table, mut public_table) = (
        Vec::with_capacity(hash_bits),
        Vec::with_capacity(hash_bits),
    );

    for _ in 0..hash_bits {
        let r = loop {
            let r = gen_below(&material.phi, rng);
            if !r.is_zero() {
                break r;
            }
        };

        private_table.push(material.d.modpow(&r, &material.phi));
        public_table.push(e.modpow(&r, &material.phi));
    }

    (private_table, public_table)
}

#[cfg(test)]
mod tests {
    use super::{keypair, masked_tables, KeyEpoch, PUB_EXP};
    use link::ServiceError;
    use num_bigint::BigUint;
    use num_traits::One;
    use utils::DefaultRand;

    #[test]
    fn fixture_tables_are_inverse_pairs() {
        let epoch = KeyEpoch::debug_fixture(10);
        let phi = BigUint::from(288u32);
        for (t, u) in epoch.private_table.iter().zip(epoch.public_table.iter()) {
            assert!(((t * u) % &phi).is_one(), "{t} * {u} != 1 mod {phi}");
        }
    }

    #[test]
    fn generated_tables_are_inverse_pairs() {
        let mut rng = DefaultRand::default();
        let (modulus, material) = keypair(64, &mut rng).unwrap();
        assert_eq!(modulus.bits(), 64);
        assert!(
            ((&material.d * PUB_EXP) % &material.phi).is_one(),
            "keypair exponents are not inverses"
        );

        let (private_table, public_table) = masked_tables(&material, 8, &mut rng);
        assert_eq!(private_table.len(), 8);
        assert_eq!(public_table.len(), 8);
        for (t, u) in private_table.iter().zip(public_table.iter()) {
            assert!(((t * u) % &material.phi).is_one());
        }
    }

    #[test]
    fn generate_builds_full_epoch() {
        let mut rng = DefaultRand::default();
        let epoch = KeyEpoch::generate(64, 8, 4, &mut rng).unwrap();
        assert_eq!(epoch.hash_bits(), 8);
        assert_eq!(epoch.modulus().bits(), 64);
        assert_eq!(epoch.gate().limit(), 4);
        assert_eq!(epoch.gate().used(), 0);
    }

    #[test]
    fn rows_follow_set_bits_in_order() {
        let epoch = KeyEpoch::debug_fixture(10);
        let rows = epoch.private_rows(&BigUint::from(0b101u32));
        assert_eq!(rows, vec![BigUint::from(59u32), BigUint::from(145u32)]);

        let rows = epoch.private_rows(&BigUint::from(0b1100010u32));
        assert_eq!(
            rows,
            vec![
                BigUint::from(179u32),
                BigUint::from(169u32),
                BigUint::from(203u32)
            ]
        );
    }

    #[test]
    fn tiny_modulus_width_fails_generation() {
        let mut rng = DefaultRand::default();
        for bits in [0, 7] {
            match KeyEpoch::generate(bits, 8, 4, &mut rng) {
                Err(ServiceError::Generation(_)) => {}
                other => panic!("expected generation failure, got {:?}", other.map(|_| ())),
            }
        }
    }
}
