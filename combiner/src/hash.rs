use crate::CombineError;
use num_bigint::BigUint;
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake256;

/// Maps a text message onto a fixed-width non-negative integer through an
/// extendable-output hash.
///
/// `SHAKE256(M, hash_bits)`, read big-endian. The width is fixed at
/// construction and must be a positive multiple of 8 so the XOF emits a
/// whole number of bytes; anything else is a configuration mistake, caught
/// here rather than at the first message.
#[derive(Clone, Debug)]
pub struct HashEncoder {
    hash_bits: usize,
}

impl HashEncoder {
    pub fn new(hash_bits: usize) -> Result<Self, CombineError> {
        if hash_bits == 0 || (hash_bits & 7) != 0 {
            return Err(CombineError::HashWidth(hash_bits));
        }
        Ok(Self { hash_bits })
    }

    pub fn hash_bits(&self) -> usize {
        self.hash_bits
    }

    pub fn encode(&self, message: &str) -> BigUint {
        let mut xof = Shake256::default();
        xof.update(message.as_bytes());

        let mut digest = vec![0u8; self.hash_bits >> 3];
        xof.finalize_xof().read(digest.as_mut_slice());
        BigUint::from_bytes_be(digest.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::HashEncoder;
    use crate::CombineError;
    use num_bigint::BigUint;
    use num_traits::Num;

    #[test]
    fn width_must_be_a_positive_byte_multiple() {
        for bits in [0usize, 7, 12, 257] {
            match HashEncoder::new(bits) {
                Err(CombineError::HashWidth(b)) => assert_eq!(b, bits),
                other => panic!("width {bits} was accepted: {other:?}"),
            }
        }
        assert!(HashEncoder::new(8).is_ok());
        assert!(HashEncoder::new(256).is_ok());
    }

    #[test]
    fn shake256_known_answers() {
        let cases = [
            (
                "1",
                "2f169f9b4e6a1024752209cd5410ebb84959eee0ac73c29a04c23bd524c12f81",
            ),
            (
                "2",
                "a5a4f007abc4dfe1eb19f685efde94ca76f77dff7279de620dd52074b33fa1c6",
            ),
            (
                "3",
                "08946cd494a2c00b0e9321af0c225309e9d1b9d14ce8eeb4ed5182031c3f29b0",
            ),
        ];

        let encoder = HashEncoder::new(256).unwrap();
        for (msg, digest) in cases {
            let tgt = BigUint::from_str_radix(digest, 16).unwrap();
            assert_eq!(encoder.encode(msg), tgt, "digest of `{msg}`");
        }
    }

    #[test]
    fn shorter_widths_are_xof_prefixes() {
        let wide = HashEncoder::new(256).unwrap().encode("1");
        let narrow = HashEncoder::new(128).unwrap().encode("1");
        // the first 16 of the 32 big-endian bytes
        assert_eq!(narrow, wide >> 128);
    }
}
