use crate::Rand;
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{Euclid, One, ToPrimitive, Zero};
#[cfg(feature = "sec-zeroize")]
use zeroize::Zeroize;

/// 算法导论 定理31.23
/// `x * inv = 1 mod modulus`, if `gcd(x, modulus) = 1`
pub fn modinv(x: &BigUint, modulus: &BigUint) -> Option<BigUint> {
    let (a, n) = (BigInt::from(x % modulus), BigInt::from(modulus.clone()));
    let g = a.extended_gcd(&n);
    g.gcd.is_one().then(|| {
        g.x.rem_euclid(&n)
            .to_biguint()
            .expect("this will always big uint")
    })
}

/// Uniform random integer in `[0, bound)`, by rejection sampling.
pub fn gen_below<R: Rand>(bound: &BigUint, rng: &mut R) -> BigUint {
    let bits = bound.bits() as usize;
    let b = if (bits & 7) == 0 { 8 } else { bits & 7 };
    let mut buf = vec![0u8; (bits + 7) >> 3];

    loop {
        rng.rand(buf.as_mut_slice());

        // 清除大于bound位宽的位, 采样接受率至少1/2
        if b != 8 {
            if let Some(x) = buf.last_mut() {
                *x &= (1u8 << b) - 1;
            }
        }

        let r = BigUint::from_bytes_le(buf.as_slice());
        if &r < bound {
            #[cfg(feature = "sec-zeroize")]
            buf.zeroize();
            return r;
        }
    }
}

const SMALL_PRIMES: [u8; 15] = [3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53];
const SMALL_PRIMES_PRODUCT: u64 = 16294579238595022365u64;

/// generate a number p with the bits length of `bits_len`, such that p is prime
/// with high probability that is related to the number of `test_rounds`;
///
/// `test_rounds`(n) means the number of test rounds, the probability of error
/// in the MillerRabin test is at most $2^{-n}$.
pub fn generate_prime<R: Rand>(
    bits_len: usize,
    test_rounds: usize,
    rng: &mut R,
) -> Result<BigUint, String> {
    if bits_len < 2 {
        return Err("prime size must at least 2-bits".to_string());
    }

    let (mut p, b) = (
        vec![0u8; (bits_len + 7) >> 3],
        if (bits_len & 7) == 0 { 8 } else { bits_len & 7 },
    );

    loop {
        rng.rand(p.as_mut_slice());

        // 清除大于bits_len的位;
        if b != 8 {
            if let Some(x) = p.last_mut() {
                *x &= (1u8 << b) - 1;
            }
        }

        // Force the top two bits so that the product of two such primes
        // never comes up one bit short of the target modulus width.
        if b >= 2 {
            if let Some(x) = p.last_mut() {
                *x |= 3 << (b - 2);
            }
        } else {
            let len = p.len();
            p[len - 1] |= 1;
            if len > 1 {
                p[len - 2] |= 0x80;
            }
        }

        // 奇数
        if let Some(x) = p.first_mut() {
            *x |= 1;
        }

        // Step the candidate past multiples of the first few primes before
        // paying for Miller-Rabin. The sieve works on the residue mod the
        // product of those primes, so only one big division is needed.
        let mut n = BigUint::from_bytes_le(p.as_slice());
        let modulus = (&n % SMALL_PRIMES_PRODUCT)
            .to_u64()
            .expect("expect less than u64::MAX");

        'next_delta: for delta in (0u64..(1u64 << 20)).step_by(2) {
            let m = modulus + delta;
            for &prime in SMALL_PRIMES.iter() {
                let prime = prime as u64;
                if (m % prime) == 0 && (bits_len > 6 || m != prime) {
                    continue 'next_delta;
                }
            }

            if delta > 0 {
                n += delta;
            }
            break;
        }

        if n.bits() as usize == bits_len && probably_prime(&n, test_rounds, rng) {
            #[cfg(feature = "sec-zeroize")]
            p.zeroize();
            return Ok(n);
        }
    }
}

/// Probabilistic prime test: trial division by small primes, then
/// `test_rounds` rounds of Miller-Rabin with random bases.
pub fn probably_prime<R: Rand>(n: &BigUint, test_rounds: usize, rng: &mut R) -> bool {
    const PRIME_BIT_MASK: u128 = 1 << 2
        | 1 << 3
        | 1 << 5
        | 1 << 7
        | 1 << 11
        | 1 << 13
        | 1 << 17
        | 1 << 19
        | 1 << 23
        | 1 << 29
        | 1 << 31
        | 1 << 37
        | 1 << 41
        | 1 << 43
        | 1 << 47
        | 1 << 53
        | 1 << 59
        | 1 << 61
        | 1 << 67
        | 1 << 71
        | 1 << 73
        | 1 << 79
        | 1 << 83
        | 1 << 89
        | 1 << 97
        | 1 << 101
        | 1 << 103
        | 1 << 107
        | 1 << 109
        | 1 << 113
        | 1 << 127;
    const PRIMES_A: u32 = 3 * 5 * 7 * 11 * 13 * 17 * 19 * 23 * 37;
    const PRIMES_B: u32 = 29 * 31 * 41 * 43 * 47 * 53;

    if n.bits() < 8 {
        // 小素数直接判断
        let x = n.iter_u64_digits().next().unwrap_or(0);
        return ((1u128 << (x as u128)) & PRIME_BIT_MASK) != 0;
    } else if n.is_even() {
        return false;
    }

    let (ra, rb) = (
        (n % PRIMES_A).to_u32().expect("residue fits in u32"),
        (n % PRIMES_B).to_u32().expect("residue fits in u32"),
    );
    if [3u32, 5, 7, 11, 13, 17, 19, 23, 37].iter().any(|&p| ra % p == 0)
        || [29u32, 31, 41, 43, 47, 53].iter().any(|&p| rb % p == 0)
    {
        return false;
    }

    miller_rabin(n, test_rounds + 1, rng)
}

// n = 2^s * r + 1, r odd; a witness base proves n composite when
// a^r != ±1 and squaring never reaches -1 before hitting 1.
fn miller_rabin<R: Rand>(n: &BigUint, rounds: usize, rng: &mut R) -> bool {
    let n_m1 = n - 1u32;
    let s = n_m1.trailing_zeros().unwrap_or(0);
    let r = &n_m1 >> s;

    'next_round: for _ in 0..rounds {
        let a = gen_below(n, rng);
        if a.is_zero() || a.is_one() {
            continue;
        }

        let mut y = a.modpow(&r, n);
        if y.is_one() || y == n_m1 {
            continue;
        }

        for _ in 0..s.saturating_sub(1) {
            y = (&y * &y) % n;
            if y == n_m1 {
                continue 'next_round;
            }
        }

        return false;
    }

    true
}
