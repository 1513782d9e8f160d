use xrand::rngs::OsRng;
use xrand::RngCore;

/// Entropy seam for everything that draws randomness.
pub trait Rand {
    /// Fill `random` with fresh random bytes.
    fn rand(&mut self, random: &mut [u8]);
}

/// OS entropy.
#[derive(Copy, Clone, Default)]
pub struct DefaultRand {
    rng: OsRng,
}

impl Rand for DefaultRand {
    fn rand(&mut self, random: &mut [u8]) {
        self.rng.fill_bytes(random);
    }
}
