//! Randomness for undefined hardware behaviour.
//!
//! Real hardware powers up with garbage in its registers and video memory,
//! and two devices driving the bus at once produce an unpredictable byte.
//! The machine draws all of those from one [`Entropy`] source so tests can
//! substitute a fixed value.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::config::EntropyConfig;

/// A stream of arbitrary bytes.
pub trait Entropy {
    fn next_byte(&mut self) -> u8;

    fn fill(&mut self, buf: &mut [u8]) {
        for byte in buf {
            *byte = self.next_byte();
        }
    }
}

/// Pseudo-random source backed by `StdRng`.
pub struct RandEntropy {
    rng: StdRng,
}

impl RandEntropy {
    /// Reproducible stream for a given seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Stream seeded from the operating system.
    #[must_use]
    pub fn from_os() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl Entropy for RandEntropy {
    fn next_byte(&mut self) -> u8 {
        self.rng.random::<u8>()
    }

    fn fill(&mut self, buf: &mut [u8]) {
        self.rng.fill_bytes(buf);
    }
}

/// Always returns the same byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedEntropy(pub u8);

impl Entropy for FixedEntropy {
    fn next_byte(&mut self) -> u8 {
        self.0
    }
}

impl EntropyConfig {
    /// Build the configured source.
    #[must_use]
    pub fn build(self) -> Box<dyn Entropy> {
        match self {
            Self::Seeded(seed) => Box::new(RandEntropy::seeded(seed)),
            Self::System => Box::new(RandEntropy::from_os()),
            Self::Fixed(byte) => Box::new(FixedEntropy(byte)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = RandEntropy::seeded(42);
        let mut b = RandEntropy::seeded(42);
        let xs: Vec<u8> = (0..32).map(|_| a.next_byte()).collect();
        let ys: Vec<u8> = (0..32).map(|_| b.next_byte()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn fixed_fills_with_its_byte() {
        let mut fixed = FixedEntropy(0x5A);
        let mut buf = [0u8; 8];
        fixed.fill(&mut buf);
        assert_eq!(buf, [0x5A; 8]);
    }

    #[test]
    fn config_builds_fixed_source() {
        let mut source = EntropyConfig::Fixed(0x12).build();
        assert_eq!(source.next_byte(), 0x12);
    }
}
