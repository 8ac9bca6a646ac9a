//! Probe hash sequence: a deterministic chain of 64-bit values per item.
//!
//! Each inserted or queried item contributes `k` probe bits. Rather than run
//! `k` independent hash functions, the engine chains a single avalanche
//! finalizer: the first probe value is `mix64(seed)`, each subsequent value
//! is `mix64` of the previous one. The mix is the xxh64 finalizer reduced to
//! a single 8-byte lane — a multiply/rotate/xor-shift cascade over fixed odd
//! 64-bit primes — chosen for speed and bit dispersion, not security.
//!
//! Two items whose caller-supplied seeds collide will collide here too; seed
//! collisions are entirely the caller's concern.
//!
//! # Examples
//!
//! ```
//! use shmbloom::hash::probe::ProbeSequence;
//!
//! let a: Vec<u64> = ProbeSequence::new(0xDEAD_BEEF, 7).collect();
//! let b: Vec<u64> = ProbeSequence::new(0xDEAD_BEEF, 7).collect();
//! assert_eq!(a, b);
//! assert_eq!(a.len(), 7);
//! ```

/// xxh64 prime 1.
const PRIME_1: u64 = 11_400_714_785_074_694_791;
/// xxh64 prime 2.
const PRIME_2: u64 = 14_029_467_366_897_019_727;
/// xxh64 prime 3.
const PRIME_3: u64 = 1_609_587_929_392_839_161;
/// xxh64 prime 4.
const PRIME_4: u64 = 9_650_029_242_287_828_579;
/// xxh64 prime 5.
const PRIME_5: u64 = 2_870_177_450_012_600_261;

/// One round of the reduced xxh64 avalanche mix over a single u64 lane.
///
/// Equivalent to hashing exactly eight bytes with xxh64: one lane round
/// folded into the seed-free accumulator, then the standard finalizer.
/// A single flipped input bit disperses across roughly half the output bits.
///
/// # Examples
///
/// ```
/// use shmbloom::hash::probe::mix64;
///
/// assert_eq!(mix64(1), mix64(1));
/// assert_ne!(mix64(1), mix64(2));
/// ```
#[inline(always)]
#[must_use]
pub const fn mix64(x: u64) -> u64 {
    let mut k1 = x;
    let mut h64 = PRIME_5.wrapping_add(8);

    k1 = k1.wrapping_mul(PRIME_2);
    k1 = k1.rotate_left(31);
    k1 = k1.wrapping_mul(PRIME_1);
    h64 ^= k1;
    h64 = h64.rotate_left(27).wrapping_mul(PRIME_1).wrapping_add(PRIME_4);
    h64 ^= h64 >> 33;
    h64 = h64.wrapping_mul(PRIME_2);
    h64 ^= h64 >> 29;
    h64 = h64.wrapping_mul(PRIME_3);
    h64 ^= h64 >> 32;
    h64
}

/// Lazy, restartable chain of exactly `probes` mixed values from one seed.
///
/// Yields `mix64(seed)`, `mix64(mix64(seed))`, and so on. Never allocates;
/// the insert and query hot paths iterate it directly.
#[derive(Debug, Clone)]
pub struct ProbeSequence {
    current: u64,
    remaining: u32,
}

impl ProbeSequence {
    /// Start a probe chain from a caller-supplied seed.
    ///
    /// # Arguments
    ///
    /// * `seed` - 64-bit hash of the item, computed by the caller
    /// * `probes` - Exact number of values the sequence yields
    #[inline]
    #[must_use]
    pub const fn new(seed: u64, probes: u32) -> Self {
        Self {
            current: seed,
            remaining: probes,
        }
    }
}

impl Iterator for ProbeSequence {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.current = mix64(self.current);
        Some(self.current)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for ProbeSequence {}
