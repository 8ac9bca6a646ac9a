//! Item hashing: the caller-side capability that produces 64-bit seeds.
//!
//! The shared-memory engine never inspects application values; it consumes a
//! 64-bit seed that some hash function already computed. [`BloomHasher`] is
//! that injected capability. Implementations must be **deterministic across
//! processes**: two processes mapping the same filter file must derive the
//! same seed for the same item, or membership answers become nonsense.
//!
//! That requirement rules out randomized-key hashers as the default, which
//! is why [`Xxh3Hasher`] (fixed-seed xxh3) is the default here rather than a
//! DoS-resistant randomized SipHash. [`StdHasher`] wraps the standard
//! library's SipHash with its fixed default keys for callers who prefer to
//! avoid the extra dependency in their own code paths.
//!
//! # Examples
//!
//! ```
//! use shmbloom::hash::{BloomHasher, Xxh3Hasher};
//!
//! let hasher = Xxh3Hasher::new();
//! let seed = hasher.hash_bytes(b"hello");
//! assert_eq!(seed, hasher.hash_bytes(b"hello"));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use xxhash_rust::xxh3::{xxh3_64, xxh3_64_with_seed};

/// Hash arbitrary bytes to a 64-bit seed for the probe sequence.
///
/// # Requirements
///
/// - **Deterministic across processes and runs**: same bytes, same seed,
///   always. Filters are shared between independent processes.
/// - **Uniform**: output spread evenly across the `u64` space.
/// - **Non-cryptographic is fine**: collisions between caller items are the
///   caller's concern (two items with equal seeds are indistinguishable to
///   the engine, by design).
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one hasher instance is shared by
/// every operation on a filter handle.
pub trait BloomHasher: Send + Sync {
    /// Hash bytes to a 64-bit seed.
    fn hash_bytes(&self, bytes: &[u8]) -> u64;
}

/// Default hasher: xxh3 with a fixed seed.
///
/// Fast, well-dispersed, and stable across processes, platforms of the same
/// byte order, and crate versions pinned to the same `xxhash-rust`.
///
/// # Examples
///
/// ```
/// use shmbloom::hash::{BloomHasher, Xxh3Hasher};
///
/// let a = Xxh3Hasher::new();
/// let b = Xxh3Hasher::with_seed(7);
/// assert_ne!(a.hash_bytes(b"x"), b.hash_bytes(b"x"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh3Hasher {
    seed: u64,
}

impl Xxh3Hasher {
    /// Create a hasher with the default (zero) seed.
    #[must_use]
    pub const fn new() -> Self {
        Self { seed: 0 }
    }

    /// Create a hasher with a specific seed.
    ///
    /// Every process opening the same filter must use the same seed.
    #[must_use]
    pub const fn with_seed(seed: u64) -> Self {
        Self { seed }
    }
}

impl BloomHasher for Xxh3Hasher {
    #[inline]
    fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        if self.seed == 0 {
            xxh3_64(bytes)
        } else {
            xxh3_64_with_seed(bytes, self.seed)
        }
    }
}

/// SipHash-backed hasher using the standard library's fixed default keys.
///
/// `DefaultHasher::new()` is keyed with constants (unlike `RandomState`),
/// so this is deterministic across processes. Slower than [`Xxh3Hasher`]
/// for the short keys typical of filter workloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdHasher {
    seed: u64,
}

impl StdHasher {
    /// Create a hasher with the default (zero) seed.
    #[must_use]
    pub const fn new() -> Self {
        Self { seed: 0 }
    }

    /// Create a hasher with a specific seed, mixed in ahead of the data.
    #[must_use]
    pub const fn with_seed(seed: u64) -> Self {
        Self { seed }
    }
}

impl BloomHasher for StdHasher {
    #[inline]
    fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        let mut hasher = DefaultHasher::new();
        if self.seed != 0 {
            hasher.write_u64(self.seed);
        }
        hasher.write(bytes);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xxh3_deterministic() {
        let hasher = Xxh3Hasher::new();
        assert_eq!(hasher.hash_bytes(b"item"), hasher.hash_bytes(b"item"));
    }

    #[test]
    fn test_xxh3_seed_changes_output() {
        let a = Xxh3Hasher::new();
        let b = Xxh3Hasher::with_seed(42);
        assert_ne!(a.hash_bytes(b"item"), b.hash_bytes(b"item"));
    }

    #[test]
    fn test_xxh3_distinct_inputs() {
        let hasher = Xxh3Hasher::new();
        assert_ne!(hasher.hash_bytes(b"a"), hasher.hash_bytes(b"b"));
    }

    #[test]
    fn test_std_hasher_deterministic() {
        let hasher = StdHasher::new();
        assert_eq!(hasher.hash_bytes(b"item"), hasher.hash_bytes(b"item"));
    }

    #[test]
    fn test_std_hasher_seed_changes_output() {
        let a = StdHasher::new();
        let b = StdHasher::with_seed(42);
        assert_ne!(a.hash_bytes(b"item"), b.hash_bytes(b"item"));
    }

    #[test]
    fn test_hashers_disagree() {
        // Sanity check that the two implementations are actually different
        // functions; a filter file is bound to whichever one created it.
        let xx = Xxh3Hasher::new();
        let std = StdHasher::new();
        assert_ne!(xx.hash_bytes(b"item"), std.hash_bytes(b"item"));
    }
}
