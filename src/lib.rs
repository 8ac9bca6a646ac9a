//! # shmbloom
//!
//! A Bloom filter that lives in a memory-mapped file and is shared, lock-free,
//! between processes.
//!
//! Every process that opens the same file sees the same bit array and the same
//! insertion budget. Inserts and queries are a counter decrement plus a handful
//! of atomic bit operations on the mapping; no locks, no syscalls, no
//! allocation on the hot path.
//!
//! ## Quick Start
//!
//! ```
//! use shmbloom::ShmBloomFilter;
//! # let dir = tempfile::tempdir().unwrap();
//! # let path = dir.path().join("seen.bloom");
//!
//! # fn run(path: &std::path::Path) -> shmbloom::Result<()> {
//! // 10k items, 0.1% false positive rate. Creates the file if absent,
//! // adopts the stored parameters if it already exists.
//! let filter: ShmBloomFilter<str> = ShmBloomFilter::open(path, 10_000, 0.001)?;
//!
//! filter.add("user:42");
//! assert!(filter.contains("user:42"));
//! assert!(!filter.contains("user:43"));
//! # Ok(())
//! # }
//! # run(&path).unwrap();
//! ```
//!
//! ## How It Works
//!
//! The backing file holds a 48-byte header (magic tag, capacity, error rate,
//! saturation counter) followed by the bit array. Only the two configuration
//! inputs are persisted; probe count, bit array size, and the division
//! constants are recomputed on every open, so a stored file can never disagree
//! with its own geometry.
//!
//! Each item is hashed once to a 64-bit seed; the seed is expanded into `k`
//! probe values by repeatedly applying an avalanche mix, and each value is
//! reduced to a bit index by precomputed multiply-and-shift division (no
//! hardware divide per probe).
//!
//! When the insertion budget runs out the filter **clears itself**: the bit
//! array is zeroed and the counter returns to `capacity`. This bounds the
//! false positive rate over an unbounded insert stream at the cost of
//! forgetting prior items. [`ShmBloomFilter::add`] returns `true` on the call
//! that triggered a reset.
//!
//! ## Concurrency Model
//!
//! File creation and validation happen under an exclusive `flock`. After that,
//! no operation takes any lock:
//!
//! - `add` / `contains` are lock-free and safe from any number of threads and
//!   processes.
//! - A query concurrent with an insert may observe some of its probe bits but
//!   not others. That widens toward "not present", never toward a false
//!   negative for completed inserts.
//! - The automatic reset is unsynchronized: concurrent exhaustion can clear
//!   twice, and in-flight inserts can lose bits to a concurrent clear. Callers
//!   that cannot tolerate this must serialize around the reset themselves.
//!
//! ## Choosing a Hasher
//!
//! The engine consumes 64-bit seeds, not items. [`hash::BloomHasher`] is the
//! seam: the default is fixed-seed xxh3, and anything deterministic across
//! processes will do, as long as every process opening the file injects the
//! same one. The `*_hash` methods on [`ShmBloomFilter`] skip item hashing
//! entirely for callers that bring their own.
//!
//! ## Unsafe Code
//!
//! `unsafe` is confined to the mapping layer: creating the shared mapping and
//! casting its interior to `AtomicU64` cells. Each site documents its
//! alignment and provenance argument. The rest of the crate is safe Rust.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod core;
pub mod error;
pub mod filter;
pub mod hash;
pub mod mmap;

pub use builder::ShmBloomFilterBuilder;
pub use self::core::{compute_magic, MagicDivisor};
pub use error::{Result, ShmBloomError};
pub use filter::ShmBloomFilter;
pub use hash::{BloomHasher, DefaultBloomHasher};

/// Commonly used types, importable in one line.
///
/// ```
/// use shmbloom::prelude::*;
/// ```
pub mod prelude {
    pub use crate::builder::ShmBloomFilterBuilder;
    pub use crate::error::{Result, ShmBloomError};
    pub use crate::filter::ShmBloomFilter;
    pub use crate::hash::{BloomHasher, DefaultBloomHasher};
}
