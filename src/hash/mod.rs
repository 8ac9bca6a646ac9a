//! Hashing: caller-side item hashing and the engine-side probe chain.
//!
//! Two distinct concerns live here, split the same way the engine splits
//! them at its API boundary:
//!
//! - [`hasher`] turns application items into 64-bit seeds. This is the
//!   injected capability: the engine itself never sees the original value,
//!   and callers with their own hashing can bypass this module entirely via
//!   the filter's `*_hash` methods.
//! - [`probe`] expands one seed into the deterministic chain of probe
//!   values that address individual bits.
//!
//! # Module Structure
//!
//! ```text
//! hash/
//! ├── hasher.rs  - BloomHasher trait, Xxh3Hasher (default), StdHasher
//! ├── probe.rs   - mix64 avalanche finalizer + ProbeSequence
//! └── mod.rs     - This file (public API)
//! ```

pub mod hasher;
pub mod probe;

pub use hasher::{BloomHasher, StdHasher, Xxh3Hasher};
pub use probe::{mix64, ProbeSequence};

/// Type alias for the default hasher used by shared filters.
///
/// Provides a stable name independent of the concrete implementation
/// (currently [`Xxh3Hasher`]).
pub type DefaultBloomHasher = Xxh3Hasher;
