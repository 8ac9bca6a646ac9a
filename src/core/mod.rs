//! Pure derived-parameter math.
//!
//! Everything in this module is side-effect free and process-local: the
//! magic-divisor derivation and the `(capacity, error_rate)` → geometry
//! formulas. The persistence layer in [`crate::mmap`] calls into here on
//! both the create and the reopen path so that every process mapping the
//! same file agrees on probe count, bit array length, and divisor constants.
//!
//! # Module Organization
//!
//! ```text
//! core/
//! ├── magic.rs   - Division-free "magic number" remainder constants
//! ├── params.rs  - Probe count, bit geometry, FilterParams
//! └── mod.rs     - This file (public API)
//! ```

pub mod magic;
pub mod params;

pub use magic::{compute_magic, MagicDivisor};
pub use params::FilterParams;
