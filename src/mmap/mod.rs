//! Persistence: the on-disk layout and the mapped shared region.
//!
//! # Module Organization
//!
//! ```text
//! mmap/
//! ├── header.rs  - Fixed-offset on-disk header codec
//! ├── region.rs  - SharedRegion: flock'd init/validate, mapping, bit engine
//! └── mod.rs     - This file (public API)
//! ```

pub mod header;
pub mod region;

pub use header::Header;
pub use region::SharedRegion;
