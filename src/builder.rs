//! Builder for configuring shared filters before opening them.
//!
//! [`ShmBloomFilterBuilder`] exists for the common case of "open this file
//! with mostly-default parameters": it carries the historical defaults
//! (capacity 1000, error rate 1/128) and lets callers override only what
//! they care about.
//!
//! # Examples
//!
//! ```
//! use shmbloom::ShmBloomFilterBuilder;
//! # let dir = tempfile::tempdir().unwrap();
//! # let path = dir.path().join("seen.bloom");
//!
//! let filter = ShmBloomFilterBuilder::new(&path)
//!     .capacity(50_000)
//!     .error_rate(0.001)
//!     .build::<str>()
//!     .unwrap();
//!
//! filter.add("url:https://example.com/");
//! assert!(filter.contains("url:https://example.com/"));
//! ```

use crate::error::Result;
use crate::filter::ShmBloomFilter;
use crate::hash::{BloomHasher, DefaultBloomHasher};
use std::fs::File;
use std::path::PathBuf;

/// Default capacity when the builder is not told otherwise.
pub const DEFAULT_CAPACITY: u64 = 1000;

/// Default error rate when the builder is not told otherwise.
pub const DEFAULT_ERROR_RATE: f64 = 1.0 / 128.0;

enum Source {
    Path(PathBuf),
    Descriptor(File),
}

/// Fluent configuration for opening or creating a shared filter.
///
/// Parameters set here only matter when the backing file is empty; reopening
/// an existing filter always adopts the stored parameters.
pub struct ShmBloomFilterBuilder {
    source: Source,
    capacity: u64,
    error_rate: f64,
}

impl ShmBloomFilterBuilder {
    /// Start a builder backed by a filesystem path (created if absent).
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::Path(path.into()),
            capacity: DEFAULT_CAPACITY,
            error_rate: DEFAULT_ERROR_RATE,
        }
    }

    /// Start a builder backed by an already-open file handle.
    ///
    /// The handle is consumed; it is duplicated again internally at build
    /// time so the filter owns an independent descriptor.
    #[must_use]
    pub fn from_file(file: File) -> Self {
        Self {
            source: Source::Descriptor(file),
            capacity: DEFAULT_CAPACITY,
            error_rate: DEFAULT_ERROR_RATE,
        }
    }

    /// Insertions before the automatic reset (default 1000).
    #[must_use]
    pub fn capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Target false positive rate in (0, 1) (default 1/128).
    #[must_use]
    pub fn error_rate(mut self, error_rate: f64) -> Self {
        self.error_rate = error_rate;
        self
    }

    /// Open the filter with the default hasher.
    ///
    /// # Errors
    ///
    /// Everything [`ShmBloomFilter::open`] can return.
    pub fn build<T: ?Sized>(self) -> Result<ShmBloomFilter<T>> {
        self.build_with_hasher(DefaultBloomHasher::new())
    }

    /// Open the filter with an explicit hasher.
    pub fn build_with_hasher<T: ?Sized, H: BloomHasher>(
        self,
        hasher: H,
    ) -> Result<ShmBloomFilter<T, H>> {
        match self.source {
            Source::Path(path) => {
                ShmBloomFilter::open_with_hasher(path, self.capacity, self.error_rate, hasher)
            }
            Source::Descriptor(file) => {
                ShmBloomFilter::from_file_with_hasher(&file, self.capacity, self.error_rate, hasher)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::StdHasher;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let dir = tempdir().unwrap();
        let filter = ShmBloomFilterBuilder::new(dir.path().join("d.bloom"))
            .build::<u64>()
            .unwrap();
        assert_eq!(filter.capacity(), DEFAULT_CAPACITY);
        assert_eq!(filter.error_rate(), DEFAULT_ERROR_RATE);
        assert_eq!(filter.probes(), 7);
    }

    #[test]
    fn test_overrides() {
        let dir = tempdir().unwrap();
        let filter = ShmBloomFilterBuilder::new(dir.path().join("o.bloom"))
            .capacity(42)
            .error_rate(0.25)
            .build::<u64>()
            .unwrap();
        assert_eq!(filter.capacity(), 42);
        assert_eq!(filter.error_rate(), 0.25);
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let dir = tempdir().unwrap();
        let result = ShmBloomFilterBuilder::new(dir.path().join("bad.bloom"))
            .error_rate(2.0)
            .build::<u64>();
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_source() {
        let dir = tempdir().unwrap();
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(dir.path().join("fd.bloom"))
            .unwrap();
        let filter = ShmBloomFilterBuilder::from_file(file)
            .capacity(10)
            .build::<u64>()
            .unwrap();
        filter.add(&3);
        assert!(filter.contains(&3));
    }

    #[test]
    fn test_custom_hasher() {
        let dir = tempdir().unwrap();
        let filter = ShmBloomFilterBuilder::new(dir.path().join("h.bloom"))
            .build_with_hasher::<u64, _>(StdHasher::with_seed(9))
            .unwrap();
        filter.add(&5);
        assert!(filter.contains(&5));
    }
}
