//! The process-shared Bloom filter.
//!
//! [`ShmBloomFilter`] composes the persistence layer, the probe chain, and
//! the saturation counter into the public membership API. A filter handle is
//! cheap state: the mapping plus a handful of derived parameters; all real
//! data lives in the file, shared with every other process mapping it.
//!
//! # Concurrency
//!
//! Every operation takes `&self`. `add` and `contains` are lock-free and
//! allocation-free: a counter decrement plus `k` atomic bit operations. A
//! concurrent `contains` can observe a partial insert (some probe bits set,
//! others not yet) — accepted behavior, not a bug.
//!
//! The automatic reset is **not** synchronized: two handles observing an
//! exhausted counter will both clear, and in-flight probe bits can be wiped
//! by a concurrent clear. The filter is eventually consistent with itself;
//! callers needing a stronger guarantee must coordinate externally.
//!
//! # Examples
//!
//! ```
//! use shmbloom::ShmBloomFilter;
//! # let dir = tempfile::tempdir().unwrap();
//! # let path = dir.path().join("sessions.bloom");
//!
//! # fn main_inner(path: &std::path::Path) -> shmbloom::Result<()> {
//! let filter: ShmBloomFilter<str> = ShmBloomFilter::open(path, 1000, 0.01)?;
//!
//! filter.add("session:alice");
//! assert!(filter.contains("session:alice"));
//! assert!(!filter.contains("session:mallory"));
//! # Ok(())
//! # }
//! # main_inner(&path).unwrap();
//! ```

use crate::core::params::FilterParams;
use crate::error::{Result, ShmBloomError};
use crate::hash::probe::ProbeSequence;
use crate::hash::{BloomHasher, DefaultBloomHasher};
use crate::mmap::SharedRegion;
use std::fs::{File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::path::Path;

/// Convert a hashable item to bytes for the injected [`BloomHasher`].
///
/// Bridges generic `T: Hash` to the byte-oriented hasher API using the
/// standard library's fixed-key `DefaultHasher`, which is deterministic
/// across processes — a hard requirement for a filter shared between them.
#[inline]
fn hash_item_to_bytes<T: Hash + ?Sized>(item: &T) -> [u8; 8] {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    item.hash(&mut hasher);
    hasher.finish().to_le_bytes()
}

/// A Bloom filter whose bit array lives in a memory-mapped file.
///
/// Generic over the item type `T` and the injected hasher `H`. All handles
/// opened on the same file — in this process or any other — observe the
/// same bits and the same saturation counter.
///
/// # Saturation
///
/// Each insert decrements a shared counter that starts at `capacity`. When
/// it runs out the filter clears itself and the counter snaps back to
/// `capacity`, bounding the false positive rate over the filter's lifetime
/// at the cost of forgetting everything inserted so far. [`Self::add`]
/// returns `true` exactly when its call triggered that reset.
pub struct ShmBloomFilter<T: ?Sized, H: BloomHasher = DefaultBloomHasher> {
    region: SharedRegion,
    hasher: H,
    _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized> ShmBloomFilter<T, DefaultBloomHasher> {
    /// Open or create a filter at a filesystem path with the default hasher.
    ///
    /// The file is created if absent. If it already holds a filter, the
    /// stored `(capacity, error_rate)` win and the arguments are ignored;
    /// every derived parameter is recomputed from the stored pair.
    ///
    /// # Arguments
    ///
    /// * `path` - Backing file, created if absent
    /// * `capacity` - Insertions before auto-reset (used only on creation)
    /// * `error_rate` - Target false positive rate in (0, 1) (creation only)
    ///
    /// # Errors
    ///
    /// Configuration, format, or I/O errors as described in
    /// [`SharedRegion::open_or_create`]; I/O errors carry the path.
    pub fn open(path: impl AsRef<Path>, capacity: u64, error_rate: f64) -> Result<Self> {
        Self::open_with_hasher(path, capacity, error_rate, DefaultBloomHasher::new())
    }

    /// Open or create a filter from an already-open file handle.
    ///
    /// The handle is duplicated internally, so the caller's descriptor
    /// lifetime stays independent of the filter's.
    pub fn from_file(file: &File, capacity: u64, error_rate: f64) -> Result<Self> {
        Self::from_file_with_hasher(file, capacity, error_rate, DefaultBloomHasher::new())
    }
}

impl<T: ?Sized, H: BloomHasher> ShmBloomFilter<T, H> {
    /// [`Self::open`] with an explicit hasher.
    ///
    /// Every process opening the same file must inject an identical hasher,
    /// or membership answers will disagree.
    pub fn open_with_hasher(
        path: impl AsRef<Path>,
        capacity: u64,
        error_rate: f64,
        hasher: H,
    ) -> Result<Self> {
        let path = path.as_ref();
        let context = path.display().to_string();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(|e| ShmBloomError::io(&*context, &e))?;
        let region = SharedRegion::open_or_create(file, capacity, error_rate, &context)?;
        Ok(Self {
            region,
            hasher,
            _marker: PhantomData,
        })
    }

    /// [`Self::from_file`] with an explicit hasher.
    pub fn from_file_with_hasher(
        file: &File,
        capacity: u64,
        error_rate: f64,
        hasher: H,
    ) -> Result<Self> {
        let dup = file
            .try_clone()
            .map_err(|e| ShmBloomError::io("<borrowed descriptor>", &e))?;
        let region =
            SharedRegion::open_or_create(dup, capacity, error_rate, "<borrowed descriptor>")?;
        Ok(Self {
            region,
            hasher,
            _marker: PhantomData,
        })
    }

    /// Insert an item. Returns `true` if this call triggered an auto-reset.
    ///
    /// Sets `probes()` bits addressed by the item's probe chain. Lock-free;
    /// no ordering across the individual probe bits.
    pub fn add(&self, item: &T) -> bool
    where
        T: Hash,
    {
        self.add_hash(self.hash_item(item))
    }

    /// Query membership for an item.
    ///
    /// `true` means "probably present" (false positives at roughly the
    /// configured rate); `false` means "definitely not inserted since the
    /// last reset".
    #[must_use]
    pub fn contains(&self, item: &T) -> bool
    where
        T: Hash,
    {
        self.contains_hash(self.hash_item(item))
    }

    /// Insert by precomputed 64-bit seed — the raw engine boundary.
    ///
    /// For callers that hash items themselves (or whose hashing can fail
    /// and must be resolved before the engine is involved).
    ///
    /// Returns `true` if this call observed the counter exhausted (or
    /// wrapped below zero by a concurrent racer) and performed the reset.
    pub fn add_hash(&self, seed: u64) -> bool {
        let params = self.region.params();
        let count = self.region.counter_fetch_sub();
        let cleared = count == 0 || count > params.capacity;
        if cleared {
            self.region.clear_all();
        }
        for probe in ProbeSequence::new(seed, params.probes) {
            self.region.set_probe(probe);
        }
        cleared
    }

    /// Query membership by precomputed 64-bit seed.
    ///
    /// Short-circuits on the first unset probe bit.
    #[must_use]
    pub fn contains_hash(&self, seed: u64) -> bool {
        let params = self.region.params();
        ProbeSequence::new(seed, params.probes).all(|probe| self.region.test_probe(probe))
    }

    /// Zero the bit array and restore the counter to `capacity`.
    ///
    /// Not atomic as a whole; see the module docs for the multi-writer
    /// clear race.
    pub fn clear(&self) {
        self.region.clear_all();
    }

    /// Number of set bits in the bit array.
    #[must_use]
    pub fn population(&self) -> u64 {
        self.region.population()
    }

    /// Approximate number of items inserted since the last reset.
    ///
    /// `capacity - counter`, saturating at zero during the momentary window
    /// in which a racing decrement has pushed the counter below zero. Can
    /// read stale relative to concurrent inserts.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.capacity().saturating_sub(self.region.counter_load())
    }

    /// Whether no bit is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.population() == 0
    }

    /// Insertions before the saturation counter triggers a reset.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.region.params().capacity
    }

    /// Configured false positive rate.
    #[inline]
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        self.region.params().error_rate
    }

    /// Probe bits set/tested per item.
    #[inline]
    #[must_use]
    pub fn probes(&self) -> u32 {
        self.region.params().probes
    }

    /// Bit array length in bits (always a multiple of 64).
    #[inline]
    #[must_use]
    pub fn bit_len(&self) -> u64 {
        self.region.params().bit_len()
    }

    /// The full derived parameter set.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &FilterParams {
        self.region.params()
    }

    #[inline]
    fn hash_item(&self, item: &T) -> u64
    where
        T: Hash,
    {
        self.hasher.hash_bytes(&hash_item_to_bytes(item))
    }
}

impl<T: ?Sized, H: BloomHasher> std::fmt::Debug for ShmBloomFilter<T, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShmBloomFilter")
            .field("capacity", &self.capacity())
            .field("error_rate", &self.error_rate())
            .field("probes", &self.probes())
            .field("bit_len", &self.bit_len())
            .finish()
    }
}
