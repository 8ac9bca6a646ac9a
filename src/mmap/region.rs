//! The mapped shared region: persistence protocol and bit array engine.
//!
//! [`SharedRegion`] owns one read-write shared mapping of a filter file and
//! exposes the lock-free primitives everything else is built from: atomic
//! single-bit set, plain single-bit test, whole-array clear, popcount, and
//! the saturation counter cell.
//!
//! # Initialize-vs-reopen protocol
//!
//! All header work happens under an exclusive advisory `flock` so two
//! processes cannot race to initialize the same empty file. The lock is
//! released before mapping and is never held during steady-state operations.
//!
//! - Empty file (size 0): write the header with the counter at full budget,
//!   extend with a zero-filled bit array, map.
//! - Non-empty file: validate the magic tag, read back
//!   `(capacity, error_rate)` — the caller's requested values are ignored in
//!   favor of what is on disk — and recompute every derived parameter.
//!   Stored derived values are never trusted because none are stored.
//!
//! # Concurrency
//!
//! The mapping is `MAP_SHARED`: the bit array and counter are the only
//! mutable state, visible to every process mapping the same file. Single-bit
//! sets are atomic ORs; there is no ordering guarantee across the probe bits
//! of one logical insert, and [`SharedRegion::clear_all`] is not atomic as a
//! whole (see the method docs).

use crate::core::params::FilterParams;
use crate::error::{Result, ShmBloomError};
use crate::mmap::header::{self, Header, BITS_OFFSET, COUNTER_OFFSET};
use fs2::FileExt;
use memmap2::{MmapMut, MmapOptions};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicU64, Ordering};

/// RAII exclusive advisory lock on the backing file.
///
/// Unlocks on drop so every error path out of the header protocol releases
/// the lock.
struct FlockGuard<'a> {
    file: &'a File,
}

impl<'a> FlockGuard<'a> {
    fn lock_exclusive(file: &'a File, context: &str) -> Result<Self> {
        file.lock_exclusive()
            .map_err(|e| ShmBloomError::io(context, &e))?;
        Ok(Self { file })
    }
}

impl Drop for FlockGuard<'_> {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(self.file);
    }
}

/// One process's read-write mapping of a shared filter file.
///
/// Dropping a `SharedRegion` unmaps the region and closes its (duplicated)
/// descriptor; other processes still holding mappings of the same file are
/// unaffected.
pub struct SharedRegion {
    params: FilterParams,
    mmap: MmapMut,
    // Held so teardown closes the descriptor after unmapping.
    _file: File,
}

impl std::fmt::Debug for SharedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRegion")
            .field("params", &self.params)
            .field("len", &self.mmap.len())
            .finish()
    }
}

impl SharedRegion {
    /// Establish or validate the on-disk layout and map it.
    ///
    /// Takes ownership of `file` (callers exposing a borrowed-descriptor API
    /// duplicate first). `context` labels I/O errors, typically with the
    /// path.
    ///
    /// # Arguments
    ///
    /// * `file` - Read-write handle to the backing file
    /// * `capacity` - Used only when the file is empty
    /// * `error_rate` - Used only when the file is empty
    /// * `context` - Label attached to I/O errors
    ///
    /// # Errors
    ///
    /// - Configuration errors for an invalid `capacity`/`error_rate` (or for
    ///   out-of-range values read back from disk)
    /// - [`ShmBloomError::Format`] for a magic mismatch, truncated header,
    ///   or a file shorter than the geometry its own header implies
    /// - [`ShmBloomError::Io`] for lock, write, or mapping failures
    ///
    /// No partially initialized handle ever escapes: any failure returns the
    /// error with the lock released and nothing mapped.
    pub fn open_or_create(
        file: File,
        capacity: u64,
        error_rate: f64,
        context: &str,
    ) -> Result<Self> {
        // Reject invalid requested parameters before touching the file.
        FilterParams::derive(capacity, error_rate)?;

        let params = {
            let guard = FlockGuard::lock_exclusive(&file, context)?;

            let len = file
                .metadata()
                .map_err(|e| ShmBloomError::io(context, &e))?
                .len();

            let params = if len == 0 {
                Self::initialize(guard.file, capacity, error_rate, context)?
            } else {
                Self::validate(guard.file, len, context)?
            };

            // Guard drops here: the lock is never held while mapped.
            params
        };

        let total = header::file_len(params.words) as usize;
        // SAFETY: the region is a shared file mapping; concurrent mutation
        // by other processes is the entire point and every access below goes
        // through atomics or tolerates torn reads by contract.
        let mmap = unsafe { MmapOptions::new().len(total).map_mut(&file) }
            .map_err(|e| ShmBloomError::io(context, &e))?;

        // Probe addresses are effectively random; read-ahead is wasted work.
        #[cfg(unix)]
        let _ = mmap.advise(memmap2::Advice::Random);

        Ok(Self {
            params,
            mmap,
            _file: file,
        })
    }

    /// Write a fresh header and zero-filled bit array. Caller holds the lock.
    fn initialize(file: &File, capacity: u64, error_rate: f64, context: &str) -> Result<FilterParams> {
        let params = FilterParams::derive(capacity, error_rate)?;
        let head = Header {
            capacity,
            error_rate,
        };
        let mut f = file;
        f.seek(SeekFrom::Start(0))
            .map_err(|e| ShmBloomError::io(context, &e))?;
        f.write_all(&head.encode())
            .map_err(|e| ShmBloomError::io(context, &e))?;
        file.set_len(header::file_len(params.words))
            .map_err(|e| ShmBloomError::io(context, &e))?;
        Ok(params)
    }

    /// Validate an existing header and recompute derived parameters.
    /// Caller holds the lock.
    fn validate(file: &File, len: u64, context: &str) -> Result<FilterParams> {
        let mut buf = [0u8; BITS_OFFSET];
        if len < BITS_OFFSET as u64 {
            return Err(ShmBloomError::format(format!(
                "truncated header ({} bytes, need {})",
                len, BITS_OFFSET
            )));
        }
        let mut f = file;
        f.seek(SeekFrom::Start(0))
            .map_err(|e| ShmBloomError::io(context, &e))?;
        f.read_exact(&mut buf)
            .map_err(|e| ShmBloomError::io(context, &e))?;

        let head = Header::decode(&buf)?;
        let params = FilterParams::derive(head.capacity, head.error_rate)?;

        // Mapping past the end of the file would fault on first touch, so a
        // header whose geometry exceeds the real file length is corrupt.
        let expected = header::file_len(params.words);
        if len < expected {
            return Err(ShmBloomError::format(format!(
                "file is {} bytes but stored parameters imply {}",
                len, expected
            )));
        }
        Ok(params)
    }

    /// The derived parameter set this region was opened with.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// The shared saturation counter cell.
    ///
    /// # Safety of the cast
    ///
    /// The mapping is page aligned and `COUNTER_OFFSET` is a multiple of 8,
    /// so the pointer is valid for `AtomicU64`; the underlying memory is a
    /// writable `MAP_SHARED` region owned by the mapping for `&self`'s
    /// lifetime.
    #[inline]
    fn counter(&self) -> &AtomicU64 {
        unsafe { &*self.mmap.as_ptr().add(COUNTER_OFFSET).cast::<AtomicU64>() }
    }

    /// The bit array as atomic words.
    ///
    /// Same alignment and provenance argument as [`Self::counter`];
    /// `BITS_OFFSET` is 8-byte aligned and the slice stays inside the
    /// mapping by construction (`file_len` sized it).
    #[inline]
    fn bit_words(&self) -> &[AtomicU64] {
        unsafe {
            std::slice::from_raw_parts(
                self.mmap.as_ptr().add(BITS_OFFSET).cast::<AtomicU64>(),
                self.params.words as usize,
            )
        }
    }

    /// Atomically decrement the counter, returning the pre-decrement value.
    ///
    /// Wraps below zero; the caller interprets a value above `capacity` as
    /// the underflow signal.
    #[inline]
    pub fn counter_fetch_sub(&self) -> u64 {
        self.counter().fetch_sub(1, Ordering::Relaxed)
    }

    /// Current counter value. May be stale relative to concurrent inserts.
    #[inline]
    #[must_use]
    pub fn counter_load(&self) -> u64 {
        self.counter().load(Ordering::Relaxed)
    }

    /// Atomically OR a single-bit mask into a word.
    ///
    /// Safe for unsynchronized concurrent callers targeting the same or
    /// different words; the atomic OR rules out lost updates within a word.
    /// Crate-internal: `word_index` is unchecked, and the probe methods are
    /// the only callers that produce in-range indices.
    #[inline]
    pub(crate) fn set_bit(&self, word_index: usize, bit_index: u32) {
        self.bit_words()[word_index].fetch_or(1u64 << (bit_index & 63), Ordering::Release);
    }

    /// Test a single bit with a plain load.
    ///
    /// A concurrent writer may not yet be visible; a spuriously missing
    /// probe bit is within the structure's tolerated error mode.
    #[inline]
    #[must_use]
    pub(crate) fn test_bit(&self, word_index: usize, bit_index: u32) -> bool {
        self.bit_words()[word_index].load(Ordering::Acquire) & (1u64 << (bit_index & 63)) != 0
    }

    /// Set the bit addressed by a probe value.
    ///
    /// `bit = n mod (words * 64)` via the magic divisor — no hardware
    /// divide; word `bit >> 6`, bit-in-word `bit & 63`.
    #[inline]
    pub fn set_probe(&self, n: u64) {
        let bit = self.params.divisor.remainder(n, self.params.bit_len());
        self.set_bit((bit >> 6) as usize, (bit & 63) as u32);
    }

    /// Test the bit addressed by a probe value.
    #[inline]
    #[must_use]
    pub fn test_probe(&self, n: u64) -> bool {
        let bit = self.params.divisor.remainder(n, self.params.bit_len());
        self.test_bit((bit >> 6) as usize, (bit & 63) as u32)
    }

    /// Zero every word and reset the counter to `capacity`.
    ///
    /// **Not atomic as a whole.** Concurrent `set_bit` calls can interleave
    /// with the zeroing pass and just-written probe bits may be wiped; two
    /// processes observing an exhausted counter can both run this. That race
    /// is inherited from the design — steady-state operations take no locks.
    pub fn clear_all(&self) {
        for word in self.bit_words() {
            word.store(0, Ordering::Relaxed);
        }
        self.counter().store(self.params.capacity, Ordering::Relaxed);
    }

    /// Total set bits across the array. Observational only.
    #[must_use]
    pub fn population(&self) -> u64 {
        self.bit_words()
            .iter()
            .map(|w| u64::from(w.load(Ordering::Relaxed).count_ones()))
            .sum()
    }
}
