//! Error types for shmbloom operations.
//!
//! All fallible operations in this crate return [`Result<T>`] with
//! [`ShmBloomError`] as the error type. Errors are surfaced synchronously to
//! the caller of the triggering operation; nothing is retried internally, and
//! construction either returns a fully valid handle or no handle at all.
//!
//! # Error Propagation
//!
//! ```
//! use shmbloom::{Result, ShmBloomError};
//! use shmbloom::core::params::probe_count;
//!
//! fn probes_for(rate: f64) -> Result<u32> {
//!     let k = probe_count(rate)?;
//!     Ok(k)
//! }
//! # assert!(probes_for(0.01).is_ok());
//! # assert!(probes_for(1.5).is_err());
//! ```

use std::fmt;

/// Result type alias for shmbloom operations.
pub type Result<T> = std::result::Result<T, ShmBloomError>;

/// Errors that can occur while constructing or reopening a shared filter.
///
/// Steady-state operations (`add`, `contains`, `clear`, `population`, `len`)
/// are infallible; every variant here is surfaced at construction or reopen
/// time.
///
/// # Design Notes
/// - `Clone` + `PartialEq` enable testing and error comparison
/// - I/O failures are captured as `{context, message}` strings so the enum
///   stays comparable and cloneable
#[derive(Debug, Clone, PartialEq)]
pub enum ShmBloomError {
    /// Error rate outside the open interval (0, 1).
    ///
    /// Bloom filters require 0 < ε < 1: ε = 0 needs infinite memory and
    /// ε = 1 accepts everything. The probe count `ceil(log2(1/ε))` is
    /// undefined outside that range.
    InvalidErrorRate {
        /// The invalid error rate that was provided.
        rate: f64,
    },

    /// Capacity of zero was requested.
    ///
    /// A zero capacity derives a zero-length bit array and a counter that
    /// can never hold its reset invariant.
    InvalidCapacity {
        /// The invalid capacity that was provided.
        capacity: u64,
    },

    /// The backing file exists but is not a filter this crate understands.
    ///
    /// Raised on reopen when the magic tag mismatches, the header is
    /// truncated, or the file is shorter than the geometry its own header
    /// implies. The file is treated as foreign and not touched further.
    Format {
        /// Why the file was rejected.
        reason: String,
    },

    /// File open, duplication, write, or mapping failure.
    ///
    /// Carries the path or descriptor context alongside the underlying OS
    /// error message.
    Io {
        /// What was being done (typically the path involved).
        context: String,
        /// The underlying OS error, rendered as a string.
        message: String,
    },
}

impl fmt::Display for ShmBloomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidErrorRate { rate } => {
                write!(
                    f,
                    "Error rate {} is out of bounds. Must be in range (0, 1).",
                    rate
                )
            }
            Self::InvalidCapacity { capacity } => {
                write!(
                    f,
                    "Invalid capacity: {}. Capacity must be greater than 0.",
                    capacity
                )
            }
            Self::Format { reason } => {
                write!(f, "Not a shared-memory Bloom filter file: {}.", reason)
            }
            Self::Io { context, message } => {
                write!(f, "I/O error ({}): {}.", context, message)
            }
        }
    }
}

impl std::error::Error for ShmBloomError {}

impl ShmBloomError {
    /// Create an `InvalidErrorRate` error.
    #[must_use]
    pub fn invalid_error_rate(rate: f64) -> Self {
        Self::InvalidErrorRate { rate }
    }

    /// Create an `InvalidCapacity` error.
    #[must_use]
    pub fn invalid_capacity(capacity: u64) -> Self {
        Self::InvalidCapacity { capacity }
    }

    /// Create a `Format` error with a descriptive reason.
    #[must_use]
    pub fn format(reason: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
        }
    }

    /// Create an `Io` error from an [`std::io::Error`] and its context.
    #[must_use]
    pub fn io(context: impl Into<String>, err: &std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_error_rate() {
        let err = ShmBloomError::invalid_error_rate(1.5);
        let display = format!("{err}");
        assert!(display.contains("1.5"));
        assert!(display.contains("(0, 1)"));
        assert!(display.ends_with('.'));
    }

    #[test]
    fn test_error_display_invalid_capacity() {
        let err = ShmBloomError::invalid_capacity(0);
        let display = format!("{err}");
        assert!(display.contains('0'));
        assert!(display.contains("greater than 0"));
    }

    #[test]
    fn test_error_display_format() {
        let err = ShmBloomError::format("magic tag mismatch");
        let display = format!("{err}");
        assert!(display.contains("magic tag mismatch"));
        assert!(display.contains("Bloom filter file"));
    }

    #[test]
    fn test_error_display_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ShmBloomError::io("/tmp/filter.bloom", &io);
        let display = format!("{err}");
        assert!(display.contains("/tmp/filter.bloom"));
        assert!(display.contains("denied"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let _err: Box<dyn std::error::Error> = Box::new(ShmBloomError::invalid_capacity(0));
    }

    #[test]
    fn test_error_clone_and_eq() {
        let err1 = ShmBloomError::format("truncated header");
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn inner() -> Result<()> {
            Err(ShmBloomError::invalid_error_rate(0.0))
        }

        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
