//! Derived filter parameters.
//!
//! Every runtime parameter of a shared filter — probe count, bit array
//! geometry, magic divisor constants — is a pure function of
//! `(capacity, error_rate)`. Nothing derived is ever persisted: the creating
//! process and every reopening process must recompute identical values from
//! the two stored inputs, otherwise they would disagree about where probe
//! bits live. The formulas here are therefore deterministic and shared by
//! both paths.
//!
//! # Formulas
//!
//! - probes: `k = ceil(log2(1 / ε))`
//! - bits:   `m = ceil(2n·|ln ε|) / (ln 2)²`, rounded up to a multiple of 64

use crate::core::magic::{compute_magic, MagicDivisor};
use crate::error::{Result, ShmBloomError};
use std::f64::consts::LN_2;

/// Mathematical constant: (ln 2)² ≈ 0.4804530139182014.
const LN2_SQUARED: f64 = LN_2 * LN_2;

/// Calculate the number of probe bits per item for a target error rate.
///
/// Implements `k = ceil(log2(1 / error_rate))`.
///
/// # Arguments
///
/// * `error_rate` - Target false positive rate, must be in (0, 1)
///
/// # Returns
///
/// * `Ok(u32)` - Probe count, at least 1
/// * `Err(ShmBloomError::InvalidErrorRate)` - If the rate is out of bounds
///
/// # Examples
///
/// ```
/// use shmbloom::core::params::probe_count;
///
/// assert_eq!(probe_count(0.01).unwrap(), 7);       // ceil(log2(100))
/// assert_eq!(probe_count(1.0 / 128.0).unwrap(), 7); // log2(128) = 7
/// assert!(probe_count(0.0).is_err());
/// assert!(probe_count(1.0).is_err());
/// ```
pub fn probe_count(error_rate: f64) -> Result<u32> {
    if error_rate.is_nan() || error_rate <= 0.0 || error_rate >= 1.0 {
        return Err(ShmBloomError::invalid_error_rate(error_rate));
    }
    Ok((1.0 / error_rate).log2().ceil() as u32)
}

/// Calculate the bit array size for a capacity and error rate.
///
/// The raw estimate `ceil(2n·|ln ε|) / (ln 2)²` is rounded up to the next
/// multiple of 64 so the array is always a whole number of words. The result
/// is deliberately reproduced bit-for-bit on every open (see module docs);
/// do not "simplify" the floating point here.
///
/// # Arguments
///
/// * `capacity` - Number of insertions before the filter saturates
/// * `error_rate` - Target false positive rate, must be in (0, 1)
///
/// # Examples
///
/// ```
/// use shmbloom::core::params::required_bits;
///
/// let bits = required_bits(10, 0.01);
/// assert_eq!(bits, 256);
/// assert_eq!(bits % 64, 0);
/// ```
#[must_use]
pub fn required_bits(capacity: u64, error_rate: f64) -> u64 {
    let mut bits = ((2.0 * capacity as f64 * error_rate.ln().abs()).ceil() / LN2_SQUARED) as u64;
    if bits % 64 != 0 {
        bits += 64 - bits % 64;
    }
    bits
}

/// The complete derived parameter set for one filter.
///
/// Process-local and immutable after construction. Only `capacity` and
/// `error_rate` are ever written to disk; everything else is recomputed on
/// each open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    /// Number of insertions before the saturation counter triggers a reset.
    pub capacity: u64,
    /// Target false positive rate in (0, 1).
    pub error_rate: f64,
    /// Probe bits set/tested per item.
    pub probes: u32,
    /// Bit array length in 64-bit words.
    pub words: u64,
    /// Multiply-and-shift constants for `n mod (words * 64)`.
    pub divisor: MagicDivisor,
}

impl FilterParams {
    /// Derive the full parameter set from the two persisted inputs.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Must be > 0
    /// * `error_rate` - Must be in (0, 1)
    ///
    /// # Errors
    ///
    /// - [`ShmBloomError::InvalidCapacity`] if `capacity == 0`
    /// - [`ShmBloomError::InvalidErrorRate`] if the rate is out of bounds
    ///
    /// # Examples
    ///
    /// ```
    /// use shmbloom::core::params::FilterParams;
    ///
    /// let params = FilterParams::derive(1000, 1.0 / 128.0).unwrap();
    /// assert_eq!(params.probes, 7);
    /// assert_eq!(params.words * 64, params.bit_len());
    /// ```
    pub fn derive(capacity: u64, error_rate: f64) -> Result<Self> {
        if capacity == 0 {
            return Err(ShmBloomError::invalid_capacity(capacity));
        }
        let probes = probe_count(error_rate)?;
        let words = required_bits(capacity, error_rate) / 64;
        let divisor = compute_magic(words * 64, 64);
        Ok(Self {
            capacity,
            error_rate,
            probes,
            words,
            divisor,
        })
    }

    /// Total bit array length in bits.
    #[inline]
    #[must_use]
    pub fn bit_len(&self) -> u64 {
        self.words * 64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_count_common_rates() {
        assert_eq!(probe_count(0.5).unwrap(), 1);
        assert_eq!(probe_count(0.1).unwrap(), 4);
        assert_eq!(probe_count(0.01).unwrap(), 7);
        assert_eq!(probe_count(0.001).unwrap(), 10);
        assert_eq!(probe_count(1.0 / 128.0).unwrap(), 7);
        assert_eq!(probe_count(1.0 / 256.0).unwrap(), 8);
    }

    #[test]
    fn test_probe_count_rejects_out_of_bounds() {
        for rate in [0.0, 1.0, -0.5, 2.0, f64::NAN] {
            let err = probe_count(rate).unwrap_err();
            assert!(matches!(err, ShmBloomError::InvalidErrorRate { .. }));
        }
    }

    #[test]
    fn test_required_bits_word_aligned() {
        for capacity in [1u64, 10, 100, 1000, 123_456] {
            for rate in [0.5, 0.1, 0.01, 1.0 / 128.0, 0.001] {
                let bits = required_bits(capacity, rate);
                assert_eq!(bits % 64, 0, "cap={} rate={}", capacity, rate);
                assert!(bits >= 64);
            }
        }
    }

    #[test]
    fn test_required_bits_concrete() {
        // capacity=10, e=0.01: ceil(2*10*4.60517) = 93, / (ln2)^2 = 193,
        // rounded up to 256.
        assert_eq!(required_bits(10, 0.01), 256);
    }

    #[test]
    fn test_required_bits_grows_with_capacity() {
        assert!(required_bits(10_000, 0.01) > required_bits(1000, 0.01));
        assert!(required_bits(1000, 0.001) > required_bits(1000, 0.01));
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = FilterParams::derive(1000, 1.0 / 128.0).unwrap();
        let b = FilterParams::derive(1000, 1.0 / 128.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_derive_validates_inputs() {
        assert!(matches!(
            FilterParams::derive(0, 0.01).unwrap_err(),
            ShmBloomError::InvalidCapacity { .. }
        ));
        assert!(matches!(
            FilterParams::derive(100, 0.0).unwrap_err(),
            ShmBloomError::InvalidErrorRate { .. }
        ));
    }

    #[test]
    fn test_derive_divisor_matches_geometry() {
        let params = FilterParams::derive(10, 0.01).unwrap();
        assert_eq!(params.words, 4);
        assert_eq!(params.probes, 7);
        let d = params.bit_len();
        for n in [0u64, 1, 255, 256, 257, 99_999, u64::MAX] {
            assert_eq!(params.divisor.divide(n), n / d);
            assert_eq!(params.divisor.remainder(n, d), n % d);
        }
    }
}
