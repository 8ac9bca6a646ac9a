//! Division-free "magic number" unsigned division.
//!
//! Computing a probe's bit offset requires `n mod d` where `d` is the bit
//! array length. A hardware divide in that hot path costs 20-40 cycles; this
//! module precomputes constants per fixed `d` so the quotient can be obtained
//! with a widening multiply and a couple of shifts, and the remainder as
//! `n - (n / d) * d`.
//!
//! The derivation is the classic unsigned-division-by-constant search
//! (binary long division for a minimal multiplier/shift pair). Even divisors
//! are halved and recursed with an extra pre-shift; odd divisors that do not
//! admit a round-up magic fall back to the round-down multiplier with an
//! incremented numerator. All intermediate arithmetic deliberately wraps at
//! 64 bits, matching the reference derivation.
//!
//! Correctness here is load-bearing and easy to get subtly wrong (off-by-one
//! shift amounts, the missing increment case), so [`compute_magic`] is public
//! and independently testable.
//!
//! # Examples
//!
//! ```
//! use shmbloom::core::magic::compute_magic;
//!
//! let magic = compute_magic(960, 64);
//! for n in [0u64, 1, 959, 960, 961, 123_456_789, u64::MAX] {
//!     assert_eq!(magic.divide(n), n / 960);
//! }
//! ```

/// Precomputed multiply-and-shift constants for dividing by a fixed divisor.
///
/// For divisor `d` and any unsigned 64-bit `n`,
/// `(((n + increment) >> pre_shift) * multiplier) >> 64 >> post_shift`
/// equals `n / d` exactly, with the increment added saturating so the
/// all-ones dividend stays exact. When `multiplier == 1` the widening
/// multiply is skipped entirely and the quotient is a pure shift
/// (power-of-two divisors reduce to this).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicDivisor {
    /// The "magic number" multiplier.
    pub multiplier: u64,
    /// Shift applied to the dividend before multiplying.
    pub pre_shift: u32,
    /// Shift applied after taking the high 64 bits of the product.
    pub post_shift: u32,
    /// Whether the dividend is incremented by one before the pre-shift.
    pub increment: bool,
}

impl MagicDivisor {
    /// Compute `n / d` for the divisor these constants were derived from.
    ///
    /// # Arguments
    ///
    /// * `n` - Unsigned dividend
    ///
    /// # Returns
    ///
    /// The exact quotient `n / d`.
    #[inline(always)]
    #[must_use]
    pub fn divide(&self, n: u64) -> u64 {
        // The increment must not wrap at the all-ones dividend; saturating
        // the add keeps the quotient exact there.
        let mut q = n.saturating_add(u64::from(self.increment)) >> self.pre_shift;
        if self.multiplier != 1 {
            q = ((u128::from(q) * u128::from(self.multiplier)) >> 64) as u64;
        }
        q >> self.post_shift
    }

    /// Compute `n mod d` given the divisor these constants were derived from.
    ///
    /// # Arguments
    ///
    /// * `n` - Unsigned dividend
    /// * `d` - The original divisor passed to [`compute_magic`]
    ///
    /// # Returns
    ///
    /// The exact remainder `n mod d`.
    #[inline(always)]
    #[must_use]
    pub fn remainder(&self, n: u64, d: u64) -> u64 {
        n - self.divide(n).wrapping_mul(d)
    }
}

/// Derive multiply-and-shift constants for unsigned division by `d`.
///
/// `num_bits` is the effective width of dividends, 64 for full-width `u64`
/// division; the recursion for even divisors passes reduced widths. The
/// result divides exactly for every representable dividend.
///
/// # Arguments
///
/// * `d` - Divisor, must be > 0
/// * `num_bits` - Effective dividend width in bits (1..=64)
///
/// # Returns
///
/// Constants satisfying the [`MagicDivisor`] contract.
///
/// # Panics
///
/// Panics if `d == 0`.
#[must_use]
pub fn compute_magic(d: u64, num_bits: u32) -> MagicDivisor {
    assert!(d > 0, "divisor must be greater than 0");

    let extra_shift = 64 - num_bits;
    let initial_power_of_2 = 1u64 << 63;

    let mut quotient = initial_power_of_2 / d;
    let mut remainder = initial_power_of_2 % d;

    // Bit length of d: floor(log2 d) + 1.
    let ceil_log_2_d = 64 - d.leading_zeros();

    let mut down_multiplier = 0u64;
    let mut down_exponent = 0u32;
    let mut has_magic_down = false;

    let mut exponent = 0u32;
    loop {
        // One step of binary long division of 2^(64 + exponent) by d.
        if remainder >= d - remainder {
            quotient = quotient.wrapping_mul(2).wrapping_add(1);
            remainder = remainder.wrapping_mul(2).wrapping_sub(d);
        } else {
            quotient = quotient.wrapping_mul(2);
            remainder = remainder.wrapping_mul(2);
        }

        if exponent + extra_shift >= ceil_log_2_d
            || d - remainder <= 1u64 << (exponent + extra_shift)
        {
            break;
        }

        if !has_magic_down && remainder <= 1u64 << (exponent + extra_shift) {
            has_magic_down = true;
            down_multiplier = quotient;
            down_exponent = exponent;
        }

        exponent += 1;
    }

    if exponent < ceil_log_2_d {
        // Round-up multiplier fits: the common case.
        MagicDivisor {
            multiplier: quotient.wrapping_add(1),
            pre_shift: 0,
            post_shift: exponent,
            increment: false,
        }
    } else if d & 1 != 0 {
        // Odd divisor with no round-up magic: round-down multiplier with an
        // incremented numerator.
        MagicDivisor {
            multiplier: down_multiplier,
            pre_shift: 0,
            post_shift: down_exponent,
            increment: true,
        }
    } else {
        // Even divisor: strip trailing zeros, recurse on the odd part with a
        // correspondingly narrower dividend, and pre-shift the difference.
        let pre_shift = d.trailing_zeros();
        let shifted_d = d >> pre_shift;
        let mut result = compute_magic(shifted_d, num_bits - pre_shift);
        result.pre_shift = pre_shift;
        result
    }
}
