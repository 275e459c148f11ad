//! 16.16 fixed-point arithmetic.
//!
//! Everything the refresh computes in world space goes through these helpers
//! so results stay bit-identical across platforms.

/// Signed 16.16 fixed-point number.
pub type Fixed = i32;

pub const FRACBITS: i32 = 16;
pub const FRACUNIT: Fixed = 1 << FRACBITS;

/// `a * b` in 16.16, widened to 64 bits for the intermediate product.
#[inline(always)]
pub fn fixed_mul(a: Fixed, b: Fixed) -> Fixed {
    ((a as i64 * b as i64) >> FRACBITS) as Fixed
}

/// `a / b` in 16.16.
///
/// Saturates to `i32::MIN`/`i32::MAX` when the quotient would not fit,
/// which also covers division by zero.
#[inline]
pub fn fixed_div(a: Fixed, b: Fixed) -> Fixed {
    if (a.unsigned_abs() >> 14) >= b.unsigned_abs() {
        if (a ^ b) < 0 { i32::MIN } else { i32::MAX }
    } else {
        (((a as i64) << FRACBITS) / b as i64) as Fixed
    }
}

/// Linear blend `old → new` by `frac` (16.16, `0..FRACUNIT`).
#[inline]
pub fn lerp_fixed(old: Fixed, new: Fixed, frac: Fixed) -> Fixed {
    let delta = new as i64 - old as i64;
    (old as i64 + ((delta * frac as i64) >> FRACBITS)) as Fixed
}

/// Clamp `v` into `lo ..= hi`; unlike `Ord::clamp` an inverted range
/// yields `lo` instead of panicking.
#[inline]
pub fn between(lo: i32, hi: i32, v: i32) -> i32 {
    if v < lo {
        lo
    } else if v > hi {
        hi
    } else {
        v
    }
}

/// Narrow a widened intermediate back to 16.16, pinning it at the ends of
/// the range instead of wrapping.
#[inline]
pub fn saturate_fixed(v: i64) -> Fixed {
    v.clamp(Fixed::MIN as i64, Fixed::MAX as i64) as Fixed
}

#[inline]
pub fn int_to_fixed(v: i32) -> Fixed {
    v << FRACBITS
}

#[inline]
pub fn fixed_to_f64(v: Fixed) -> f64 {
    v as f64 / FRACUNIT as f64
}

/// Truncating conversion, the way the legacy code casts doubles.
#[inline]
pub fn f64_to_fixed(v: f64) -> Fixed {
    (v * FRACUNIT as f64) as Fixed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturate_keeps_the_sign_of_far_values() {
        assert_eq!(saturate_fixed(3 * FRACUNIT as i64), 3 * FRACUNIT);
        assert_eq!(saturate_fixed(60_000 * FRACUNIT as i64), Fixed::MAX);
        assert_eq!(saturate_fixed(-60_000 * FRACUNIT as i64), Fixed::MIN);
    }

    #[test]
    fn mul_and_div_are_inverse_for_small_values() {
        let a = 3 * FRACUNIT + FRACUNIT / 2;
        let b = 2 * FRACUNIT;
        assert_eq!(fixed_mul(a, b), 7 * FRACUNIT);
        assert_eq!(fixed_div(7 * FRACUNIT, b), a);
    }

    #[test]
    fn div_saturates_instead_of_overflowing() {
        assert_eq!(fixed_div(FRACUNIT, 0), i32::MAX);
        assert_eq!(fixed_div(-FRACUNIT, 0), i32::MIN);
        assert_eq!(fixed_div(i32::MIN, 1), i32::MIN);
    }

    #[test]
    fn lerp_hits_endpoints_and_midpoint() {
        assert_eq!(lerp_fixed(0, 100 * FRACUNIT, 0), 0);
        assert_eq!(lerp_fixed(0, 100 * FRACUNIT, FRACUNIT / 2), 50 * FRACUNIT);
        assert_eq!(lerp_fixed(i32::MAX, i32::MIN, 0), i32::MAX);
    }
}
