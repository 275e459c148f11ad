//! Fine trigonometry tables and the point → angle conversions built on them.
//!
//! The tables are generated once per process from the classic closed-form
//! formulas, then shared read-only.

use once_cell::sync::Lazy;

use super::angle::{ANG90, ANG180, ANG270, Angle};
use super::fixed::{FRACBITS, FRACUNIT, Fixed, fixed_div};

pub const FINEANGLES: usize = 8192;
pub const FINEMASK: usize = FINEANGLES - 1;
/// `Angle >> ANGLETOFINESHIFT` yields a fine index.
pub const ANGLETOFINESHIFT: u32 = 19;

pub const SLOPERANGE: usize = 2048;
pub const SLOPEBITS: i32 = 11;
pub const DBITS: i32 = FRACBITS - SLOPEBITS;

/// All process-wide trig tables.
pub struct TrigTables {
    /// `5 * FINEANGLES / 4` entries so cosine is a quarter-turn offset view.
    pub fine_sine: Box<[Fixed]>,
    /// `FINEANGLES / 2` entries covering `-90° .. +90°`.
    pub fine_tangent: Box<[Fixed]>,
    /// Slope (`0 ..= SLOPERANGE`) to angle in the first octant.
    pub tan_to_angle: Box<[u32]>,
}

pub static TABLES: Lazy<TrigTables> = Lazy::new(TrigTables::generate);

impl TrigTables {
    fn generate() -> Self {
        use std::f64::consts::PI;

        let fine_sine = (0..5 * FINEANGLES / 4)
            .map(|i| {
                let a = (i as f64 + 0.5) * PI * 2.0 / FINEANGLES as f64;
                (FRACUNIT as f64 * a.sin()) as Fixed
            })
            .collect();

        let fine_tangent = (0..FINEANGLES / 2)
            .map(|i| {
                let a = (i as f64 - (FINEANGLES / 4) as f64 + 0.5) * PI * 2.0 / FINEANGLES as f64;
                (FRACUNIT as f64 * a.tan()) as Fixed
            })
            .collect();

        let tan_to_angle = (0..=SLOPERANGE)
            .map(|i| {
                let f = (i as f64 / SLOPERANGE as f64).atan() / (PI * 2.0);
                (u32::MAX as f64 * f) as u32
            })
            .collect();

        Self {
            fine_sine,
            fine_tangent,
            tan_to_angle,
        }
    }
}

#[inline(always)]
pub fn fine_sine(fine: usize) -> Fixed {
    TABLES.fine_sine[fine & FINEMASK]
}

#[inline(always)]
pub fn fine_cosine(fine: usize) -> Fixed {
    TABLES.fine_sine[(fine & FINEMASK) + FINEANGLES / 4]
}

/// Tangent for a fine index in `0 .. FINEANGLES / 2`.
#[inline(always)]
pub fn fine_tangent(fine: usize) -> Fixed {
    TABLES.fine_tangent[fine.min(FINEANGLES / 2 - 1)]
}

#[inline(always)]
pub fn tan_to_angle(slope: usize) -> Angle {
    Angle(TABLES.tan_to_angle[slope])
}

/// Legacy 32-bit slope division (the shift may wrap, as it always did).
#[inline]
pub fn slope_div(num: u32, den: u32) -> usize {
    if den < 512 {
        return SLOPERANGE;
    }
    let ans = (num << 3) / (den >> 8);
    (ans as usize).min(SLOPERANGE)
}

/// Slope division with a 64-bit numerator; never wraps.
#[inline]
pub fn slope_div_wide(num: u32, den: u32) -> usize {
    if den < 512 {
        return SLOPERANGE;
    }
    let ans = ((num as u64) << 3) / (den >> 8) as u64;
    ans.min(SLOPERANGE as u64) as usize
}

/// Octant-folding atan2 over already-relative coordinates.
fn octant_angle(mut x: i32, mut y: i32, div: fn(u32, u32) -> usize) -> Angle {
    if x == 0 && y == 0 {
        return Angle(0);
    }
    if x >= 0 {
        if y >= 0 {
            if x > y {
                tan_to_angle(div(y as u32, x as u32)) // octant 0
            } else {
                ANG90 - Angle(1) - tan_to_angle(div(x as u32, y as u32)) // octant 1
            }
        } else {
            y = y.wrapping_neg();
            if x > y {
                -tan_to_angle(div(y as u32, x as u32)) // octant 8
            } else {
                ANG270 + tan_to_angle(div(x as u32, y as u32)) // octant 7
            }
        }
    } else {
        x = x.wrapping_neg();
        if y >= 0 {
            if x > y {
                ANG180 - Angle(1) - tan_to_angle(div(y as u32, x as u32)) // octant 3
            } else {
                ANG90 + tan_to_angle(div(x as u32, y as u32)) // octant 2
            }
        } else {
            y = y.wrapping_neg();
            if x > y {
                ANG180 + tan_to_angle(div(y as u32, x as u32)) // octant 4
            } else {
                ANG270 - Angle(1) - tan_to_angle(div(x as u32, y as u32)) // octant 5
            }
        }
    }
}

/// Angle of `(x, y)` seen from `(ox, oy)` with legacy wrapping deltas.
pub fn point_to_angle(ox: Fixed, oy: Fixed, x: Fixed, y: Fixed) -> Angle {
    octant_angle(x.wrapping_sub(ox), y.wrapping_sub(oy), slope_div)
}

/// Overflow-safe variant: deltas are computed in 64 bits and, when either
/// leaves the `i32` range, both are halved so the ratio (and the angle) is
/// kept. One halving suffices because the widest possible delta is
/// `i32::MAX - i32::MIN`.
pub fn point_to_angle_wide(ox: Fixed, oy: Fixed, x: Fixed, y: Fixed) -> Angle {
    delta_to_angle_wide(x as i64 - ox as i64, y as i64 - oy as i64)
}

/// Angle of a raw 64-bit delta, halving symmetrically until it fits.
pub fn delta_to_angle_wide(mut dx: i64, mut dy: i64) -> Angle {
    let out_of_range = |v: i64| v < i32::MIN as i64 || v > i32::MAX as i64;
    while out_of_range(dx) || out_of_range(dy) {
        dx /= 2;
        dy /= 2;
    }
    octant_angle(dx as i32, dy as i32, slope_div_wide)
}

/// Approximate Euclidean distance through the tangent tables.
pub fn point_to_dist(ox: Fixed, oy: Fixed, x: Fixed, y: Fixed) -> Fixed {
    let mut dx = (x as i64 - ox as i64).abs().min(i32::MAX as i64) as Fixed;
    let mut dy = (y as i64 - oy as i64).abs().min(i32::MAX as i64) as Fixed;
    if dy > dx {
        std::mem::swap(&mut dx, &mut dy);
    }
    if dx == 0 {
        return 0;
    }
    let slope = ((fixed_div(dy, dx) >> DBITS) as usize).min(SLOPERANGE);
    let angle = tan_to_angle(slope) + ANG90;
    fixed_div(dx, fine_sine(angle.fine()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::angle::{ANG45, ANG1};

    fn close(a: Angle, b: Angle, tol: u32) -> bool {
        (a - b).0.min((b - a).0) <= tol
    }

    #[test]
    fn sine_and_cosine_quadrants() {
        assert!((fine_sine(FINEANGLES / 4) - FRACUNIT).abs() < 4);
        assert!(fine_cosine(0) > FRACUNIT - 4);
        assert!(fine_sine(0).abs() < 64);
        assert!(fine_cosine(FINEANGLES / 2) < -FRACUNIT + 4);
    }

    #[test]
    fn tangent_is_monotonic() {
        let t = &TABLES.fine_tangent;
        assert!(t.windows(2).all(|w| w[0] <= w[1]));
        assert!(t[FINEANGLES / 4] > 0 && t[FINEANGLES / 4 - 1] < 0);
    }

    #[test]
    fn cardinal_directions() {
        assert_eq!(point_to_angle(0, 0, FRACUNIT, 0), Angle(0));
        assert!(close(point_to_angle(0, 0, 0, FRACUNIT), ANG90, 2));
        assert!(close(point_to_angle(0, 0, -FRACUNIT, 0), ANG180, 2));
        assert!(close(point_to_angle(0, 0, 0, -FRACUNIT), ANG270, 2));
        assert!(close(point_to_angle(0, 0, FRACUNIT, FRACUNIT), ANG45, ANG1.0 / 16));
        assert_eq!(point_to_angle(5, 5, 5, 5), Angle(0));
    }

    #[test]
    fn wide_variant_preserves_angle_when_halving() {
        // Deltas far outside i32 range in both axes.
        let dx: i64 = 3_000_000_000;
        let dy: i64 = -2_000_000_000;
        let direct = delta_to_angle_wide(dx, dy);
        let halved = delta_to_angle_wide(dx / 2, dy / 2);
        assert_eq!(direct, halved);

        // Same result through the coordinate-based entry point.
        let from_points =
            point_to_angle_wide(-1_500_000_000, 1_000_000_000, 1_500_000_000, -1_000_000_000);
        assert_eq!(from_points, halved);
    }

    #[test]
    fn wide_variant_matches_vanilla_in_range() {
        for &(x, y) in &[(100, 7), (-300, 45), (12, -900), (-5, -5), (0, 77)] {
            let (x, y) = (x * FRACUNIT, y * FRACUNIT);
            assert_eq!(point_to_angle(0, 0, x, y), point_to_angle_wide(0, 0, x, y));
        }
    }

    #[test]
    fn distance_is_close_to_euclidean() {
        let d = point_to_dist(0, 0, 300 * FRACUNIT, 400 * FRACUNIT);
        assert!((d - 500 * FRACUNIT).abs() < FRACUNIT, "{d}");
        assert_eq!(point_to_dist(7, 7, 7, 7), 0);
    }
}
