//! Binary angle measurement (BAM): a full turn is the whole `u32` range,
//! so addition and subtraction wrap for free.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use super::fixed::{FRACBITS, Fixed};
use super::tables::ANGLETOFINESHIFT;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Angle(pub u32);

pub const ANG45: Angle = Angle(0x2000_0000);
pub const ANG90: Angle = Angle(0x4000_0000);
pub const ANG180: Angle = Angle(0x8000_0000);
pub const ANG270: Angle = Angle(0xC000_0000);
pub const ANG1: Angle = Angle(0x2000_0000 / 45);
pub const ANG_MAX: Angle = Angle(u32::MAX);

impl Angle {
    /// Index into the fine trig tables.
    #[inline(always)]
    pub fn fine(self) -> usize {
        (self.0 >> ANGLETOFINESHIFT) as usize
    }

    #[inline(always)]
    pub fn from_fine(fine: usize) -> Self {
        Angle((fine as u32) << ANGLETOFINESHIFT)
    }

    /// Reinterpret as a signed offset from zero (`-ANG180 ..= ANG180-1`).
    #[inline(always)]
    pub fn signed(self) -> i32 {
        self.0 as i32
    }

    #[inline(always)]
    pub fn from_signed(v: i32) -> Self {
        Angle(v as u32)
    }

    pub fn from_degrees(deg: f64) -> Self {
        let turns = (deg / 360.0).rem_euclid(1.0);
        Angle((turns * 4_294_967_296.0) as u64 as u32)
    }

    pub fn to_degrees(self) -> f64 {
        self.0 as f64 * 360.0 / 4_294_967_296.0
    }

    pub fn to_radians(self) -> f32 {
        (self.0 as f64 * std::f64::consts::TAU / 4_294_967_296.0) as f32
    }

    /// Interpolate along the shorter arc between `old` and `new`.
    pub fn lerp(old: Angle, new: Angle, frac: Fixed) -> Angle {
        let delta = new.0.wrapping_sub(old.0) as i32 as i64;
        let step = (delta * frac as i64) >> FRACBITS;
        Angle(old.0.wrapping_add(step as i32 as u32))
    }
}

impl Add for Angle {
    type Output = Angle;
    #[inline(always)]
    fn add(self, rhs: Angle) -> Angle {
        Angle(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Angle {
    type Output = Angle;
    #[inline(always)]
    fn sub(self, rhs: Angle) -> Angle {
        Angle(self.0.wrapping_sub(rhs.0))
    }
}

impl AddAssign for Angle {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Angle) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl SubAssign for Angle {
    #[inline(always)]
    fn sub_assign(&mut self, rhs: Angle) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}

impl Neg for Angle {
    type Output = Angle;
    #[inline(always)]
    fn neg(self) -> Angle {
        Angle(self.0.wrapping_neg())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::fixed::FRACUNIT;

    #[test]
    fn arithmetic_wraps_around_the_circle() {
        assert_eq!(ANG270 + ANG180, ANG90);
        assert_eq!(ANG90 - ANG180, ANG270);
        assert_eq!(-ANG90, ANG270);
    }

    #[test]
    fn lerp_takes_the_short_way_across_zero() {
        let old = Angle::from_degrees(350.0);
        let new = Angle::from_degrees(10.0);
        let mid = Angle::lerp(old, new, FRACUNIT / 2);
        assert!(mid.0 < ANG1.0 / 2 || mid.0 > ANG_MAX.0 - ANG1.0 / 2, "{mid:?}");
    }

    #[test]
    fn degrees_round_trip() {
        let a = Angle::from_degrees(123.5);
        assert!((a.to_degrees() - 123.5).abs() < 1e-6);
        assert_eq!(Angle::from_degrees(90.0), ANG90);
    }
}
