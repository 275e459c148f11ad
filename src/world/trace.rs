//! Straight-line probes through level geometry.
//!
//! Used by the chase camera to keep the trailing view point on the player's
//! side of walls. Only linedefs are considered; things never block a probe.

use crate::math::{FRACBITS, FRACUNIT, Fixed, fixed_div, fixed_mul, point_to_dist};

use super::{Level, LinedefId};

/// How far a blocked probe is pulled back from the wall it struck.
pub const PROBE_BACKOFF: Fixed = 8 * FRACUNIT;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeHit {
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
    /// Fraction of the probe travelled before backing off (16.16).
    pub frac: Fixed,
    pub line: LinedefId,
}

impl Level {
    /// Follow `(x, y, z)` → `(x + dx, y + dy, z + dz)` and report the first
    /// line that stops it.
    ///
    /// One-sided lines always block. A two-sided line blocks when the probe
    /// height at the crossing falls outside the opening between the higher
    /// floor and the lower ceiling of its two sectors.
    pub fn probe(
        &self,
        x: Fixed,
        y: Fixed,
        z: Fixed,
        dx: Fixed,
        dy: Fixed,
        dz: Fixed,
    ) -> Option<ProbeHit> {
        if dx == 0 && dy == 0 {
            return None;
        }

        let mut best: Option<(Fixed, LinedefId)> = None;
        for (i, ld) in self.linedefs.iter().enumerate() {
            let a = self.vertices[ld.v1 as usize].pos;
            let b = self.vertices[ld.v2 as usize].pos;
            let Some(frac) = crossing(x, y, dx, dy, a.x, a.y, b.x, b.y) else {
                continue;
            };
            if best.is_some_and(|(f, _)| f <= frac) {
                continue;
            }

            let front = ld.right_sidedef.and_then(|s| self.sidedefs.get(s as usize));
            let back = ld.left_sidedef.and_then(|s| self.sidedefs.get(s as usize));
            let blocks = match (front, back) {
                (Some(f), Some(b)) => {
                    let fs = &self.sectors[f.sector as usize];
                    let bs = &self.sectors[b.sector as usize];
                    let top = fs.ceil_h.min(bs.ceil_h);
                    let bottom = fs.floor_h.max(bs.floor_h);
                    let zi = z + fixed_mul(dz, frac);
                    zi >= top || zi <= bottom
                }
                _ => true,
            };
            if blocks {
                best = Some((frac, i as LinedefId));
            }
        }

        let (frac, line) = best?;
        let len = point_to_dist(0, 0, dx, dy);
        let frac = (frac - fixed_div(PROBE_BACKOFF, len)).max(0);
        Some(ProbeHit {
            x: x + fixed_mul(dx, frac),
            y: y + fixed_mul(dy, frac),
            z: z + fixed_mul(dz, frac),
            frac,
            line,
        })
    }
}

/// Fraction along `p + t·d` where it crosses segment `a → b`, if it does
/// within `0 < t <= 1`.
#[allow(clippy::too_many_arguments)]
fn crossing(
    px: Fixed,
    py: Fixed,
    dx: Fixed,
    dy: Fixed,
    ax: Fixed,
    ay: Fixed,
    bx: Fixed,
    by: Fixed,
) -> Option<Fixed> {
    let (ex, ey) = (bx as i128 - ax as i128, by as i128 - ay as i128);
    let (dx, dy) = (dx as i128, dy as i128);
    let denom = dx * ey - dy * ex;
    if denom == 0 {
        return None;
    }
    let (wx, wy) = (ax as i128 - px as i128, ay as i128 - py as i128);
    let t_num = wx * ey - wy * ex;
    let u_num = wx * dy - wy * dx;

    let (t_num, u_num, denom) = if denom < 0 {
        (-t_num, -u_num, -denom)
    } else {
        (t_num, u_num, denom)
    };
    if t_num <= 0 || t_num > denom || u_num < 0 || u_num > denom {
        return None;
    }
    Some(((t_num << FRACBITS) / denom) as Fixed)
}
