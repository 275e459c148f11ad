//! ----------------------------------------------------------------------------
//! **Projection setup**
//!
//! Everything that depends on the field of view and the viewport size but not
//! on where the player stands: focal lengths, the angle ↔ column tables the
//! traversal clips against, the linear sky offsets, per-column distance
//! correction and, for freelook, the per-row slope table.
//!
//! The whole state is rebuilt by [`Projection::new`]; only the freelook part
//! is recomputed when the pitch alone changes.
//! ----------------------------------------------------------------------------

use log::debug;

use crate::engine::config::{ACTUALHEIGHT, FOV_DEFAULT, SCREENHEIGHT, SCREENWIDTH, Viewport};
use crate::math::{
    ANG90, ANGLETOFINESHIFT, Angle, FINEANGLES, FRACBITS, FRACUNIT, Fixed, fine_cosine,
    fine_tangent, fixed_div, fixed_mul,
};

/// Fine-angle width of the classic 90° view.
pub const FIELDOFVIEW: usize = 2048;

/// Outcome of the focal length computation, kept apart so both paths can be
/// compared directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Focal {
    /// Horizontal field of view in fine angles.
    pub fine_fov: usize,
    /// Tangent at the view edge (16.16).
    pub slope_frac: Fixed,
    pub focal_length: Fixed,
    pub light_focal_length: Fixed,
    pub projection: Fixed,
}

impl Focal {
    /// Table-driven path; only exact for the default FOV on a 4:3 view.
    pub fn classic(viewport: &Viewport) -> Self {
        let nonwide = viewport.center_x_frac_nonwide();
        let slope_frac = fine_tangent(FINEANGLES / 4 + FIELDOFVIEW / 2);
        Self {
            fine_fov: FIELDOFVIEW,
            slope_frac,
            focal_length: fixed_div(nonwide, slope_frac),
            light_focal_length: nonwide,
            projection: nonwide,
        }
    }

    /// Floating-point path for any FOV and aspect.
    pub fn trigonometric(viewport: &Viewport, fov: i32) -> Self {
        use std::f64::consts::PI;

        let center = viewport.center_x_frac();
        let nonwide = viewport.center_x_frac_nonwide();
        let slope = (fov as f64 * PI / 360.0).tan() * center as f64 / nonwide as f64;

        // Light falls off as if the table entry half a fine angle further out
        // were the edge, matching how the tangent table itself is sampled.
        let light_angle = slope.atan() + PI / FINEANGLES as f64;
        let light_slope_frac = (light_angle.tan() * FRACUNIT as f64) as Fixed;

        let fine_fov = (slope.atan() * FINEANGLES as f64 / PI) as usize;
        let slope_frac = fine_tangent(FINEANGLES / 4 + fine_fov / 2);
        Self {
            fine_fov,
            slope_frac,
            focal_length: fixed_div(center, slope_frac),
            light_focal_length: fixed_div(center, light_slope_frac),
            projection: (center as f64 / slope) as Fixed,
        }
    }
}

pub struct Projection {
    /// Rendered FOV (base plus effects) these tables were built for.
    pub fov: i32,
    /// Base FOV; the sky scale follows this one, not the effects.
    pub base_fov: i32,
    pub viewport: Viewport,

    pub center_x_frac: Fixed,
    pub center_y: i32,
    pub center_y_frac: Fixed,

    pub focal: Focal,

    /// Fine angle (relative to `-90°`) → first screen column right of it.
    pub view_angle_to_x: Vec<i32>,
    /// Column → smallest view angle that lands on it (`width + 1` entries).
    pub x_to_view_angle: Vec<Angle>,
    /// Per-column sky offset for flat (non-curved) sky scrolling.
    pub linear_sky_angle: Vec<Angle>,
    /// Half the visible angle; anything beyond is off screen.
    pub clip_angle: Angle,
    /// Per-column `1 / cos` correction for flats.
    pub dist_scale: Vec<Fixed>,
    pub sky_iscale: Fixed,

    /// Pitch the freelook tables below were built for.
    pub pitch: Angle,
    /// Per-row `projection / distance-from-center`, for flats.
    pub y_slope: Vec<Fixed>,
}

impl Projection {
    pub fn new(viewport: Viewport, fov: i32, base_fov: i32) -> Self {
        let center_x_frac = viewport.center_x_frac();
        let focal = if fov == FOV_DEFAULT && center_x_frac == viewport.center_x_frac_nonwide() {
            Focal::classic(&viewport)
        } else {
            Focal::trigonometric(&viewport, fov)
        };

        let width = viewport.width;
        let mut view_angle_to_x = build_view_angle_to_x(&focal, center_x_frac, width);

        let sky_factor = focal.slope_frac as f64 / FRACUNIT as f64 * ANG90.0 as f64;
        let mut x_to_view_angle = Vec::with_capacity(width as usize + 1);
        let mut linear_sky_angle = Vec::with_capacity(width as usize + 1);
        for x in 0..=width {
            // The forward table is non-increasing, so this is the first
            // fine angle whose column is at or left of `x`.
            let i = view_angle_to_x.partition_point(|&t| t > x);
            x_to_view_angle.push(Angle::from_fine(i) - ANG90);
            let sky = (0.5 - x as f64 / width as f64) * sky_factor;
            linear_sky_angle.push(Angle(sky as i64 as u32));
        }

        // Fold the fencepost sentinels onto the view edges.
        for t in &mut view_angle_to_x {
            if *t == -1 {
                *t = 0;
            } else if *t == width + 1 {
                *t = width;
            }
        }

        let clip_angle = x_to_view_angle[0];

        let dist_scale = x_to_view_angle[..width as usize]
            .iter()
            .map(|a| fixed_div(FRACUNIT, fine_cosine(a.fine()).abs()))
            .collect();

        let sky_iscale = if base_fov == FOV_DEFAULT {
            fixed_div(SCREENWIDTH, viewport.width_nonwide)
        } else {
            let t = (base_fov as f64 * std::f64::consts::PI / 360.0).tan();
            (t * SCREENWIDTH as f64 / viewport.width_nonwide as f64 * FRACUNIT as f64) as Fixed
        };

        debug!(
            "projection rebuilt: {}x{} fov {} (base {}) focal {:#x} clip {:#x}",
            viewport.width, viewport.height, fov, base_fov, focal.focal_length, clip_angle.0
        );

        let mut p = Self {
            fov,
            base_fov,
            viewport,
            center_x_frac,
            center_y: viewport.height / 2,
            center_y_frac: (viewport.height / 2) << FRACBITS,
            focal,
            view_angle_to_x,
            x_to_view_angle,
            linear_sky_angle,
            clip_angle,
            dist_scale,
            sky_iscale,
            pitch: Angle(0),
            y_slope: Vec::new(),
        };
        p.setup_freelook();
        p
    }

    /// True when the tables already describe this FOV and viewport.
    #[inline]
    pub fn matches(&self, viewport: &Viewport, fov: i32, base_fov: i32) -> bool {
        self.viewport == *viewport && self.fov == fov && self.base_fov == base_fov
    }

    /// Re-derive the vertical center and row slopes for a new pitch.
    pub fn set_pitch(&mut self, pitch: Angle) {
        if pitch != self.pitch {
            self.pitch = pitch;
            self.setup_freelook();
        }
    }

    #[inline(always)]
    pub fn projection(&self) -> Fixed {
        self.focal.projection
    }

    #[inline(always)]
    pub fn light_focal_length(&self) -> Fixed {
        self.focal.light_focal_length
    }

    /// Screen column for a view-relative angle (`0` = straight ahead).
    #[inline(always)]
    pub fn angle_to_x(&self, angle: Angle) -> i32 {
        let fine = ((angle + ANG90).0 >> ANGLETOFINESHIFT) as usize;
        self.view_angle_to_x[fine & (FINEANGLES / 2 - 1)]
    }

    fn setup_freelook(&mut self) {
        let dy = if self.pitch.0 != 0 {
            let t = fine_tangent((ANG90 - self.pitch).fine());
            let dy = fixed_mul(self.focal.projection, -t);
            (dy as i64 * SCREENHEIGHT as i64 / ACTUALHEIGHT as i64) as Fixed
        } else {
            0
        };

        self.center_y = self.viewport.height / 2 + (dy >> FRACBITS);
        self.center_y_frac = self.center_y << FRACBITS;

        let projection = self.focal.projection;
        let center_y = self.center_y;
        self.y_slope = (0..self.viewport.height)
            .map(|i| {
                let dy = (((i - center_y) << FRACBITS) + FRACUNIT / 2).abs();
                fixed_div(projection, dy)
            })
            .collect();
    }
}

/// Column for every fine angle across the front half circle, with `-1` and
/// `width + 1` marking angles beyond the left and right edges.
fn build_view_angle_to_x(focal: &Focal, center_x_frac: Fixed, width: i32) -> Vec<i32> {
    (0..FINEANGLES / 2)
        .map(|i| {
            let tan = fine_tangent(i);
            if tan > focal.slope_frac {
                -1
            } else if tan < -focal.slope_frac {
                width + 1
            } else {
                let t = fixed_mul(tan, focal.focal_length);
                ((center_x_frac - t + FRACUNIT - 1) >> FRACBITS).clamp(-1, width + 1)
            }
        })
        .collect()
}

/*──────────────────────────────── Tests ──────────────────────────────*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ANG45;

    fn classic(scale: i32) -> Projection {
        Projection::new(Viewport::classic(scale), FOV_DEFAULT, FOV_DEFAULT)
    }

    #[test]
    fn x_to_view_angle_is_non_increasing() {
        let wide = Projection::new(Viewport::widescreen(854, 400), 110, 110);
        for p in [classic(1), classic(2), wide] {
            for w in p.x_to_view_angle.windows(2) {
                assert!(w[1].signed() <= w[0].signed());
            }
        }
    }

    #[test]
    fn column_round_trip_within_one_pixel() {
        for p in [classic(1), classic(2)] {
            for x in 0..p.viewport.width {
                let back = p.angle_to_x(p.x_to_view_angle[x as usize]);
                assert!((back - x).abs() <= 1, "x {x} came back as {back}");
            }
        }
    }

    #[test]
    fn classic_and_trig_focal_agree_at_default_fov() {
        let vp = Viewport::classic(1);
        let table = Focal::classic(&vp);
        let trig = Focal::trigonometric(&vp, FOV_DEFAULT);
        assert!((table.focal_length - trig.focal_length).abs() < FRACUNIT);
        // 160 / tan(45°) with the half-step table sample: just under 160.
        assert!((table.focal_length - 160 * FRACUNIT).abs() < FRACUNIT / 4);
        assert_eq!(table.projection, 160 * FRACUNIT);
    }

    #[test]
    fn clip_angle_is_half_the_fov() {
        let p = classic(1);
        let err = (p.clip_angle.signed() - ANG45.signed()).abs();
        assert!(err <= 1 << ANGLETOFINESHIFT, "clip {:#x}", p.clip_angle.0);
        assert_eq!(p.view_angle_to_x.iter().copied().min(), Some(0));
        assert_eq!(p.view_angle_to_x.iter().copied().max(), Some(320));
    }

    #[test]
    fn wider_fov_shortens_focal_length() {
        let vp = Viewport::classic(1);
        let narrow = Projection::new(vp, 70, 70);
        let wide = Projection::new(vp, 110, 110);
        assert!(narrow.focal.focal_length > wide.focal.focal_length);
        assert!(narrow.clip_angle.signed() < wide.clip_angle.signed());
    }

    #[test]
    fn pitch_moves_center_row() {
        let mut p = classic(1);
        assert_eq!(p.center_y, 100);
        // Positive pitch looks up, pushing the horizon down the screen.
        p.set_pitch(Angle::from_signed(10 * crate::math::ANG1.signed()));
        assert!(p.center_y > 100);
        p.set_pitch(Angle(0));
        assert_eq!(p.center_y, 100);
        assert_eq!(p.y_slope.len(), 200);
    }

    #[test]
    fn linear_sky_table_matches_the_view_at_center_and_edges() {
        let p = classic(1);
        for w in p.linear_sky_angle.windows(2) {
            assert!(w[1].signed() <= w[0].signed());
        }
        // Within a column or so of the curved table where they must meet.
        let slack = 16 << ANGLETOFINESHIFT;
        for x in [0, 160, 320] {
            let linear = p.linear_sky_angle[x].signed();
            let curved = p.x_to_view_angle[x].signed();
            assert!((linear - curved).abs() <= slack, "x {x}: {linear:#x} vs {curved:#x}");
        }
    }

    #[test]
    fn sky_scale_tracks_base_fov_only() {
        let vp = Viewport::classic(1);
        assert_eq!(Projection::new(vp, 70, 90).sky_iscale, FRACUNIT);
        assert!(Projection::new(vp, 100, 100).sky_iscale > FRACUNIT);
    }
}
