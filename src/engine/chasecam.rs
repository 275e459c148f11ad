//! Third-person chase camera.
//!
//! Places the view behind (or, in front mode, ahead of and facing) the
//! player, lifted or lowered along the look slope, and keeps it on the
//! player's side of walls and inside the floor/ceiling of wherever it lands.

use crate::engine::config::{ACTUALHEIGHT, ChasecamMode, SCREENHEIGHT};
use crate::math::{
    ANG90, ANG180, Angle, FRACUNIT, Fixed, between, fine_cosine, fine_sine, fine_tangent,
    fixed_div, fixed_mul, lerp_fixed,
};
use crate::world::Level;

/// View offset from the player origin produced by the chase camera, for
/// overlays that must follow the same frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChaseOffsets {
    pub x: Fixed,
    pub y: Fixed,
    pub angle: Angle,
}

/// View pose the camera starts from and rewrites.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChasePose {
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
    pub angle: Angle,
    pub base_pitch: Angle,
    pub pitch: Angle,
}

/// What the camera needs about the player beyond the pose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChaseSubject {
    /// Interpolated feet height.
    pub z: Fixed,
    /// Camera height above the feet (shake included).
    pub height: Fixed,
    pub dead: bool,
    pub ceiling_z: Fixed,
    pub momx: Fixed,
    pub momy: Fixed,
}

#[derive(Debug, Default)]
pub struct Chasecam {
    old_extra: Fixed,
    extra: Fixed,
    last_tic: Option<u64>,
}

/// Look slope (16.16) of a pitch, aspect corrected.
pub fn pitch_slope(pitch: Angle) -> Fixed {
    if pitch.0 == 0 {
        return 0;
    }
    let t = fine_tangent((ANG90 - pitch).fine());
    (t as i64 * SCREENHEIGHT as i64 / ACTUALHEIGHT as i64) as Fixed
}

impl Chasecam {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Move `pose` to the chase position and return the resulting offsets.
    ///
    /// `distance` is the configured trailing distance; the player's speed
    /// along the view direction is added to it, sampled once per tic and
    /// blended by `lerp` when interpolating.
    #[allow(clippy::too_many_arguments)]
    pub fn apply(
        &mut self,
        level: &Level,
        mode: ChasecamMode,
        distance: Fixed,
        subject: &ChaseSubject,
        pose: &mut ChasePose,
        game_tic: u64,
        lerp: Option<Fixed>,
    ) -> ChaseOffsets {
        let mut slope = pitch_slope(pose.base_pitch);

        let lift = if subject.dead { 6 * FRACUNIT } else { subject.height };
        let z = (subject.z + lift).min(subject.ceiling_z.saturating_sub(2 * FRACUNIT));

        let (start_x, start_y, start_angle) = (pose.x, pose.y, pose.angle);

        if mode == ChasecamMode::Front {
            pose.angle += ANG180;
            slope = -slope;
            pose.base_pitch = -pose.base_pitch;
            pose.pitch += Angle(pose.base_pitch.0.wrapping_mul(2));
        }

        let fine = pose.angle.fine();
        if self.last_tic != Some(game_tic) {
            self.old_extra = self.extra;
            self.extra = fixed_mul(subject.momx, fine_cosine(fine))
                + fixed_mul(subject.momy, fine_sine(fine));
        }
        self.last_tic = Some(game_tic);

        let dist = distance
            + match lerp {
                Some(frac) => lerp_fixed(self.old_extra, self.extra, frac),
                None => self.extra,
            };

        let dx = fixed_mul(dist, fine_cosine(fine));
        let dy = fixed_mul(dist, fine_sine(fine));
        let rise = fixed_mul(slope, dist);

        if let Some(hit) = level.probe(pose.x, pose.y, z, -dx, -dy, rise) {
            pose.x = hit.x;
            pose.y = hit.y;
            pose.z = hit.z;
        } else {
            let sec = &level.sectors[level.sector_at(pose.x - dx, pose.y - dy) as usize];
            let lo = sec.floor_h + FRACUNIT;
            let hi = sec.ceil_h - FRACUNIT;

            pose.z = z + rise;
            if pose.z < lo || pose.z > hi {
                pose.z = between(lo, hi, pose.z);
                // Pull the camera in by the share of the rise that survived
                // the clamp. A level look has no rise to share.
                let frac = if rise == 0 {
                    FRACUNIT
                } else {
                    fixed_div(pose.z - z, rise)
                };
                pose.x -= fixed_mul(dx, frac);
                pose.y -= fixed_mul(dy, frac);
            } else {
                pose.x -= dx;
                pose.y -= dy;
            }
        }

        ChaseOffsets {
            x: pose.x - start_x,
            y: pose.y - start_y,
            angle: pose.angle - start_angle,
        }
    }
}

/*──────────────────────────────── Tests ──────────────────────────────*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ANG1;
    use crate::world::two_room_level;

    fn subject(height: i32) -> ChaseSubject {
        ChaseSubject {
            z: 0,
            height: height * FRACUNIT,
            dead: false,
            ceiling_z: 128 * FRACUNIT,
            momx: 0,
            momy: 0,
        }
    }

    #[test]
    fn trails_directly_behind_on_level_look() {
        let lvl = two_room_level();
        let mut cam = Chasecam::default();
        let mut pose = ChasePose {
            x: -32 * FRACUNIT,
            ..Default::default()
        };
        let ofs = cam.apply(
            &lvl,
            ChasecamMode::Back,
            64 * FRACUNIT,
            &subject(48),
            &mut pose,
            1,
            None,
        );
        assert_eq!(pose.z, 48 * FRACUNIT);
        assert!((ofs.x + 64 * FRACUNIT).abs() < FRACUNIT / 64);
        assert_eq!(ofs.angle, Angle(0));
    }

    #[test]
    fn ceiling_clamp_scales_offset() {
        let lvl = two_room_level();
        let mut cam = Chasecam::default();
        // Looking down lifts the trailing camera; 20° over 64 units would
        // put it well above the 128 ceiling.
        let base = Angle::from_signed(-(20 * ANG1.signed()));
        let mut pose = ChasePose {
            x: -32 * FRACUNIT,
            base_pitch: base,
            pitch: base,
            ..Default::default()
        };
        let dist = 64 * FRACUNIT;
        let ofs = cam.apply(&lvl, ChasecamMode::Back, dist, &subject(120), &mut pose, 1, None);

        assert_eq!(pose.z, 128 * FRACUNIT - FRACUNIT);

        let z = 120 * FRACUNIT;
        let rise = fixed_mul(pitch_slope(base), dist);
        assert!(z + rise > pose.z);
        let frac = fixed_div(pose.z - z, rise);
        let dx = fixed_mul(dist, fine_cosine(0));
        assert_eq!(ofs.x, -fixed_mul(dx, frac));
        assert!(ofs.x.abs() < dist / 2);
    }

    #[test]
    fn front_mode_turns_around() {
        let lvl = two_room_level();
        let mut cam = Chasecam::default();
        let base = Angle::from_signed(5 * ANG1.signed());
        let mut pose = ChasePose {
            x: -128 * FRACUNIT,
            base_pitch: base,
            pitch: base,
            ..Default::default()
        };
        let ofs = cam.apply(
            &lvl,
            ChasecamMode::Front,
            64 * FRACUNIT,
            &subject(48),
            &mut pose,
            1,
            None,
        );
        assert_eq!(ofs.angle, ANG180);
        assert!(ofs.x > 60 * FRACUNIT);
        assert_eq!(pose.base_pitch, -base);
        assert_eq!(pose.pitch, -base);
    }

    #[test]
    fn wall_hit_keeps_camera_inside() {
        let lvl = two_room_level();
        let mut cam = Chasecam::default();
        let mut pose = ChasePose {
            x: -220 * FRACUNIT,
            ..Default::default()
        };
        cam.apply(&lvl, ChasecamMode::Back, 80 * FRACUNIT, &subject(48), &mut pose, 1, None);
        assert!(pose.x > -256 * FRACUNIT);
    }

    #[test]
    fn speed_extends_distance_once_per_tic() {
        let lvl = two_room_level();
        let mut cam = Chasecam::default();
        let moving = ChaseSubject {
            momx: 8 * FRACUNIT,
            ..subject(48)
        };
        let mut a = ChasePose {
            x: -32 * FRACUNIT,
            ..Default::default()
        };
        cam.apply(&lvl, ChasecamMode::Back, 64 * FRACUNIT, &moving, &mut a, 3, Some(0));
        // First tic: blend starts from the zero speed of the tic before.
        assert!((a.x + 96 * FRACUNIT).abs() < FRACUNIT / 32);
        let mut b = ChasePose {
            x: -32 * FRACUNIT,
            ..Default::default()
        };
        cam.apply(&lvl, ChasecamMode::Back, 64 * FRACUNIT, &moving, &mut b, 3, Some(FRACUNIT));
        assert!(b.x < a.x);
    }
}
