//! Per-frame view setup: where the camera is, where it looks and which
//! colormap the frame is shaded with.

use log::warn;

use crate::engine::chasecam::{ChaseOffsets, ChasePose, ChaseSubject, Chasecam};
use crate::engine::config::{ChasecamMode, RenderConfig};
use crate::engine::effects::Shake;
use crate::engine::player::{GameClock, LocalView, PlayerSnapshot, Session};
use crate::math::{
    ANG1, Angle, FRACUNIT, Fixed, fine_cosine, fine_sine, int_to_fixed, lerp_fixed,
};
use crate::world::{COLORMAP_ROWS, ColormapRow, Level, SectorId};

/// Furthest the view may look up or down.
pub const MAX_PITCH_ANGLE: Angle = Angle(32 * ANG1.0);

/// The camera for one rendered frame. Built once, never changed mid-frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewFrame {
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
    pub angle: Angle,
    /// Look pitch plus recoil and flinch; drives freelook.
    pub pitch: Angle,
    pub sin: Fixed,
    pub cos: Fixed,
    /// Light steps added to every surface.
    pub extralight: i32,
    /// Colormap the light tables resolve into.
    pub colormap: u16,
    /// Row forced on every surface (invulnerability, light amp).
    pub fixed_colormap: Option<ColormapRow>,
    pub chasecam: bool,
    pub chase: ChaseOffsets,
    /// Sector the player stands in (not the camera's, under the chase cam).
    pub player_sector: SectorId,
    /// The pose was blended between tics.
    pub interpolated: bool,
    /// Sky columns come from the linear table rather than the view angles.
    pub linear_sky: bool,
}

/// Frame-to-frame state behind [`ViewSetup::setup_frame`].
#[derive(Default)]
pub struct ViewSetup {
    pub shake: Shake,
    pub chasecam: Chasecam,
}

fn clamp_pitch(p: Angle) -> Angle {
    let max = MAX_PITCH_ANGLE.signed();
    Angle::from_signed(p.signed().clamp(-max, max))
}

impl ViewSetup {
    pub fn new(seed: u64) -> Self {
        Self {
            shake: Shake::new(seed),
            chasecam: Chasecam::default(),
        }
    }

    /// Local turning applies only to a live console player in a local game,
    /// with raw input on and no teleport freeze.
    pub fn use_local_view(cfg: &RenderConfig, player: &PlayerSnapshot, session: &Session) -> bool {
        cfg.raw_input
            && player.is_console_player
            && !player.dead
            && player.reaction_time == 0
            && !session.demo_playback
            && (!session.netgame || session.solonet)
    }

    /// Derive this frame's view from the player snapshot.
    #[allow(clippy::too_many_arguments)]
    pub fn setup_frame(
        &mut self,
        level: &Level,
        cfg: &RenderConfig,
        light_bright: i32,
        colormap_count: usize,
        player: &PlayerSnapshot,
        local: Option<&LocalView>,
        clock: &GameClock,
        session: &Session,
    ) -> ViewFrame {
        let interpolate = cfg.uncapped
            && clock.level_time > 1
            && player.interp
            && clock.level_time > clock.old_level_time;

        let mut x;
        let mut y;
        let mut z;
        let player_z;
        let mut angle;
        let base_pitch;
        let mut pitch;

        if interpolate {
            let frac = clock.frac;
            let local = local.filter(|_| Self::use_local_view(cfg, player, session));

            x = lerp_fixed(player.old_x, player.x, frac);
            y = lerp_fixed(player.old_y, player.y, frac);
            z = lerp_fixed(player.old_view_z, player.view_z, frac);
            player_z = lerp_fixed(player.old_z, player.z, frac);

            angle = match local {
                Some(lv) => {
                    player.angle + lv.angle - lv.tic_angle
                        + Angle::lerp(lv.old_tic_angle, lv.tic_angle, frac)
                }
                None => Angle::lerp(player.old_angle, player.angle, frac),
            };

            base_pitch = match local {
                Some(lv) if !player.centering => clamp_pitch(player.pitch + lv.pitch),
                _ => lerp_angle_linear(player.old_pitch, player.pitch, frac),
            };

            pitch = base_pitch
                + lerp_angle_linear(player.old_recoil_pitch, player.recoil_pitch, frac)
                + lerp_angle_linear(player.old_flinch, player.flinch, frac);
        } else {
            x = player.x;
            y = player.y;
            z = player.view_z;
            player_z = player.z;
            angle = player.angle;
            base_pitch = player.pitch;
            pitch = base_pitch + player.recoil_pitch + player.flinch;
        }

        // Explosion shake.
        let mut chase_height = int_to_fixed(cfg.chasecam_height);
        let (sx, sy, sz) = self.shake.sample(clock.level_time, session.frozen());
        x += sx;
        y += sy;
        z += sz;
        chase_height += sz;

        // Chase camera.
        let dead = player.health <= 0 && player.dead;
        let chasecam = !cfg.strict
            && (cfg.chasecam_mode != ChasecamMode::Off || (cfg.death_camera && dead));

        let mut chase = ChaseOffsets::default();
        if chasecam {
            let mut pose = ChasePose {
                x,
                y,
                z,
                angle,
                base_pitch,
                pitch,
            };
            let subject = ChaseSubject {
                z: player_z,
                height: chase_height,
                dead,
                ceiling_z: player.ceiling_z,
                momx: player.momx,
                momy: player.momy,
            };
            chase = self.chasecam.apply(
                level,
                cfg.chasecam_mode,
                int_to_fixed(cfg.chasecam_distance),
                &subject,
                &mut pose,
                clock.game_tic,
                interpolate.then_some(clock.frac),
            );
            x = pose.x;
            y = pose.y;
            z = pose.z;
            angle = pose.angle;
            pitch = pose.pitch;
        }

        let mut extralight = if cfg.strict || cfg.a11y_weapon_flash {
            player.extralight
        } else {
            0
        };
        extralight += cfg.cosmetic(light_bright * cfg.extra_level_brightness);

        let colormap = sector_colormap(level, player.sector, z, colormap_count);

        let fixed_colormap = (player.fixed_colormap != 0).then(|| {
            let max = COLORMAP_ROWS as i32 - 1;
            if !(0..=max).contains(&player.fixed_colormap) {
                warn!("fixed colormap {} out of range, clamped", player.fixed_colormap);
            }
            ColormapRow {
                colormap,
                row: player.fixed_colormap.clamp(0, max) as u8,
            }
        });

        ViewFrame {
            x,
            y,
            z,
            angle,
            pitch,
            sin: fine_sine(angle.fine()),
            cos: fine_cosine(angle.fine()),
            extralight,
            colormap,
            fixed_colormap,
            chasecam,
            chase,
            player_sector: player.sector,
            interpolated: interpolate,
            linear_sky: cfg.cosmetic(cfg.linear_sky),
        }
    }
}

/// Pitch-like values are small signed angles; blend them as plain numbers.
fn lerp_angle_linear(old: Angle, new: Angle, frac: Fixed) -> Angle {
    Angle::from_signed(lerp_fixed(old.signed(), new.signed(), frac))
}

/// Colormap for a view at height `z` in `sector`: a sector linked to a
/// control sector picks one of three maps by where `z` sits relative to the
/// control sector's planes.
pub fn sector_colormap(level: &Level, sector: SectorId, z: Fixed, count: usize) -> u16 {
    let Some(hs) = level.sectors.get(sector as usize).and_then(|s| s.heightsec) else {
        return 0;
    };
    let s = &level.sectors[hs as usize];
    let cm = if z < s.interp_floor_h {
        s.bottom_map
    } else if z > s.interp_ceil_h {
        s.top_map
    } else {
        s.mid_map
    };
    if cm < 0 || cm as usize >= count {
        warn!("sector {sector}: colormap {cm} out of range, using the base colormap");
        return 0;
    }
    cm as u16
}

/*──────────────────────────────── Tests ──────────────────────────────*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{ANG90, ANG180};
    use crate::world::{Sector, two_room_level};

    fn clock(level_time: u32, frac: Fixed) -> GameClock {
        GameClock {
            game_tic: level_time as u64,
            level_time,
            old_level_time: level_time - 1,
            frac,
        }
    }

    fn moving_player() -> PlayerSnapshot {
        let mut p = PlayerSnapshot::standing(-64 * FRACUNIT, 0, 0, ANG90);
        p.old_x = -96 * FRACUNIT;
        p.old_angle = Angle(0);
        p
    }

    fn setup(cfg: &RenderConfig, p: &PlayerSnapshot, c: &GameClock) -> ViewFrame {
        let lvl = two_room_level();
        ViewSetup::new(0).setup_frame(&lvl, cfg, 1, 1, p, None, c, &Session::default())
    }

    #[test]
    fn interpolates_between_tics() {
        let f = setup(&RenderConfig::default(), &moving_player(), &clock(10, FRACUNIT / 2));
        assert!(f.interpolated);
        assert_eq!(f.x, -80 * FRACUNIT);
        assert_eq!(f.angle, Angle(ANG90.0 / 2));
        assert_eq!(f.z, 41 * FRACUNIT);
    }

    #[test]
    fn exact_pose_when_interpolation_not_allowed() {
        let p = moving_player();
        let first_tic = setup(&RenderConfig::default(), &p, &clock(1, FRACUNIT / 2));
        assert!(!first_tic.interpolated);
        assert_eq!(first_tic.x, p.x);

        let mut teleported = p.clone();
        teleported.interp = false;
        assert_eq!(setup(&RenderConfig::default(), &teleported, &clock(10, FRACUNIT / 2)).x, p.x);

        let capped = RenderConfig {
            uncapped: false,
            ..RenderConfig::default()
        };
        assert_eq!(setup(&capped, &p, &clock(10, FRACUNIT / 2)).angle, ANG90);

        let paused = GameClock {
            old_level_time: 10,
            ..clock(10, FRACUNIT / 2)
        };
        assert_eq!(setup(&RenderConfig::default(), &p, &paused).x, p.x);
    }

    #[test]
    fn local_view_turns_between_tics() {
        let lvl = two_room_level();
        let p = moving_player();
        let lv = LocalView {
            angle: ANG1,
            tic_angle: Angle(0),
            old_tic_angle: Angle(0),
            pitch: Angle::from_signed(-(90 * ANG1.signed())),
        };
        let f = ViewSetup::new(0).setup_frame(
            &lvl,
            &RenderConfig::default(),
            1,
            1,
            &p,
            Some(&lv),
            &clock(10, FRACUNIT / 2),
            &Session::default(),
        );
        assert_eq!(f.angle, ANG90 + ANG1);
        // Local look is clamped to the pitch limit.
        assert_eq!(f.pitch, -MAX_PITCH_ANGLE);

        let demo = Session {
            demo_playback: true,
            ..Session::default()
        };
        let f = ViewSetup::new(0).setup_frame(
            &lvl,
            &RenderConfig::default(),
            1,
            1,
            &p,
            Some(&lv),
            &clock(10, FRACUNIT / 2),
            &demo,
        );
        assert_eq!(f.angle, Angle(ANG90.0 / 2));
    }

    #[test]
    fn extralight_rules() {
        let mut p = moving_player();
        p.extralight = 2;
        let c = clock(10, 0);
        let plain = RenderConfig {
            a11y_weapon_flash: false,
            extra_level_brightness: 1,
            ..RenderConfig::default()
        };
        assert_eq!(setup(&plain, &p, &c).extralight, 1);
        let strict = RenderConfig {
            strict: true,
            ..plain.clone()
        };
        assert_eq!(setup(&strict, &p, &c).extralight, 2);
        let flash = RenderConfig {
            a11y_weapon_flash: true,
            ..plain
        };
        assert_eq!(setup(&flash, &p, &c).extralight, 3);
    }

    #[test]
    fn deep_water_colormaps() {
        let mut lvl = two_room_level();
        lvl.sectors.push(Sector {
            interp_floor_h: 32 * FRACUNIT,
            interp_ceil_h: 96 * FRACUNIT,
            bottom_map: 1,
            mid_map: 2,
            top_map: 9,
            ..Sector::default()
        });
        let control = (lvl.sectors.len() - 1) as SectorId;
        lvl.sectors[0].heightsec = Some(control);

        assert_eq!(sector_colormap(&lvl, 0, 10 * FRACUNIT, 4), 1);
        assert_eq!(sector_colormap(&lvl, 0, 50 * FRACUNIT, 4), 2);
        // Above: map 9 does not exist, fall back to the base colormap.
        assert_eq!(sector_colormap(&lvl, 0, 100 * FRACUNIT, 4), 0);
        assert_eq!(sector_colormap(&lvl, 1, 10 * FRACUNIT, 4), 0);
    }

    #[test]
    fn fixed_colormap_is_clamped() {
        let mut p = moving_player();
        p.fixed_colormap = 99;
        let f = setup(&RenderConfig::default(), &p, &clock(10, 0));
        assert_eq!(f.fixed_colormap, Some(ColormapRow { colormap: 0, row: 33 }));
        p.fixed_colormap = 32;
        let f = setup(&RenderConfig::default(), &p, &clock(10, 0));
        assert_eq!(f.fixed_colormap.map(|r| r.row), Some(32));
    }

    #[test]
    fn death_camera_only_when_dead() {
        let cfg = RenderConfig {
            death_camera: true,
            ..RenderConfig::default()
        };
        let mut p = PlayerSnapshot::standing(-32 * FRACUNIT, 0, 0, Angle(0));
        p.ceiling_z = 128 * FRACUNIT;
        assert!(!setup(&cfg, &p, &clock(10, 0)).chasecam);

        p.health = 0;
        p.dead = true;
        let f = setup(&cfg, &p, &clock(10, 0));
        assert!(f.chasecam);
        assert!(f.chase.x < 0);
        assert_eq!(f.z, 6 * FRACUNIT);

        let facing_back = PlayerSnapshot {
            angle: ANG180,
            old_angle: ANG180,
            ..p
        };
        assert!(setup(&cfg, &facing_back, &clock(10, 0)).chase.x > 0);
    }
}
