use glam::IVec2;
use hecs::{Entity, World};
use std::time::{Duration, Instant};

use super::systems::{self, VIEW_HEIGHT};
use super::{Facing, InputCmd, Player, Position, Previous, Velocity};
use crate::engine::{GameClock, PlayerSnapshot};
use crate::math::{Angle, FRACUNIT, Fixed};
use crate::world::Level;

pub const SIM_FPS: u32 = 35;
const TIC: Duration = Duration::from_micros(1_000_000 / SIM_FPS as u64);
/// Tics run at most per pump; a longer stall is dropped, not replayed.
const MAX_CATCH_UP: u32 = 10;

/// Share of a tic `elapsed` covers, in `0..FRACUNIT`; a stalled pump holds
/// just short of the next tic.
fn tic_fraction(elapsed: Duration) -> Fixed {
    let t = elapsed.as_secs_f64() / TIC.as_secs_f64();
    ((t * FRACUNIT as f64) as Fixed).clamp(0, FRACUNIT - 1)
}

/// Owns the ECS world and drives all game‑logic systems.
pub struct TicRunner {
    world: World,
    player: Entity,
    input: InputCmd,
    last: Instant,
    game_tic: u64,
    level_time: u32,
    old_level_time: u32,
}

impl TicRunner {
    /// Spawn the player at `(x, y)` on the floor below, facing `angle`.
    pub fn new(level: &Level, x: Fixed, y: Fixed, angle: Angle) -> Self {
        let mut world = World::new();
        let pos = IVec2::new(x, y);
        let floor = level.sectors[level.sector_at(x, y) as usize].floor_h;
        let player = world.spawn((
            Position(pos, floor),
            Velocity::default(),
            Facing(angle),
            Previous {
                pos,
                z: floor,
                angle,
            },
            Player {
                radius: 16 * FRACUNIT,
                health: 100,
                interp: true,
            },
        ));
        Self {
            world,
            player,
            input: InputCmd::default(),
            last: Instant::now(),
            game_tic: 0,
            level_time: 0,
            old_level_time: 0,
        }
    }

    #[inline]
    pub fn world(&self) -> &hecs::World {
        &self.world
    }

    #[inline]
    pub fn world_mut(&mut self) -> &mut hecs::World {
        &mut self.world
    }

    #[inline]
    pub fn player(&self) -> Entity {
        self.player
    }

    /// Command applied by every following tic until replaced.
    pub fn set_input(&mut self, cmd: InputCmd) {
        self.input = cmd;
    }

    /// Advance enough tics to synchronise simulation with real time.
    /// Returns how many ran.
    pub fn pump(&mut self, level: &Level) -> u32 {
        let mut ran = 0;
        while self.last.elapsed() >= TIC {
            if ran == MAX_CATCH_UP {
                self.last = Instant::now();
                break;
            }
            self.tick(level);
            self.last += TIC;
            ran += 1;
        }
        ran
    }

    /// Run exactly `n` tics, ignoring the wall clock.
    pub fn run_tics(&mut self, level: &Level, n: u32) {
        for _ in 0..n {
            self.tick(level);
        }
        self.last = Instant::now();
    }

    /// How far real time is into the next tic (16.16).
    pub fn frac(&self) -> Fixed {
        tic_fraction(self.last.elapsed())
    }

    pub fn clock(&self) -> GameClock {
        GameClock {
            game_tic: self.game_tic,
            level_time: self.level_time,
            old_level_time: self.old_level_time,
            frac: self.frac(),
        }
    }

    /// Jump to `(x, y)` without interpolating across the gap.
    pub fn teleport(&mut self, level: &Level, x: Fixed, y: Fixed, angle: Angle) {
        let floor = level.sectors[level.sector_at(x, y) as usize].floor_h;
        if let Ok(mut q) = self
            .world
            .query_one::<(&mut Position, &mut Previous, &mut Facing, &mut Player)>(self.player)
        {
            if let Some((pos, prev, facing, player)) = q.get() {
                *pos = Position(IVec2::new(x, y), floor);
                *prev = Previous {
                    pos: pos.0,
                    z: floor,
                    angle,
                };
                facing.0 = angle;
                player.interp = false;
            }
        }
    }

    /// What the refresh needs to know about the player this frame.
    pub fn snapshot(&self, level: &Level) -> Option<PlayerSnapshot> {
        let mut q = self
            .world
            .query_one::<(&Position, &Previous, &Facing, &Velocity, &Player)>(self.player)
            .ok()?;
        let (pos, prev, facing, vel, player) = q.get()?;
        let sector = level.sector_at(pos.0.x, pos.0.y);
        Some(PlayerSnapshot {
            x: pos.0.x,
            y: pos.0.y,
            z: pos.1,
            old_x: prev.pos.x,
            old_y: prev.pos.y,
            old_z: prev.z,
            view_z: pos.1 + VIEW_HEIGHT,
            old_view_z: prev.z + VIEW_HEIGHT,
            angle: facing.0,
            old_angle: prev.angle,
            momx: vel.0.x,
            momy: vel.0.y,
            radius: player.radius,
            health: player.health,
            interp: player.interp,
            sector,
            ceiling_z: level.sectors[sector as usize].ceil_h,
            is_console_player: true,
            ..PlayerSnapshot::default()
        })
    }

    /* ---------------------------------------------------------------- */
    /* internal: run one fixed‑rate game tic                             */
    /* ---------------------------------------------------------------- */
    fn tick(&mut self, level: &Level) {
        systems::remember(&mut self.world);
        systems::player_input(&mut self.world, self.player, self.input);
        systems::movement(&mut self.world, level);

        self.game_tic += 1;
        self.old_level_time = self.level_time;
        self.level_time += 1;
    }
}

/*──────────────────────────────── Tests ──────────────────────────────*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ANG180;
    use crate::world::two_room_level;

    fn forward() -> InputCmd {
        InputCmd {
            forward: 1.0,
            ..InputCmd::default()
        }
    }

    #[test]
    fn walks_forward_at_walk_speed() {
        let level = two_room_level();
        let mut sim = TicRunner::new(&level, -128 * FRACUNIT, 0, Angle(0));
        sim.set_input(forward());
        sim.run_tics(&level, 4);
        let p = sim.snapshot(&level).expect("player exists");
        assert!((p.x + 96 * FRACUNIT).abs() < FRACUNIT, "x {}", p.x);
        assert!(p.y.abs() < FRACUNIT);
        // Previous tic's pose is kept for interpolation.
        assert!((p.x - p.old_x - 8 * FRACUNIT).abs() < FRACUNIT);
        assert_eq!(p.view_z, 41 * FRACUNIT);
    }

    #[test]
    fn walls_stop_the_player() {
        let level = two_room_level();
        let mut sim = TicRunner::new(&level, -200 * FRACUNIT, 0, ANG180);
        sim.set_input(forward());
        sim.run_tics(&level, 20);
        let p = sim.snapshot(&level).expect("player exists");
        // Held a body radius plus at most one step short of the west wall.
        assert!(p.x >= -240 * FRACUNIT, "x {}", p.x);
        assert_eq!(p.sector, 0);
    }

    #[test]
    fn steps_up_into_the_east_room() {
        let level = two_room_level();
        let mut sim = TicRunner::new(&level, -12 * FRACUNIT, 0, Angle(0));
        sim.set_input(forward());
        sim.run_tics(&level, 4);
        let p = sim.snapshot(&level).expect("player exists");
        assert_eq!(p.sector, 1);
        assert_eq!(p.z, 16 * FRACUNIT);
        assert_eq!(p.ceiling_z, 112 * FRACUNIT);
    }

    #[test]
    fn clock_counts_tics() {
        let level = two_room_level();
        let mut sim = TicRunner::new(&level, 0, 0, Angle(0));
        sim.run_tics(&level, 3);
        let c = sim.clock();
        assert_eq!((c.game_tic, c.level_time, c.old_level_time), (3, 3, 2));
        assert!((0..FRACUNIT).contains(&c.frac));
    }

    #[test]
    fn tic_fraction_never_reaches_a_whole_tic() {
        assert_eq!(tic_fraction(Duration::ZERO), 0);
        assert_eq!(tic_fraction(TIC / 2), FRACUNIT / 2);
        assert_eq!(tic_fraction(TIC), FRACUNIT - 1);
        assert_eq!(tic_fraction(Duration::from_secs(60)), FRACUNIT - 1);
    }

    #[test]
    fn teleport_breaks_interpolation_for_one_tic() {
        let level = two_room_level();
        let mut sim = TicRunner::new(&level, -128 * FRACUNIT, 0, Angle(0));
        sim.teleport(&level, 128 * FRACUNIT, 64 * FRACUNIT, ANG180);
        let p = sim.snapshot(&level).expect("player exists");
        assert!(!p.interp);
        assert_eq!((p.x, p.old_x), (128 * FRACUNIT, 128 * FRACUNIT));
        assert_eq!(p.z, 16 * FRACUNIT);
        sim.run_tics(&level, 1);
        assert!(sim.snapshot(&level).expect("player exists").interp);
    }
}
