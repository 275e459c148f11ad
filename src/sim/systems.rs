use glam::IVec2;
use hecs::{Entity, World};

use super::{Facing, InputCmd, Player, Position, Previous, Velocity};
use crate::math::{
    Angle, FRACUNIT, Fixed, fine_cosine, fine_sine, fixed_div, fixed_mul, point_to_dist,
};
use crate::world::Level;

pub const WALK_SPEED: Fixed = 8 * FRACUNIT; // map-units / tic
pub const RUN_SPEED: Fixed = 16 * FRACUNIT;
pub const TURN_PER_TIC: Angle = Angle(640 << 16); // vanilla angleturn
pub const MAX_STEP_HEIGHT: Fixed = 24 * FRACUNIT; // max step without a jump button
pub const VIEW_HEIGHT: Fixed = 41 * FRACUNIT;

/* ── Interpolation bookkeeping ────────────────────────────────────── */
pub fn remember(world: &mut World) {
    for (_, (pos, facing, prev)) in world.query_mut::<(&Position, &Facing, &mut Previous)>() {
        *prev = Previous {
            pos: pos.0,
            z: pos.1,
            angle: facing.0,
        };
    }
    for (_, player) in world.query_mut::<&mut Player>() {
        player.interp = true;
    }
}

/* ── Input ────────────────────────────────────────────────────────── */
pub fn player_input(world: &mut World, player: Entity, cmd: InputCmd) {
    if let Ok(mut q) = world.query_one::<(&mut Facing, &mut Velocity)>(player) {
        if let Some((facing, vel)) = q.get() {
            /* 1. turn */
            if cmd.turn != 0.0 {
                let turn = cmd.turn.clamp(-1.0, 1.0) * TURN_PER_TIC.0 as f32;
                facing.0 += Angle::from_signed(turn as i32);
            }

            let speed = (if cmd.run { RUN_SPEED } else { WALK_SPEED }) as f32;

            /* 2. wish-vel */
            if cmd.forward != 0.0 || cmd.strafe != 0.0 {
                let fine = facing.0.fine();
                let (cos, sin) = (fine_cosine(fine), fine_sine(fine));
                let fwd = (cmd.forward.clamp(-1.0, 1.0) * speed) as Fixed;
                let side = (cmd.strafe.clamp(-1.0, 1.0) * speed) as Fixed;
                vel.0 = IVec2::new(
                    fixed_mul(fwd, cos) + fixed_mul(side, sin),
                    fixed_mul(fwd, sin) - fixed_mul(side, cos),
                );
            } else {
                vel.zero_xy();
            }
        }
    }
}

/* ── Movement ─────────────────────────────────────────────────────── */
pub fn movement(world: &mut World, level: &Level) {
    for (_, (pos, vel, player)) in world.query_mut::<(&mut Position, &Velocity, &Player)>() {
        if vel.0 == IVec2::ZERO {
            continue;
        }
        let to = try_move(level, pos.0, pos.1, vel.0, player.radius);
        let sector = level.sector_at(to.x, to.y);
        pos.0 = to;
        pos.1 = level.sectors[sector as usize].floor_h;
    }
}

/// Where a move of `delta` from `from` ends: the whole move, or failing
/// that a slide along one axis, or nowhere.
fn try_move(level: &Level, from: IVec2, feet: Fixed, delta: IVec2, radius: Fixed) -> IVec2 {
    // Probing at step height lets low ledges through.
    let z = feet + MAX_STEP_HEIGHT;
    for d in [delta, IVec2::new(delta.x, 0), IVec2::new(0, delta.y)] {
        if d == IVec2::ZERO {
            continue;
        }
        // Reach `radius` past the destination so the body stays clear.
        let len = point_to_dist(0, 0, d.x, d.y).max(1);
        let reach = fixed_div(len + radius, len);
        let (px, py) = (fixed_mul(d.x, reach), fixed_mul(d.y, reach));
        if level.probe(from.x, from.y, z, px, py, 0).is_none() {
            return from + d;
        }
    }
    from
}
