use glam::IVec2;

use crate::math::{Angle, Fixed};

/// World‑space position in 16.16 map units. z (feet) is separate to match
/// Doom’s 2½‑D maths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position(pub IVec2, pub Fixed);

/// Movement per tic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Velocity(pub IVec2);

impl Velocity {
    #[inline]
    pub fn zero_xy(&mut self) {
        self.0 = IVec2::ZERO;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Facing(pub Angle);

/// Pose at the start of the current tic, for frame interpolation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Previous {
    pub pos: IVec2,
    pub z: Fixed,
    pub angle: Angle,
}

/// The controlled player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    pub radius: Fixed,
    pub health: i32,
    /// Cleared on teleport until the next tic starts.
    pub interp: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct InputCmd {
    pub forward: f32, // –1 … +1
    pub strafe: f32,  // –1 … +1  (left / right)
    pub turn: f32,    // –1 … +1  (right / left)
    pub run: bool,    // Shift
}
