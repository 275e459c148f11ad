//! Read-only inputs the refresh takes from the game each frame.

use crate::math::{Angle, Fixed, FRACUNIT};
use crate::world::SectorId;

/// Everything the refresh needs to know about the viewing player, for the
/// current tic and the one before it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayerSnapshot {
    pub x: Fixed,
    pub y: Fixed,
    /// Feet height.
    pub z: Fixed,
    pub old_x: Fixed,
    pub old_y: Fixed,
    pub old_z: Fixed,
    /// Eye height in world space.
    pub view_z: Fixed,
    pub old_view_z: Fixed,

    pub angle: Angle,
    pub old_angle: Angle,
    /// Look up / down, positive is up.
    pub pitch: Angle,
    pub old_pitch: Angle,
    /// Weapon kick added on top of the look pitch.
    pub recoil_pitch: Angle,
    pub old_recoil_pitch: Angle,
    /// Pain flinch added on top of the look pitch.
    pub flinch: Angle,
    pub old_flinch: Angle,

    pub momx: Fixed,
    pub momy: Fixed,
    pub radius: Fixed,

    pub health: i32,
    /// Player state is "dead", as opposed to merely at zero health.
    pub dead: bool,
    /// Cleared by the game for a tic after a discontinuity (teleport, spawn).
    pub interp: bool,
    /// Tics of frozen input after a teleport.
    pub reaction_time: i32,
    /// Pitch is being re-centred by the game.
    pub centering: bool,
    /// Light steps from the weapon flash.
    pub extralight: i32,
    /// Non-zero forces this colormap row for the whole view.
    pub fixed_colormap: i32,

    /// Sector the player's subsector belongs to.
    pub sector: SectorId,
    /// Lowest ceiling touching the player's bounding box.
    pub ceiling_z: Fixed,
    pub is_console_player: bool,
}

impl PlayerSnapshot {
    /// A live console player standing still at `(x, y)` on `floor`.
    pub fn standing(x: Fixed, y: Fixed, floor: Fixed, angle: Angle) -> Self {
        let view_z = floor + 41 * FRACUNIT;
        Self {
            x,
            y,
            z: floor,
            old_x: x,
            old_y: y,
            old_z: floor,
            view_z,
            old_view_z: view_z,
            angle,
            old_angle: angle,
            radius: 16 * FRACUNIT,
            health: 100,
            interp: true,
            ceiling_z: Fixed::MAX,
            is_console_player: true,
            ..Self::default()
        }
    }
}

/// Input applied since the last tic, kept by the input layer so the view can
/// turn at frame rate rather than tic rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LocalView {
    /// Accumulated turn not yet consumed by a tic.
    pub angle: Angle,
    /// Turn applied by the current and previous tic.
    pub tic_angle: Angle,
    pub old_tic_angle: Angle,
    /// Accumulated look not yet consumed by a tic.
    pub pitch: Angle,
}

/// Clock values the refresh interpolates and gates effects with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GameClock {
    /// Monotonic tic counter; effects advance when it changes.
    pub game_tic: u64,
    /// Tics since the level started; stops while paused.
    pub level_time: u32,
    /// `level_time` as of the previous tic.
    pub old_level_time: u32,
    /// How far the frame is between the previous and current tic (16.16).
    pub frac: Fixed,
}

/// Game session flags that gate local view and effect timing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub demo_playback: bool,
    pub netgame: bool,
    pub solonet: bool,
    pub paused: bool,
    pub menu_active: bool,
    /// Overlay map covers the view; stop after traversal.
    pub automap: bool,
}

impl Session {
    /// Effects stand still while paused, or behind a menu in a local game.
    #[inline]
    pub fn frozen(&self) -> bool {
        self.paused || (self.menu_active && !self.demo_playback && !self.netgame)
    }
}
