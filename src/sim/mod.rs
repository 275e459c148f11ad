mod components;
mod systems;
mod tic;

pub use components::{Facing, InputCmd, Player, Position, Previous, Velocity};
pub use systems::{
    MAX_STEP_HEIGHT, RUN_SPEED, TURN_PER_TIC, VIEW_HEIGHT, WALK_SPEED, movement, player_input,
};
pub use tic::{SIM_FPS, TicRunner};
