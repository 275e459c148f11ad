//! Fixed-point BSP software refresh for Doom-style maps.
//!
//! * [`math`]: 16.16 fixed point, binary angles and trig tables
//! * [`world`]: read-only level data, BSP queries and line probes
//! * [`engine`]: projection, light tables, view setup, traversal and the
//!   per-frame [`engine::RendererContext`]
//! * [`renderer`]: the rasterizer seam and a reference software backend
//! * [`sim`]: a fixed-rate tic runner that moves a player around

pub mod engine;
pub mod math;
pub mod renderer;
pub mod sim;
pub mod world;
