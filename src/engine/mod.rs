pub mod bsp;
pub mod chasecam;
pub mod clip;
pub mod config;
pub mod effects;
#[allow(clippy::module_inception)]
pub mod engine;
pub mod lighting;
pub mod player;
pub mod projection;
pub mod surfaces;
pub mod view;

pub use bsp::{BspScratch, MAX_BSP_DEPTH, Traversal, scale_from_global_angle};
pub use clip::{ClipRange, SolidSegs};
pub use config::{BrightnessMode, ChasecamMode, RenderConfig, Viewport};
pub use effects::{FovEffects, Shake, ZoomState};
pub use engine::{HOM_COLOR, RendererContext};
pub use lighting::{LightParams, LightTables};
pub use player::{GameClock, LocalView, PlayerSnapshot, Session};
pub use projection::Projection;
pub use surfaces::{
    ColumnMode, FrameStats, PlaneCandidate, PlaneKey, SpriteCandidate, SurfaceLight,
    VisibleSurfaces, WallSpan,
};
pub use view::{MAX_PITCH_ANGLE, ViewFrame, ViewSetup};
