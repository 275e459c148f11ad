//! Rasterization abstraction layer.
//!
//! *The refresh core never touches a pixel buffer directly.*
//! It fills a [`VisibleSurfaces`] list (front-to-back) and then hands it, one
//! stage at a time, to a type that implements [`Rasterizer`].
//!
//! * You can plug multiple back-ends without changing the traversal.
//! * Stages are called in a fixed order: walls, planes, then masked
//!   (sprites and see-through middles) with the current fuzz phase.

use crate::engine::{
    config::Viewport, lighting::LightTables, projection::Projection, surfaces::VisibleSurfaces,
    view::ViewFrame,
};
use crate::world::Level;

/// Pixel format of the software frame-buffer (0x00RRGGBB).
pub type Rgba = u32;

/// Everything one frame's drawing stages read. Borrowed, never stored.
#[derive(Clone, Copy)]
pub struct Scene<'a> {
    pub level: &'a Level,
    pub view: &'a ViewFrame,
    pub projection: &'a Projection,
    pub lights: &'a LightTables,
    pub surfaces: &'a VisibleSurfaces,
}

/// A rasterizer that owns an internal scratch buffer for the whole frame.
///
/// `end_frame` hands the finished buffer to a user-supplied closure.
pub trait Rasterizer {
    /// (Re)allocate internal scratch for the view window and reset clipping.
    fn begin_frame(&mut self, viewport: &Viewport);

    /// Flood the view with palette index `color` (hall-of-mirrors check).
    fn fill_view(&mut self, color: u8);

    /// Wall spans, in list order.
    fn draw_walls(&mut self, scene: &Scene<'_>);

    /// Floors, ceilings and sky.
    fn draw_planes(&mut self, scene: &Scene<'_>);

    /// Sprites and masked middles, back to front. `fuzz_phase` offsets the
    /// partial-invisibility pattern so it crawls from frame to frame.
    fn draw_masked(&mut self, scene: &Scene<'_>, fuzz_phase: usize);

    /// Finish the frame and **loan** the finished buffer to `submit`.
    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize);
}

/// Non-blocking "process whatever input and network traffic is pending"
/// hook, called between frame stages.
pub trait EventPump {
    fn pump(&mut self);
}

impl<F: FnMut()> EventPump for F {
    #[inline]
    fn pump(&mut self) {
        self()
    }
}

/// Pump that does nothing, for offline rendering and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPump;

impl EventPump for NoPump {
    #[inline]
    fn pump(&mut self) {}
}

pub mod software;
pub use software::Software;
