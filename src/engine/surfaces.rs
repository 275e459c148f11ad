//! ----------------------------------------------------------------------------
//!  Visible-surface list
//!
//!  Everything traversal found this frame, in the order it was found:
//!  ▸ wall spans, strictly front to back,
//!  ▸ floor / ceiling plane candidates, merged by (height, flat, light),
//!  ▸ sprite candidates, one per thing in every visited sector.
//!
//!  Each entry carries its resolved colormap rows; downstream stages turn
//!  them into pixels and never look at the light tables' inputs again.
//! ----------------------------------------------------------------------------

use crate::math::{Angle, Fixed};
use crate::world::{
    ColormapRow, FlatId, SectorId, SegmentId, TextureId, THING_TRANSLATION_SHIFT, ThingFlags,
    ThingId,
};

/// How one drawn column maps texels to the screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColumnMode {
    #[default]
    Normal,
    /// Partial invisibility: darken what is already there.
    Fuzz,
    Translucent,
    /// Colour-translated through table `n`.
    Translated(u8),
}

impl ColumnMode {
    /// Draw mode for a thing's flags. `strict` keeps the classic set only.
    pub fn for_thing(flags: ThingFlags, strict: bool) -> Self {
        if flags.contains(ThingFlags::SHADOW) {
            ColumnMode::Fuzz
        } else if flags.contains(ThingFlags::TRANSLUCENT) && !strict {
            ColumnMode::Translucent
        } else if flags.intersects(ThingFlags::TRANSLATION) {
            ColumnMode::Translated(
                ((flags & ThingFlags::TRANSLATION).bits() >> THING_TRANSLATION_SHIFT) as u8,
            )
        } else {
            ColumnMode::Normal
        }
    }
}

/// Light for a run of columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceLight {
    /// Forced row for the whole frame.
    Fixed(ColormapRow),
    /// Row chosen per column from the scale tables at this light level.
    Scaled { colormap: u16, level: usize },
}

/// One wall seen through `x1..=x2`, as the legacy draw-seg.
#[derive(Clone, Debug, PartialEq)]
pub struct WallSpan {
    pub seg: SegmentId,
    pub front: SectorId,
    pub back: Option<SectorId>,
    pub x1: i32,
    pub x2: i32,

    /// Projected scale at `x1`, and its per-column step.
    pub scale1: Fixed,
    pub scale2: Fixed,
    pub scale_step: Fixed,
    /// Perpendicular distance from the view point to the wall line.
    pub distance: Fixed,
    pub normal_angle: Angle,
    /// Texture offset along the wall at its view-perpendicular foot.
    pub offset: Fixed,

    /// Plane heights relative to the eye.
    pub world_top: Fixed,
    pub world_bottom: Fixed,
    pub world_high: Fixed,
    pub world_low: Fixed,

    pub top_texture: TextureId,
    pub mid_texture: TextureId,
    pub bottom_texture: TextureId,
    /// Two-sided line with a see-through middle texture.
    pub masked_texture: TextureId,
    /// Covers the columns completely (one-sided or closed).
    pub solid: bool,

    pub mark_floor: bool,
    pub mark_ceiling: bool,
    pub floor_plane: Option<usize>,
    pub ceiling_plane: Option<usize>,

    pub light: SurfaceLight,
}

/// What makes two flats mergeable into one plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlaneKey {
    pub height: Fixed,
    pub pic: FlatId,
    pub light: i16,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlaneCandidate {
    pub key: PlaneKey,
    pub sky: bool,
    pub min_x: i32,
    pub max_x: i32,
    pub light: SurfaceLight,
}

impl PlaneCandidate {
    /// No column has touched this plane yet.
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpriteCandidate {
    pub thing: ThingId,
    pub x1: i32,
    pub x2: i32,
    /// Projected scale; larger is nearer.
    pub scale: Fixed,
    /// View-space depth.
    pub depth: Fixed,
    /// Top and bottom relative to the eye.
    pub gz: Fixed,
    pub gzt: Fixed,
    pub mode: ColumnMode,
    /// `None` for fuzz, which shades from the framebuffer.
    pub light: Option<ColormapRow>,
    /// Emitted by the close-range pass rather than by projection.
    pub nearby: bool,
}

/// Per-frame counters, logged at trace level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub nodes: u32,
    pub subsectors: u32,
    pub boxes_culled: u32,
    pub segs: u32,
    pub walls: u32,
    pub planes: u32,
    pub sprites: u32,
    pub nearby: u32,
}

#[derive(Debug, Default)]
pub struct VisibleSurfaces {
    pub walls: Vec<WallSpan>,
    pub planes: Vec<PlaneCandidate>,
    pub sprites: Vec<SpriteCandidate>,
    /// Subsectors in the order traversal reached them.
    pub subsectors: Vec<u32>,
}

impl VisibleSurfaces {
    pub fn clear(&mut self) {
        self.walls.clear();
        self.planes.clear();
        self.sprites.clear();
        self.subsectors.clear();
    }

    /// Index of the plane for `key`, created empty if this is its first use.
    pub fn find_plane(&mut self, key: PlaneKey, sky: bool, light: SurfaceLight) -> usize {
        // Sky ignores height and light; one plane serves all of it.
        let key = if sky {
            PlaneKey {
                height: 0,
                light: 0,
                ..key
            }
        } else {
            key
        };
        if let Some(i) = self.planes.iter().position(|p| p.key == key) {
            return i;
        }
        self.planes.push(PlaneCandidate {
            key,
            sky,
            min_x: i32::MAX,
            max_x: i32::MIN,
            light,
        });
        self.planes.len() - 1
    }

    /// Widen plane `idx` to include `x1..=x2`.
    pub fn extend_plane(&mut self, idx: usize, x1: i32, x2: i32) {
        let p = &mut self.planes[idx];
        p.min_x = p.min_x.min(x1);
        p.max_x = p.max_x.max(x2);
    }

    /// Sprites far to near, the order masked drawing wants.
    pub fn sorted_sprites(&self) -> Vec<&SpriteCandidate> {
        let mut v: Vec<&SpriteCandidate> = self.sprites.iter().collect();
        v.sort_by_key(|s| s.scale);
        v
    }
}

/*──────────────────────────────── Tests ──────────────────────────────*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::FRACUNIT;

    const LIGHT: SurfaceLight = SurfaceLight::Scaled {
        colormap: 0,
        level: 8,
    };

    fn key(height: i32, pic: FlatId, light: i16) -> PlaneKey {
        PlaneKey {
            height: height * FRACUNIT,
            pic,
            light,
        }
    }

    #[test]
    fn planes_merge_by_key() {
        let mut s = VisibleSurfaces::default();
        let a = s.find_plane(key(0, 1, 160), false, LIGHT);
        let b = s.find_plane(key(0, 1, 160), false, LIGHT);
        let c = s.find_plane(key(0, 1, 128), false, LIGHT);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(s.planes[a].is_empty());
        s.extend_plane(a, 10, 20);
        s.extend_plane(a, 5, 12);
        assert_eq!((s.planes[a].min_x, s.planes[a].max_x), (5, 20));
    }

    #[test]
    fn sky_planes_share_one_entry() {
        let mut s = VisibleSurfaces::default();
        let a = s.find_plane(key(128, 9, 160), true, LIGHT);
        let b = s.find_plane(key(112, 9, 100), true, LIGHT);
        assert_eq!(a, b);
        assert_eq!(s.planes.len(), 1);
    }

    #[test]
    fn column_modes_from_flags() {
        assert_eq!(ColumnMode::for_thing(ThingFlags::SHADOW, false), ColumnMode::Fuzz);
        assert_eq!(ColumnMode::for_thing(ThingFlags::TRANSLUCENT, false), ColumnMode::Translucent);
        assert_eq!(ColumnMode::for_thing(ThingFlags::TRANSLUCENT, true), ColumnMode::Normal);
        let red = ThingFlags::from_bits_retain(2 << THING_TRANSLATION_SHIFT);
        assert_eq!(ColumnMode::for_thing(red, false), ColumnMode::Translated(2));
        assert_eq!(ColumnMode::for_thing(ThingFlags::empty(), false), ColumnMode::Normal);
    }
}
