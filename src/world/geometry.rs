use bitflags::bitflags;
use glam::IVec2;

use crate::math::{Angle, Fixed};
use crate::world::texture::{FlatId, TextureId};

pub type SubsectorId = u32;
pub type LinedefId = u32;
pub type SegmentId = u32;
pub type VertexId = u32;
pub type SidedefId = u32;
pub type SectorId = u32;
pub type NodeId = u32;
pub type ThingId = u32;

/// A node child reference: either another node or, with
/// [`SUBSECTOR_BIT`](crate::world::SUBSECTOR_BIT) set, a subsector leaf.
pub type NodeChild = u32;

/// Runtime snapshot of one map (immutable while rendering).
///
/// All coordinates are 16.16 fixed point.
#[derive(Debug, Default)]
pub struct Level {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub sectors: Vec<Sector>,
    pub sidedefs: Vec<Sidedef>,
    pub linedefs: Vec<Linedef>,
    pub segs: Vec<Seg>,
    pub subsectors: Vec<Subsector>,
    pub nodes: Vec<Node>,
    pub things: Vec<Thing>,
    /// Flat that marks a ceiling as open sky.
    pub sky_flat: Option<FlatId>,
}

/*----------------------- simple primitives --------------------------*/

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vertex {
    pub pos: IVec2,
}

/// Doom bounding box order: top, bottom, left, right.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BBox {
    pub top: Fixed,
    pub bottom: Fixed,
    pub left: Fixed,
    pub right: Fixed,
}

impl BBox {
    pub fn new(left: Fixed, bottom: Fixed, right: Fixed, top: Fixed) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    pub fn contains(&self, x: Fixed, y: Fixed) -> bool {
        x >= self.left && x <= self.right && y >= self.bottom && y <= self.top
    }
}

/*--------------------------- sectors --------------------------------*/

#[derive(Clone, Debug)]
pub struct Sector {
    pub floor_h: Fixed,
    pub ceil_h: Fixed,
    /// Heights interpolated for the current render frame.
    pub interp_floor_h: Fixed,
    pub interp_ceil_h: Fixed,
    pub floor_pic: FlatId,
    pub ceil_pic: FlatId,
    pub light: i16,
    pub special: i16,
    pub tag: i16,
    /// Linked control sector for "deep water" style colormap changes.
    pub heightsec: Option<SectorId>,
    /// Colormap indices used when the view is below / between / above the
    /// control sector's planes.
    pub bottom_map: i32,
    pub mid_map: i32,
    pub top_map: i32,
}

impl Default for Sector {
    fn default() -> Self {
        Self {
            floor_h: 0,
            ceil_h: 0,
            interp_floor_h: 0,
            interp_ceil_h: 0,
            floor_pic: 0,
            ceil_pic: 0,
            light: 160,
            special: 0,
            tag: 0,
            heightsec: None,
            bottom_map: 0,
            mid_map: 0,
            top_map: 0,
        }
    }
}

/*--------------------------- linedefs -------------------------------*/

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct LinedefFlags: u16 {
        const IMPASSABLE      = 0x0001;
        const BLOCK_MONSTERS  = 0x0002;
        const TWO_SIDED       = 0x0004;
        const UPPER_UNPEGGED  = 0x0010;
        const LOWER_UNPEGGED  = 0x0020;
        const SECRET          = 0x0040;
        const BLOCK_SOUND     = 0x0080;
        const NOT_ON_MAP      = 0x0200;
        const ALREADY_ON_MAP  = 0x1000; // editor flag
    }
}

#[derive(Clone, Debug)]
pub struct Linedef {
    pub v1: VertexId,
    pub v2: VertexId,
    pub flags: LinedefFlags,
    pub special: u16,
    pub tag: u16,
    pub right_sidedef: Option<SidedefId>,
    pub left_sidedef: Option<SidedefId>,
}

/*--------------------------- sidedefs -------------------------------*/

#[derive(Clone, Debug)]
pub struct Sidedef {
    pub x_off: Fixed,
    pub y_off: Fixed,
    pub upper: TextureId,
    pub lower: TextureId,
    pub middle: TextureId,
    pub sector: SectorId,
}

/*------------------------ segs / subsectors -------------------------*/

#[derive(Clone, Debug)]
pub struct Seg {
    pub v1: VertexId,
    pub v2: VertexId,
    pub angle: Angle,
    pub linedef: LinedefId,
    /// 0 = seg runs along the linedef's right side, 1 = left side.
    pub dir: u16,
    pub offset: Fixed,
}

#[derive(Clone, Debug)]
pub struct Subsector {
    pub first_seg: SegmentId,
    pub seg_count: u32,
    pub sector: SectorId,
}

/*------------------------------ nodes -------------------------------*/

#[derive(Clone, Debug)]
pub struct Node {
    /// Partition line origin and direction.
    pub x: Fixed,
    pub y: Fixed,
    pub dx: Fixed,
    pub dy: Fixed,
    /// Bounding boxes of the right (0) and left (1) children.
    pub bbox: [BBox; 2],
    pub child: [NodeChild; 2],
}

/*------------------------- game objects -----------------------------*/

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct ThingFlags: u32 {
        /// Partial invisibility: drawn with the fuzz effect.
        const SHADOW        = 0x0004_0000;
        /// Boom translucency.
        const TRANSLUCENT   = 0x8000_0000;
        /// Two bits selecting a colour translation table.
        const TRANSLATION   = 0x0c00_0000;
    }
}

pub const THING_TRANSLATION_SHIFT: u32 = 26;

#[derive(Clone, Debug)]
pub struct Thing {
    pub pos: IVec2,
    pub z: Fixed,
    pub angle: Angle,
    pub radius: Fixed,
    pub height: Fixed,
    pub type_id: u16,
    pub flags: ThingFlags,
    pub sector: SectorId,
}
