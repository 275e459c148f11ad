mod bsp;
mod builder;
mod geometry;
mod texture;
mod trace;

pub use bsp::{CHILD_MASK, LevelError, SUBSECTOR_BIT};

pub use builder::{LevelBuilder, long_corridor_level, two_room_level};

pub use geometry::{
    BBox, Level, Linedef, LinedefFlags, LinedefId, Node, NodeChild, NodeId, Sector, SectorId,
    Seg, SegmentId, Sidedef, SidedefId, Subsector, SubsectorId, THING_TRANSLATION_SHIFT, Thing,
    ThingFlags, ThingId, Vertex, VertexId,
};

pub use texture::{
    COLORMAP_ROWS, Colormap, ColormapRow, Colormaps, FlatId, INVULN_ROW, NO_TEXTURE, NUMCOLORMAPS,
    Palette, TextureId,
};

pub use trace::{PROBE_BACKOFF, ProbeHit};
