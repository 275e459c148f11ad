//! Programmatic level construction.
//!
//! Map loading lives outside this crate; the builder exists so tests and the
//! demo viewer can assemble small, valid levels by hand. Coordinates passed
//! in are whole map units and are stored as 16.16 fixed point.

use glam::IVec2;

use crate::math::{Fixed, int_to_fixed, point_to_angle_wide};
use crate::world::{
    BBox, CHILD_MASK, FlatId, Level, LevelError, Linedef, LinedefFlags, LinedefId, Node, NodeChild,
    SUBSECTOR_BIT, Sector, SectorId, Seg, SegmentId, Sidedef, Subsector, SubsectorId, TextureId,
    Thing, ThingFlags, ThingId, Vertex, VertexId,
};

pub struct LevelBuilder {
    level: Level,
}

impl LevelBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            level: Level {
                name: name.to_string(),
                ..Level::default()
            },
        }
    }

    pub fn vertex(&mut self, x: i32, y: i32) -> VertexId {
        self.level.vertices.push(Vertex {
            pos: IVec2::new(int_to_fixed(x), int_to_fixed(y)),
        });
        (self.level.vertices.len() - 1) as VertexId
    }

    /// Plain sector; flats default to 1 (floor) and 2 (ceiling).
    pub fn sector(&mut self, floor: i32, ceil: i32, light: i16) -> SectorId {
        self.sector_with(Sector {
            floor_h: int_to_fixed(floor),
            ceil_h: int_to_fixed(ceil),
            floor_pic: 1,
            ceil_pic: 2,
            light,
            ..Sector::default()
        })
    }

    pub fn sector_with(&mut self, mut sector: Sector) -> SectorId {
        sector.interp_floor_h = sector.floor_h;
        sector.interp_ceil_h = sector.ceil_h;
        self.level.sectors.push(sector);
        (self.level.sectors.len() - 1) as SectorId
    }

    pub fn set_ceiling_pic(&mut self, sector: SectorId, pic: FlatId) {
        self.level.sectors[sector as usize].ceil_pic = pic;
    }

    pub fn sky(&mut self, flat: FlatId) {
        self.level.sky_flat = Some(flat);
    }

    /// Linedef with a right sidedef in `front` and, when `back` is given,
    /// a left sidedef there as well (the line becomes two-sided).
    pub fn line(
        &mut self,
        v1: VertexId,
        v2: VertexId,
        front: SectorId,
        back: Option<SectorId>,
        texture: TextureId,
    ) -> LinedefId {
        let right = self.sidedef(front, texture, back.is_some());
        let left = back.map(|b| self.sidedef(b, texture, true));
        let mut flags = LinedefFlags::empty();
        if back.is_some() {
            flags |= LinedefFlags::TWO_SIDED;
        } else {
            flags |= LinedefFlags::IMPASSABLE;
        }
        self.level.linedefs.push(Linedef {
            v1,
            v2,
            flags,
            special: 0,
            tag: 0,
            right_sidedef: Some(right),
            left_sidedef: left,
        });
        (self.level.linedefs.len() - 1) as LinedefId
    }

    fn sidedef(&mut self, sector: SectorId, texture: TextureId, two_sided: bool) -> u32 {
        self.level.sidedefs.push(Sidedef {
            x_off: 0,
            y_off: 0,
            upper: texture,
            lower: texture,
            middle: if two_sided { 0 } else { texture },
            sector,
        });
        (self.level.sidedefs.len() - 1) as u32
    }

    /// Seg along `line`; `dir == 1` walks it backwards on the left side.
    pub fn seg(&mut self, line: LinedefId, dir: u16) -> SegmentId {
        let ld = &self.level.linedefs[line as usize];
        let (v1, v2) = if dir == 0 { (ld.v1, ld.v2) } else { (ld.v2, ld.v1) };
        let a = self.level.vertices[v1 as usize].pos;
        let b = self.level.vertices[v2 as usize].pos;
        self.level.segs.push(Seg {
            v1,
            v2,
            angle: point_to_angle_wide(a.x, a.y, b.x, b.y),
            linedef: line,
            dir,
            offset: 0,
        });
        (self.level.segs.len() - 1) as SegmentId
    }

    /// Subsector over the contiguous segs `first .. first + count`; the
    /// sector comes from the first seg's facing sidedef.
    pub fn subsector(&mut self, first: SegmentId, count: u32) -> NodeChild {
        let seg = &self.level.segs[first as usize];
        let ld = &self.level.linedefs[seg.linedef as usize];
        let side = if seg.dir == 0 {
            ld.right_sidedef
        } else {
            ld.left_sidedef
        };
        let sector = side
            .and_then(|s| self.level.sidedefs.get(s as usize))
            .map(|sd| sd.sector)
            .unwrap_or(0);
        self.level.subsectors.push(Subsector {
            first_seg: first,
            seg_count: count,
            sector,
        });
        SUBSECTOR_BIT | (self.level.subsectors.len() - 1) as SubsectorId
    }

    /// Node whose partition runs from `(x, y)` by `(dx, dy)` map units; the
    /// child bounding boxes are derived from the children's segs.
    pub fn node(
        &mut self,
        (x, y): (i32, i32),
        (dx, dy): (i32, i32),
        right: NodeChild,
        left: NodeChild,
    ) -> NodeChild {
        let bbox = [self.child_bbox(right), self.child_bbox(left)];
        self.level.nodes.push(Node {
            x: int_to_fixed(x),
            y: int_to_fixed(y),
            dx: int_to_fixed(dx),
            dy: int_to_fixed(dy),
            bbox,
            child: [right, left],
        });
        (self.level.nodes.len() - 1) as NodeChild
    }

    fn child_bbox(&self, child: NodeChild) -> BBox {
        if child & SUBSECTOR_BIT == 0 {
            let [a, b] = self.level.nodes[child as usize].bbox;
            return BBox::new(
                a.left.min(b.left),
                a.bottom.min(b.bottom),
                a.right.max(b.right),
                a.top.max(b.top),
            );
        }
        let ss = &self.level.subsectors[(child & CHILD_MASK) as usize];
        let mut bb = BBox::new(Fixed::MAX, Fixed::MAX, Fixed::MIN, Fixed::MIN);
        let segs = ss.first_seg as usize..(ss.first_seg + ss.seg_count) as usize;
        for seg in &self.level.segs[segs] {
            for v in [seg.v1, seg.v2] {
                let p = self.level.vertices[v as usize].pos;
                bb.left = bb.left.min(p.x);
                bb.right = bb.right.max(p.x);
                bb.bottom = bb.bottom.min(p.y);
                bb.top = bb.top.max(p.y);
            }
        }
        bb
    }

    pub fn thing(&mut self, x: i32, y: i32, type_id: u16, flags: ThingFlags) -> ThingId {
        self.level.things.push(Thing {
            pos: IVec2::new(int_to_fixed(x), int_to_fixed(y)),
            z: 0,
            angle: Default::default(),
            radius: int_to_fixed(20),
            height: int_to_fixed(56),
            type_id,
            flags,
            sector: 0,
        });
        (self.level.things.len() - 1) as ThingId
    }

    /// Validate and finish; things are dropped into their sectors.
    pub fn build(mut self) -> Result<Level, LevelError> {
        self.level.validate()?;
        let placed: Vec<(SectorId, Fixed)> = self
            .level
            .things
            .iter()
            .map(|t| {
                let sec = self.level.sector_at(t.pos.x, t.pos.y);
                (sec, self.level.sectors[sec as usize].floor_h)
            })
            .collect();
        for (thing, (sector, floor)) in self.level.things.iter_mut().zip(placed) {
            thing.sector = sector;
            thing.z = floor;
        }
        Ok(self.level)
    }
}

/// Two convex rooms split by one partition along `x = 0`.
///
/// * west room: `x ∈ [-256, 0]`, floor 0, ceiling 128, light 160
/// * east room: `x ∈ [0, 256]`, floor 16, ceiling 112, light 128, sky ceiling
///
/// The partition line points south, so the west room is its front side and
/// a viewer standing exactly on `x = 0` is classified as west.
pub fn two_room_level() -> Level {
    let mut b = LevelBuilder::new("TWOROOMS");
    let west = b.sector(0, 128, 160);
    let east = b.sector(16, 112, 128);
    b.sky(9);
    b.set_ceiling_pic(east, 9);

    let v0 = b.vertex(-256, -128);
    let v1 = b.vertex(-256, 128);
    let v2 = b.vertex(0, 128);
    let v3 = b.vertex(0, -128);
    let v4 = b.vertex(256, 128);
    let v5 = b.vertex(256, -128);

    let w_west = b.line(v0, v1, west, None, 1);
    let w_north = b.line(v1, v2, west, None, 1);
    let w_south = b.line(v3, v0, west, None, 1);
    let divider = b.line(v2, v3, west, Some(east), 2);
    let e_north = b.line(v2, v4, east, None, 3);
    let e_east = b.line(v4, v5, east, None, 3);
    let e_south = b.line(v5, v3, east, None, 3);

    let first_west = b.seg(w_west, 0);
    b.seg(w_north, 0);
    b.seg(divider, 0);
    b.seg(w_south, 0);
    let first_east = b.seg(e_north, 0);
    b.seg(e_east, 0);
    b.seg(e_south, 0);
    b.seg(divider, 1);

    let west_ss = b.subsector(first_west, 4);
    let east_ss = b.subsector(first_east, 4);
    b.node((0, 128), (0, -256), west_ss, east_ss);

    b.thing(128, 0, 3004, ThingFlags::empty());
    b.thing(160, 64, 58, ThingFlags::SHADOW);
    b.thing(-64, 96, 2035, ThingFlags::empty());

    b.build().expect("hand-built level is consistent")
}

/// One corridor 60000 units long and 256 wide, with no nodes, a thing
/// near the east end and the corners near the limit of 16.16 coordinates.
pub fn long_corridor_level() -> Level {
    let mut b = LevelBuilder::new("CORRIDOR");
    let hall = b.sector(0, 128, 160);

    let v0 = b.vertex(-30000, -128);
    let v1 = b.vertex(-30000, 128);
    let v2 = b.vertex(30000, 128);
    let v3 = b.vertex(30000, -128);

    let west = b.line(v0, v1, hall, None, 1);
    let north = b.line(v1, v2, hall, None, 2);
    let east = b.line(v2, v3, hall, None, 3);
    let south = b.line(v3, v0, hall, None, 2);

    let first = b.seg(west, 0);
    for line in [north, east, south] {
        b.seg(line, 0);
    }
    b.subsector(first, 4);

    b.thing(29900, 0, 3004, ThingFlags::empty());

    b.build().expect("hand-built level is consistent")
}
