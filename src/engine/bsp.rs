//! ----------------------------------------------------------------------------
//! **BSP front‑to‑back traversal**
//!
//! Responsible for
//! * finding visible subsectors in **front‑to‑back** order
//! * clipping every front‑facing seg against the solid column list
//! * turning what survives into [`WallSpan`]s, plane and sprite candidates
//!
//! It does not touch pixels: the finished [`VisibleSurfaces`] list is what
//! the rasterizer consumes afterwards.
//! ----------------------------------------------------------------------------

use log::warn;

use crate::{
    engine::{
        clip::{SolidSegs, Visible},
        config::RenderConfig,
        lighting::LightTables,
        projection::Projection,
        surfaces::{
            ColumnMode, FrameStats, PlaneKey, SpriteCandidate, SurfaceLight, VisibleSurfaces,
            WallSpan,
        },
        view::ViewFrame,
    },
    math::{
        ANG90, ANG180, Angle, FRACBITS, FRACUNIT, Fixed, fine_sine, fixed_div, fixed_mul,
        point_to_angle_wide, point_to_dist, saturate_fixed,
    },
    world::{
        BBox, CHILD_MASK, ColormapRow, FlatId, Level, LinedefFlags, NO_TEXTURE, NodeChild,
        SUBSECTOR_BIT, Sector, SectorId, SegmentId, SubsectorId, ThingFlags, ThingId,
    },
};

/// Deeper than any node builder produces; a tree this deep is malformed.
pub const MAX_BSP_DEPTH: usize = 512;

/// Sprites nearer than this to the view plane are not projected.
pub const MINZ: Fixed = 4 * FRACUNIT;

/// How close a too-near thing must be to still be drawn by the nearby pass.
pub const NEARBY_RANGE: Fixed = 64 * FRACUNIT;

const MIN_SCALE: Fixed = 256;
const MAX_SCALE: Fixed = 64 * FRACUNIT;

/// Corners of a bounding box that bound its angular extent, by where the
/// viewer sits relative to it (3×3 cells, row-major, 4 wide). Indices are
/// top, bottom, left, right.
const CHECKCOORD: [[usize; 4]; 12] = [
    [3, 0, 2, 1],
    [3, 0, 2, 0],
    [3, 1, 2, 0],
    [0; 4],
    [2, 0, 2, 1],
    [0; 4],
    [3, 1, 3, 0],
    [0; 4],
    [2, 0, 3, 1],
    [2, 1, 3, 1],
    [2, 1, 3, 0],
    [0; 4],
];

#[inline(always)]
fn bbox_coord(b: &BBox, i: usize) -> Fixed {
    match i {
        0 => b.top,
        1 => b.bottom,
        2 => b.left,
        _ => b.right,
    }
}

/// A back sector whose opening is shut: a closed door or lift.
#[inline]
fn closed(front: &Sector, back: &Sector) -> bool {
    back.interp_ceil_h <= front.interp_floor_h || back.interp_floor_h >= front.interp_ceil_h
}

/// Projected scale of a wall point seen at `vis_angle`.
///
/// Clamped to `[256, 64.0]`; a degenerate denominator gives the maximum.
pub fn scale_from_global_angle(
    vis_angle: Angle,
    view_angle: Angle,
    normal_angle: Angle,
    distance: Fixed,
    projection: Fixed,
) -> Fixed {
    let anglea = ANG90 + (vis_angle - view_angle);
    let angleb = ANG90 + (vis_angle - normal_angle);
    let sinea = fine_sine(anglea.fine());
    let sineb = fine_sine(angleb.fine());
    let num = fixed_mul(projection, sineb);
    let den = fixed_mul(distance, sinea);

    if den > num >> FRACBITS {
        fixed_div(num, den).clamp(MIN_SCALE, MAX_SCALE)
    } else {
        MAX_SCALE
    }
}

/// Visit marks that survive between frames; compared against the frame's
/// `validcount` so nothing has to be cleared.
#[derive(Debug, Default)]
pub struct BspScratch {
    sector_marks: Vec<u32>,
    thing_marks: Vec<u32>,
}

impl BspScratch {
    fn fit(&mut self, level: &Level) {
        self.sector_marks.resize(level.sectors.len(), 0);
        self.thing_marks.resize(level.things.len(), 0);
    }
}

/// One frame's walk over the tree.
pub struct Traversal<'a> {
    level: &'a Level,
    view: &'a ViewFrame,
    projection: &'a Projection,
    lights: &'a LightTables,
    config: &'a RenderConfig,

    solid: &'a mut SolidSegs,
    out: &'a mut VisibleSurfaces,
    stats: &'a mut FrameStats,
    scratch: &'a mut BspScratch,
    validcount: u32,

    /* current leaf */
    front: SectorId,
    floor_plane: Option<usize>,
    ceiling_plane: Option<usize>,
    depth_warned: bool,
}

impl<'a> Traversal<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        level: &'a Level,
        view: &'a ViewFrame,
        projection: &'a Projection,
        lights: &'a LightTables,
        config: &'a RenderConfig,
        solid: &'a mut SolidSegs,
        out: &'a mut VisibleSurfaces,
        stats: &'a mut FrameStats,
        scratch: &'a mut BspScratch,
        validcount: u32,
    ) -> Self {
        scratch.fit(level);
        Self {
            level,
            view,
            projection,
            lights,
            config,
            solid,
            out,
            stats,
            scratch,
            validcount,
            front: 0,
            floor_plane: None,
            ceiling_plane: None,
            depth_warned: false,
        }
    }

    /// Walk the whole tree from the root.
    pub fn run(&mut self) {
        self.render_bsp(self.level.bsp_root(), 0);
    }

    /*──────────────────────────── Tree walk ─────────────────────────────*/

    fn render_bsp(&mut self, child: NodeChild, depth: usize) {
        // Leaf? ──────
        if child & SUBSECTOR_BIT != 0 {
            self.subsector(child & CHILD_MASK);
            return;
        }
        if depth >= MAX_BSP_DEPTH {
            if !self.depth_warned {
                warn!("BSP deeper than {MAX_BSP_DEPTH} nodes, subtree skipped");
                self.depth_warned = true;
            }
            return;
        }

        // Internal node ──────
        self.stats.nodes += 1;
        let node = &self.level.nodes[child as usize];
        let side = node.point_side(self.view.x, self.view.y);
        let (near, far, far_box) = (node.child[side], node.child[side ^ 1], node.bbox[side ^ 1]);

        // Near side first …
        self.render_bsp(near, depth + 1);

        // … far side only if its bounding box might be visible.
        if self.check_bbox(&far_box) {
            self.render_bsp(far, depth + 1);
        } else {
            self.stats.boxes_culled += 1;
        }
    }

    /// Could any part of `bbox` still show through the open columns?
    fn check_bbox(&self, bbox: &BBox) -> bool {
        let (vx, vy) = (self.view.x, self.view.y);
        let boxx = if vx <= bbox.left {
            0
        } else if vx < bbox.right {
            1
        } else {
            2
        };
        let boxy = if vy >= bbox.top {
            0
        } else if vy > bbox.bottom {
            1
        } else {
            2
        };
        let boxpos = (boxy << 2) + boxx;
        if boxpos == 5 {
            // Inside the box.
            return true;
        }

        let c = CHECKCOORD[boxpos];
        let (x1, y1) = (bbox_coord(bbox, c[0]), bbox_coord(bbox, c[1]));
        let (x2, y2) = (bbox_coord(bbox, c[2]), bbox_coord(bbox, c[3]));

        let angle1 = point_to_angle_wide(vx, vy, x1, y1) - self.view.angle;
        let angle2 = point_to_angle_wide(vx, vy, x2, y2) - self.view.angle;
        let span = angle1 - angle2;

        // Sitting on a box edge.
        if span >= ANG180 {
            return true;
        }

        let Some((angle1, angle2)) = self.clip_to_view(angle1, angle2, span) else {
            return false;
        };

        let sx1 = self.projection.angle_to_x(angle1);
        let sx2 = self.projection.angle_to_x(angle2);
        if sx1 == sx2 {
            return false;
        }
        !self.solid.covers(sx1, sx2 - 1)
    }

    /// Clip a view-relative angle pair to the visible wedge; `None` when the
    /// pair lies entirely outside it.
    fn clip_to_view(
        &self,
        mut angle1: Angle,
        mut angle2: Angle,
        span: Angle,
    ) -> Option<(Angle, Angle)> {
        let clip = self.projection.clip_angle;
        let wedge = clip.0.wrapping_mul(2);

        let tspan = angle1 + clip;
        if tspan.0 > wedge {
            if tspan.0 - wedge >= span.0 {
                return None;
            }
            angle1 = clip;
        }
        let tspan = clip - angle2;
        if tspan.0 > wedge {
            if tspan.0 - wedge >= span.0 {
                return None;
            }
            angle2 = -clip;
        }
        Some((angle1, angle2))
    }

    /*─────────────────────────── Leaf processing ─────────────────────────*/

    fn is_sky(&self, pic: FlatId) -> bool {
        self.level.sky_flat == Some(pic)
    }

    fn plane_light(&self, sector: &Sector) -> SurfaceLight {
        match self.view.fixed_colormap {
            Some(row) => SurfaceLight::Fixed(row),
            None => SurfaceLight::Scaled {
                colormap: self.view.colormap,
                level: self.lights.light_level(sector.light, self.view.extralight, 0),
            },
        }
    }

    fn subsector(&mut self, num: SubsectorId) {
        let lvl = self.level;
        let Some(ss) = lvl.subsectors.get(num as usize) else {
            warn!("subsector {num} does not exist");
            return;
        };
        self.stats.subsectors += 1;
        self.out.subsectors.push(num);

        self.front = ss.sector;
        let sec = &lvl.sectors[ss.sector as usize];
        let light = self.plane_light(sec);
        let floor_sky = self.is_sky(sec.floor_pic);
        let ceil_sky = self.is_sky(sec.ceil_pic);

        self.floor_plane = if sec.interp_floor_h < self.view.z || floor_sky {
            let key = PlaneKey {
                height: sec.interp_floor_h,
                pic: sec.floor_pic,
                light: sec.light,
            };
            Some(self.out.find_plane(key, floor_sky, light))
        } else {
            None
        };
        self.ceiling_plane = if sec.interp_ceil_h > self.view.z || ceil_sky {
            let key = PlaneKey {
                height: sec.interp_ceil_h,
                pic: sec.ceil_pic,
                light: sec.light,
            };
            Some(self.out.find_plane(key, ceil_sky, light))
        } else {
            None
        };

        self.add_sprites(ss.sector);

        let first = ss.first_seg;
        for seg in first..first + ss.seg_count {
            self.add_line(seg);
        }
    }

    /// Clip one seg and store whatever part of it is still visible.
    fn add_line(&mut self, seg_id: SegmentId) {
        let lvl = self.level;
        let seg = &lvl.segs[seg_id as usize];
        let v1 = lvl.vertices[seg.v1 as usize].pos;
        let v2 = lvl.vertices[seg.v2 as usize].pos;

        let angle1 = point_to_angle_wide(self.view.x, self.view.y, v1.x, v1.y);
        let angle2 = point_to_angle_wide(self.view.x, self.view.y, v2.x, v2.y);

        // Back side.
        let span = angle1 - angle2;
        if span >= ANG180 {
            return;
        }
        let rw_angle1 = angle1;

        let (a1, a2) = (angle1 - self.view.angle, angle2 - self.view.angle);
        let Some((a1, a2)) = self.clip_to_view(a1, a2, span) else {
            return;
        };
        let x1 = self.projection.angle_to_x(a1);
        let x2 = self.projection.angle_to_x(a2);

        // Does not cross a pixel.
        if x1 >= x2 {
            return;
        }
        self.stats.segs += 1;

        let line = &lvl.linedefs[seg.linedef as usize];
        let (side, other) = if seg.dir == 0 {
            (line.right_sidedef, line.left_sidedef)
        } else {
            (line.left_sidedef, line.right_sidedef)
        };
        let Some(side) = side else {
            return;
        };
        let back = other
            .filter(|_| line.flags.contains(LinedefFlags::TWO_SIDED))
            .map(|sd| lvl.sidedefs[sd as usize].sector);

        let front = &lvl.sectors[self.front as usize];
        let visible: Visible = match back.map(|b| &lvl.sectors[b as usize]) {
            None => self.solid.clip_solid(x1, x2 - 1),
            // Closed door.
            Some(b) if closed(front, b) => self.solid.clip_solid(x1, x2 - 1),
            // Window.
            Some(b)
                if b.interp_ceil_h != front.interp_ceil_h
                    || b.interp_floor_h != front.interp_floor_h =>
            {
                self.solid.clip_pass(x1, x2 - 1)
            }
            // Identical sectors on both sides and nothing to draw: a trigger line.
            Some(b)
                if b.ceil_pic == front.ceil_pic
                    && b.floor_pic == front.floor_pic
                    && b.light == front.light
                    && lvl.sidedefs[side as usize].middle == NO_TEXTURE =>
            {
                return;
            }
            Some(_) => self.solid.clip_pass(x1, x2 - 1),
        };

        for r in visible {
            self.store_wall_range(seg_id, side, back, rw_angle1, r.first, r.last);
        }
    }

    /// Project `start..=stop` of a seg and append it as a wall span.
    #[allow(clippy::too_many_arguments)]
    fn store_wall_range(
        &mut self,
        seg_id: SegmentId,
        side: u32,
        back: Option<SectorId>,
        rw_angle1: Angle,
        start: i32,
        stop: i32,
    ) {
        let lvl = self.level;
        let view = self.view;
        let seg = &lvl.segs[seg_id as usize];
        let sidedef = &lvl.sidedefs[side as usize];
        let front = &lvl.sectors[self.front as usize];
        let v1 = lvl.vertices[seg.v1 as usize].pos;
        let v2 = lvl.vertices[seg.v2 as usize].pos;

        // Perpendicular distance to the wall line.
        let normal_angle = seg.angle + ANG90;
        let offset_angle = Angle(
            (normal_angle - rw_angle1)
                .signed()
                .unsigned_abs()
                .min(ANG90.0),
        );
        let hyp = point_to_dist(view.x, view.y, v1.x, v1.y);
        let distance = fixed_mul(hyp, fine_sine((ANG90 - offset_angle).fine()));

        // Texture offset at the perpendicular foot.
        let mut off_angle = normal_angle - rw_angle1;
        if off_angle > ANG180 {
            off_angle = -off_angle;
        }
        let off_angle = off_angle.min(ANG90);
        let mut offset = fixed_mul(hyp, fine_sine(off_angle.fine()));
        if normal_angle - rw_angle1 < ANG180 {
            offset = -offset;
        }
        offset = offset.wrapping_add(sidedef.x_off).wrapping_add(seg.offset);

        let projection = self.projection.projection();
        let scale_at = |x: i32| {
            scale_from_global_angle(
                view.angle + self.projection.x_to_view_angle[x as usize],
                view.angle,
                normal_angle,
                distance,
                projection,
            )
        };
        let scale1 = scale_at(start);
        let (scale2, scale_step) = if stop > start {
            let s2 = scale_at(stop);
            (s2, (s2 - scale1) / (stop - start))
        } else {
            (scale1, 0)
        };

        let mut world_top = front.interp_ceil_h - view.z;
        let world_bottom = front.interp_floor_h - view.z;
        let (mut world_high, mut world_low) = (0, 0);
        let (mut top_texture, mut mid_texture, mut bottom_texture, mut masked_texture) =
            (NO_TEXTURE, NO_TEXTURE, NO_TEXTURE, NO_TEXTURE);
        let (mut mark_floor, mut mark_ceiling);
        let solid;

        match back.map(|b| &lvl.sectors[b as usize]) {
            None => {
                mid_texture = sidedef.middle;
                mark_floor = true;
                mark_ceiling = true;
                solid = true;
            }
            Some(b) => {
                world_high = b.interp_ceil_h - view.z;
                world_low = b.interp_floor_h - view.z;

                // Sky behind sky: the upper wall would cover the sky.
                if self.is_sky(front.ceil_pic) && self.is_sky(b.ceil_pic) {
                    world_top = world_high;
                }

                mark_floor = world_low != world_bottom
                    || b.floor_pic != front.floor_pic
                    || b.light != front.light;
                mark_ceiling = world_high != world_top
                    || b.ceil_pic != front.ceil_pic
                    || b.light != front.light;

                // Closed door.
                if closed(front, b) {
                    mark_floor = true;
                    mark_ceiling = true;
                }

                if world_high < world_top {
                    top_texture = sidedef.upper;
                }
                if world_low > world_bottom {
                    bottom_texture = sidedef.lower;
                }
                masked_texture = sidedef.middle;
                solid = false;
            }
        }

        // Planes on the far side of the eye are never seen.
        if front.interp_floor_h >= view.z && !self.is_sky(front.floor_pic) {
            mark_floor = false;
        }
        if front.interp_ceil_h <= view.z && !self.is_sky(front.ceil_pic) {
            mark_ceiling = false;
        }
        let floor_plane = self.floor_plane.filter(|_| mark_floor);
        let ceiling_plane = self.ceiling_plane.filter(|_| mark_ceiling);
        if let Some(p) = floor_plane {
            self.out.extend_plane(p, start, stop);
        }
        if let Some(p) = ceiling_plane {
            self.out.extend_plane(p, start, stop);
        }

        // Fake contrast: axis-aligned walls one step darker / lighter.
        let contrast = if !self.config.fake_contrast {
            0
        } else if v1.y == v2.y {
            -1
        } else if v1.x == v2.x {
            1
        } else {
            0
        };
        let light = match view.fixed_colormap {
            Some(row) => SurfaceLight::Fixed(row),
            None => SurfaceLight::Scaled {
                colormap: view.colormap,
                level: self.lights.light_level(front.light, view.extralight, contrast),
            },
        };

        self.stats.walls += 1;
        self.out.walls.push(WallSpan {
            seg: seg_id,
            front: self.front,
            back,
            x1: start,
            x2: stop,
            scale1,
            scale2,
            scale_step,
            distance,
            normal_angle,
            offset,
            world_top,
            world_bottom,
            world_high,
            world_low,
            top_texture,
            mid_texture,
            bottom_texture,
            masked_texture,
            solid,
            mark_floor: floor_plane.is_some(),
            mark_ceiling: ceiling_plane.is_some(),
            floor_plane,
            ceiling_plane,
            light,
        });
    }

    /*─────────────────────────────── Sprites ─────────────────────────────*/

    /// Project every thing in `sector`, once per frame.
    fn add_sprites(&mut self, sector: SectorId) {
        let mark = &mut self.scratch.sector_marks[sector as usize];
        if *mark == self.validcount {
            return;
        }
        *mark = self.validcount;

        let level = self
            .lights
            .light_level(self.level.sectors[sector as usize].light, self.view.extralight, 0);
        for (id, thing) in self.level.things.iter().enumerate() {
            if thing.sector == sector {
                self.project_sprite(id as ThingId, level);
            }
        }
    }

    /// View-space position of a thing: (depth, lateral offset).
    ///
    /// Worked in 64 bits; anything beyond the 16.16 range saturates, so a
    /// thing across a huge map stays far away on the correct side.
    fn to_view_space(&self, x: Fixed, y: Fixed) -> (Fixed, Fixed) {
        let tr_x = x as i64 - self.view.x as i64;
        let tr_y = y as i64 - self.view.y as i64;
        let (sin, cos) = (self.view.sin as i64, self.view.cos as i64);
        let tz = ((tr_x * cos) >> FRACBITS) + ((tr_y * sin) >> FRACBITS);
        let tx = ((tr_x * sin) >> FRACBITS) - ((tr_y * cos) >> FRACBITS);
        (saturate_fixed(tz), saturate_fixed(tx))
    }

    fn project_sprite(&mut self, id: ThingId, level: usize) {
        let thing = &self.level.things[id as usize];
        let (tz, tx) = self.to_view_space(thing.pos.x, thing.pos.y);

        // Behind or too close to the view plane.
        if tz < MINZ {
            return;
        }
        // Too far off the side.
        if (tx as i64).abs() > (tz as i64) << 2 {
            return;
        }

        let xscale = fixed_div(self.projection.projection(), tz);
        let Some((x1, x2)) = self.sprite_columns(tx, thing.radius, xscale) else {
            return;
        };

        let light = self.sprite_light(thing.flags, level, xscale);
        self.scratch.thing_marks[id as usize] = self.validcount;
        self.stats.sprites += 1;
        self.out.sprites.push(SpriteCandidate {
            thing: id,
            x1,
            x2,
            scale: xscale,
            depth: tz,
            gz: thing.z - self.view.z,
            gzt: thing.z + thing.height - self.view.z,
            mode: ColumnMode::for_thing(thing.flags, self.config.strict),
            light,
            nearby: false,
        });
    }

    /// Screen columns a sprite `radius` wide covers, clipped to the view.
    fn sprite_columns(&self, tx: Fixed, radius: Fixed, xscale: Fixed) -> Option<(i32, i32)> {
        let center = self.projection.center_x_frac as i64;
        let width = self.projection.viewport.width;
        let left = (center + fixed_mul(tx.saturating_sub(radius), xscale) as i64) >> FRACBITS;
        if left > width as i64 {
            return None;
        }
        let right =
            ((center + fixed_mul(tx.saturating_add(radius), xscale) as i64) >> FRACBITS) - 1;
        if right < 0 {
            return None;
        }
        let x1 = left.max(0) as i32;
        let x2 = right.min(width as i64 - 1) as i32;
        (x1 <= x2).then_some((x1, x2))
    }

    fn sprite_light(&self, flags: ThingFlags, level: usize, xscale: Fixed) -> Option<ColormapRow> {
        if ColumnMode::for_thing(flags, self.config.strict) == ColumnMode::Fuzz {
            return None;
        }
        if let Some(row) = self.view.fixed_colormap {
            return Some(row);
        }
        let index = self
            .lights
            .light_index_for_scale(xscale, self.projection.light_focal_length());
        Some(self.lights.scale_row(self.view.colormap, level, index))
    }

    /// Things straddling the view plane right next to the viewer: projection
    /// rejects them as too near, so draw them as if at the nearest depth.
    pub fn nearby_sprites(&mut self) {
        let xscale = fixed_div(self.projection.projection(), MINZ);
        for (id, thing) in self.level.things.iter().enumerate() {
            if self.scratch.thing_marks[id] == self.validcount {
                continue;
            }
            let (tz, tx) = self.to_view_space(thing.pos.x, thing.pos.y);
            if tz >= MINZ || tz.saturating_add(thing.radius) <= 0 {
                continue;
            }
            let dist = point_to_dist(self.view.x, self.view.y, thing.pos.x, thing.pos.y);
            if dist >= thing.radius + NEARBY_RANGE {
                continue;
            }
            let Some((x1, x2)) = self.sprite_columns(tx, thing.radius, xscale) else {
                continue;
            };

            let sector = &self.level.sectors[thing.sector as usize];
            let level = self.lights.light_level(sector.light, self.view.extralight, 0);
            let light = self.sprite_light(thing.flags, level, xscale);
            self.scratch.thing_marks[id] = self.validcount;
            self.stats.nearby += 1;
            self.out.sprites.push(SpriteCandidate {
                thing: id as ThingId,
                x1,
                x2,
                scale: xscale,
                depth: MINZ,
                gz: thing.z - self.view.z,
                gzt: thing.z + thing.height - self.view.z,
                mode: ColumnMode::for_thing(thing.flags, self.config.strict),
                light,
                nearby: true,
            });
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{BrightnessMode, Viewport};
    use crate::math::{fine_cosine, int_to_fixed};
    use crate::world::{long_corridor_level, two_room_level};

    struct Fixture {
        level: Level,
        projection: Projection,
        lights: LightTables,
        config: RenderConfig,
        scratch: BspScratch,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                level: two_room_level(),
                projection: Projection::new(Viewport::classic(1), 90, 90),
                lights: LightTables::new(BrightnessMode::Coarse, 1),
                config: RenderConfig::default(),
                scratch: BspScratch::default(),
            }
        }

        fn view(x: i32, y: i32, angle: Angle) -> ViewFrame {
            ViewFrame {
                x: int_to_fixed(x),
                y: int_to_fixed(y),
                z: 41 * FRACUNIT,
                angle,
                sin: fine_sine(angle.fine()),
                cos: fine_cosine(angle.fine()),
                ..ViewFrame::default()
            }
        }

        fn walk(
            &mut self,
            view: &ViewFrame,
            validcount: u32,
        ) -> (VisibleSurfaces, FrameStats, SolidSegs) {
            let mut solid = SolidSegs::new(320);
            let mut out = VisibleSurfaces::default();
            let mut stats = FrameStats::default();
            let mut t = Traversal::new(
                &self.level,
                view,
                &self.projection,
                &self.lights,
                &self.config,
                &mut solid,
                &mut out,
                &mut stats,
                &mut self.scratch,
                validcount,
            );
            t.run();
            t.nearby_sprites();
            (out, stats, solid)
        }
    }

    #[test]
    fn near_leaf_is_emitted_first() {
        let mut f = Fixture::new();
        let (out, _, _) = f.walk(&Fixture::view(-128, 0, Angle(0)), 1);
        assert_eq!(out.subsectors, vec![0, 1]);
        let (out, _, _) = f.walk(&Fixture::view(128, 0, ANG180), 2);
        assert_eq!(out.subsectors, vec![1, 0]);
    }

    #[test]
    fn viewer_on_partition_always_picks_the_same_leaf() {
        let mut f = Fixture::new();
        for vc in 1..4 {
            let (out, _, _) = f.walk(&Fixture::view(0, 0, Angle(0)), vc);
            assert_eq!(out.subsectors.first(), Some(&0));
        }
    }

    #[test]
    fn walls_facing_away_cull_the_far_room() {
        let mut f = Fixture::new();
        let (out, stats, solid) = f.walk(&Fixture::view(-128, 0, ANG180), 1);
        assert_eq!(out.subsectors, vec![0]);
        assert_eq!(stats.boxes_culled, 1);
        assert!(solid.is_full());
        assert!(out.walls.iter().all(|w| w.solid));
        // Front to back: spans never overlap once the room is closed.
        let mut cols: Vec<(i32, i32)> = out.walls.iter().map(|w| (w.x1, w.x2)).collect();
        cols.sort();
        for pair in cols.windows(2) {
            assert!(pair[0].1 < pair[1].0);
        }
    }

    #[test]
    fn window_is_see_through_and_marks_planes() {
        let mut f = Fixture::new();
        let (out, _, _) = f.walk(&Fixture::view(-128, 0, Angle(0)), 1);
        let window = out
            .walls
            .iter()
            .find(|w| w.back.is_some())
            .expect("divider is visible");
        assert!(!window.solid);
        // East floor is higher and its ceiling lower: both steps get textures.
        assert_eq!(window.bottom_texture, 2);
        assert_eq!(window.top_texture, 2);
        assert!(window.mark_floor && window.floor_plane.is_some());
        assert!(out.walls.iter().any(|w| w.back.is_none() && w.front == 1));
        assert!(out.planes.iter().any(|p| p.sky));
        assert!(out.planes.iter().all(|p| !p.is_empty()));
    }

    #[test]
    fn sprites_once_per_sector_with_modes() {
        let mut f = Fixture::new();
        let (out, stats, _) = f.walk(&Fixture::view(-128, 0, Angle(0)), 1);
        assert_eq!(stats.sprites, 2);
        let fuzz = out.sprites.iter().find(|s| s.thing == 1).expect("shadow thing");
        assert_eq!(fuzz.mode, ColumnMode::Fuzz);
        assert_eq!(fuzz.light, None);
        let plain = out.sprites.iter().find(|s| s.thing == 0).expect("plain thing");
        assert!(plain.light.is_some());
        assert!(plain.x1 <= 160 && plain.x2 >= 159);
        assert!(plain.scale > fuzz.scale);

        let (again, _, _) = f.walk(&Fixture::view(-128, 0, Angle(0)), 2);
        assert_eq!(again.sprites.len(), 2);
    }

    #[test]
    fn nearby_pass_catches_things_at_the_eye() {
        let mut f = Fixture::new();
        let (out, stats, _) = f.walk(&Fixture::view(-62, 96, Angle(0)), 1);
        assert_eq!(stats.nearby, 1);
        let s = out.sprites.iter().find(|s| s.nearby).expect("nearby sprite");
        assert_eq!(s.thing, 2);
        assert_eq!((s.x1, s.x2), (0, 319));
    }

    #[test]
    fn fixed_colormap_overrides_walls() {
        let mut f = Fixture::new();
        let row = ColormapRow { colormap: 0, row: 32 };
        let view = ViewFrame {
            fixed_colormap: Some(row),
            ..Fixture::view(-128, 0, ANG180)
        };
        let (out, _, _) = f.walk(&view, 1);
        assert!(out.walls.iter().all(|w| w.light == SurfaceLight::Fixed(row)));
    }

    #[test]
    fn scale_clamps() {
        let proj = 160 * FRACUNIT;
        let s = scale_from_global_angle(Angle(0), Angle(0), Angle(0), 128 * FRACUNIT, proj);
        assert!((s - fixed_div(proj, 128 * FRACUNIT)).abs() < 16);
        assert_eq!(scale_from_global_angle(Angle(0), Angle(0), Angle(0), 16, proj), MAX_SCALE);
        let far = scale_from_global_angle(Angle(0), Angle(0), Angle(0), i32::MAX, 64 * FRACUNIT);
        assert_eq!(far, MIN_SCALE);
    }

    #[test]
    fn far_things_keep_their_side_of_the_view() {
        let mut f = Fixture::new();
        f.level = long_corridor_level();
        let far = int_to_fixed(29900);
        for (angle, depth) in [(Angle(0), i32::MAX), (ANG180, i32::MIN)] {
            let view = Fixture::view(-29900, 0, angle);
            let mut solid = SolidSegs::new(320);
            let mut out = VisibleSurfaces::default();
            let mut stats = FrameStats::default();
            let t = Traversal::new(
                &f.level,
                &view,
                &f.projection,
                &f.lights,
                &f.config,
                &mut solid,
                &mut out,
                &mut stats,
                &mut f.scratch,
                1,
            );
            let (tz, tx) = t.to_view_space(far, 0);
            assert_eq!(tz, depth);
            assert!(tx.abs() < 64 * FRACUNIT);
        }

        // The whole corridor walks without tripping on the distances.
        let (out, _, solid) = f.walk(&Fixture::view(-29900, 0, Angle(0)), 2);
        assert!(solid.is_full());
        assert!(out.walls.iter().any(|w| w.front == 0));
        assert!(out.sprites.iter().all(|s| !s.nearby));
    }

    #[test]
    fn depth_limit_stops_runaway_trees() {
        let mut f = Fixture::new();
        // Node 0 pointing at itself on the near side.
        f.level.nodes[0].child[0] = 0;
        let (out, stats, _) = f.walk(&Fixture::view(-128, 0, Angle(0)), 1);
        assert_eq!(stats.nodes as usize, MAX_BSP_DEPTH);
        assert!(out.subsectors.len() <= MAX_BSP_DEPTH);
    }
}
