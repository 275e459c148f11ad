//! ---------------------------------------------------------------------------
//! Reference software (CPU) column renderer
//!
//! * Draws palette indices into an 8-bit scratch buffer; `end_frame` expands
//!   it through the palette into **0x00RRGGBB**.
//! * Relies on the traversal feeding *front-to-back* wall spans, so the
//!   per-column ceiling / floor clip bands stand in for a Z-buffer.
//! * Texture and flat ids select procedural patterns. Decoding real graphics
//!   belongs to the asset layer, not here.
//! ---------------------------------------------------------------------------

use crate::{
    engine::{
        config::Viewport,
        surfaces::{ColumnMode, SpriteCandidate, SurfaceLight, WallSpan},
    },
    math::{
        ANG90, ANGLETOFINESHIFT, Angle, FINEANGLES, FRACBITS, Fixed, fine_cosine, fine_sine,
        fine_tangent, fixed_mul,
    },
    renderer::{Rasterizer, Rgba, Scene},
    world::{ColormapRow, Colormaps, FlatId, NO_TEXTURE, Palette, TextureId},
};

/// Row the fuzz effect darkens through.
const FUZZ_ROW: u8 = 6;

/// Vertical neighbour sampled by each successive fuzz pixel.
const FUZZ_OFFSETS: [i8; 50] = [
    1, -1, 1, -1, 1, 1, -1, 1, 1, -1, 1, 1, 1, -1, 1, 1, 1, -1, -1, -1, -1, 1, -1, -1, 1,
    1, 1, 1, -1, 1, -1, 1, 1, -1, -1, 1, 1, -1, -1, -1, -1, 1, 1, 1, 1, -1, 1, 1, -1, 1,
];

/// Angle bits dropped to get a sky texture column.
const ANGLETOSKYSHIFT: u32 = 22;

/// Sky texture row drawn at the horizon.
const SKY_TEXTURE_MID: Fixed = 100 << FRACBITS;

/*───────────────────────────────────────────────────────────────────────*/
/*                         Per-frame records                              */
/*───────────────────────────────────────────────────────────────────────*/

/// Rows `top..=bottom` of column `x` belong to plane `plane`.
#[derive(Clone, Copy, Debug)]
struct PlaneRun {
    plane: usize,
    x: i32,
    top: i32,
    bottom: i32,
}

/// A see-through middle texture column, drawn with the sprites.
#[derive(Clone, Copy, Debug)]
struct MaskedColumn {
    x: i32,
    scale: Fixed,
    top: i32,
    bottom: i32,
    texture: TextureId,
    u: i32,
    texture_mid: Fixed,
    light: ColormapRow,
}

/// Where one textured column starts in texture space.
#[derive(Clone, Copy)]
struct ColumnTex {
    texture: TextureId,
    u: i32,
    texture_mid: Fixed,
    iscale: i64,
}

/*───────────────────────────────────────────────────────────────────────*/
/*                              Backend                                 */
/*───────────────────────────────────────────────────────────────────────*/

/// Doom-style column renderer.
pub struct Software {
    scratch: Vec<u8>,
    rgba: Vec<Rgba>,
    colormaps: Colormaps,
    palette: Palette,
    /* clip bands survive across walls */
    ceil_clip: Vec<i32>,
    floor_clip: Vec<i32>,
    /// Scale of the wall that closed each column, 0 while still open.
    closed_scale: Vec<Fixed>,
    plane_runs: Vec<PlaneRun>,
    masked: Vec<MaskedColumn>,
    width: usize,
    height: usize,
}

impl Default for Software {
    fn default() -> Self {
        Self::new(Colormaps::synthetic(1), Palette::greyscale())
    }
}

impl Software {
    pub fn new(colormaps: Colormaps, palette: Palette) -> Self {
        Self {
            scratch: Vec::new(),
            rgba: Vec::new(),
            colormaps,
            palette,
            ceil_clip: Vec::new(),
            floor_clip: Vec::new(),
            closed_scale: Vec::new(),
            plane_runs: Vec::new(),
            masked: Vec::new(),
            width: 0,
            height: 0,
        }
    }

    /// Palette indices of the frame drawn so far.
    #[inline]
    pub fn indices(&self) -> &[u8] {
        &self.scratch
    }

    #[inline]
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline(always)]
    fn put(&mut self, x: i32, y: i32, color: u8) {
        self.scratch[y as usize * self.width + x as usize] = color;
    }

    #[inline(always)]
    fn get(&self, x: i32, y: i32) -> u8 {
        self.scratch[y as usize * self.width + x as usize]
    }

    /*──────────────────────────── Walls ─────────────────────────────────*/

    fn wall_row(scene: &Scene<'_>, light: SurfaceLight, scale: Fixed) -> ColormapRow {
        match light {
            SurfaceLight::Fixed(row) => row,
            SurfaceLight::Scaled { colormap, level } => {
                let lights = scene.lights;
                let focal = scene.projection.light_focal_length();
                lights.scale_row(colormap, level, lights.light_index_for_scale(scale, focal))
            }
        }
    }

    fn draw_wall(&mut self, scene: &Scene<'_>, wall: &WallSpan) {
        let p = scene.projection;
        let view = scene.view;
        let center_y = p.center_y_frac as i64;
        let center_angle = ANG90 + view.angle - wall.normal_angle;
        let height = self.height as i32;

        let project =
            |world: Fixed, scale: Fixed| center_y - ((world as i64 * scale as i64) >> FRACBITS);

        for x in wall.x1.max(0)..=wall.x2.min(self.width as i32 - 1) {
            let xi = x as usize;
            let scale = wall.scale1 + wall.scale_step * (x - wall.x1);
            let ceil = self.ceil_clip[xi];
            let floor = self.floor_clip[xi];

            let yl = row_up(project(wall.world_top, scale)).max(ceil + 1);
            let yh = row_down(project(wall.world_bottom, scale)).min(floor - 1);

            if let Some(plane) = wall.ceiling_plane {
                let bottom = (yl - 1).min(floor - 1);
                self.add_run(plane, x, ceil + 1, bottom);
            }
            if let Some(plane) = wall.floor_plane {
                let top = (yh + 1).max(ceil + 1);
                self.add_run(plane, x, top, floor - 1);
            }

            let fine = (center_angle + p.x_to_view_angle[xi]).0 >> ANGLETOFINESHIFT;
            let tan = fine_tangent(fine as usize & (FINEANGLES / 2 - 1));
            let u = wall.offset.wrapping_sub(fixed_mul(tan, wall.distance)) >> FRACBITS;
            let iscale = (1i64 << 32) / scale.max(1) as i64;
            let row = Self::wall_row(scene, wall.light, scale);
            let tex = |texture, texture_mid| ColumnTex {
                texture,
                u,
                texture_mid,
                iscale,
            };

            if wall.solid {
                if wall.mid_texture != NO_TEXTURE {
                    let t = tex(wall.mid_texture, wall.world_top);
                    self.wall_column(x, yl, yh, t, row, p.center_y);
                }
                self.ceil_clip[xi] = height;
                self.floor_clip[xi] = -1;
            } else {
                if wall.top_texture != NO_TEXTURE {
                    let mid = row_down(project(wall.world_high, scale)).min(floor - 1);
                    if mid >= yl {
                        let t = tex(wall.top_texture, wall.world_top);
                        self.wall_column(x, yl, mid, t, row, p.center_y);
                        self.ceil_clip[xi] = mid;
                    } else {
                        self.ceil_clip[xi] = yl - 1;
                    }
                } else if wall.mark_ceiling {
                    self.ceil_clip[xi] = yl - 1;
                }

                if wall.bottom_texture != NO_TEXTURE {
                    let mid = row_up(project(wall.world_low, scale)).max(self.ceil_clip[xi] + 1);
                    if mid <= yh {
                        let t = tex(wall.bottom_texture, wall.world_low);
                        self.wall_column(x, mid, yh, t, row, p.center_y);
                        self.floor_clip[xi] = mid;
                    } else {
                        self.floor_clip[xi] = yh + 1;
                    }
                } else if wall.mark_floor {
                    self.floor_clip[xi] = yh + 1;
                }

                if wall.masked_texture != NO_TEXTURE {
                    self.masked.push(MaskedColumn {
                        x,
                        scale,
                        top: self.ceil_clip[xi] + 1,
                        bottom: self.floor_clip[xi] - 1,
                        texture: wall.masked_texture,
                        u,
                        texture_mid: wall.world_high.min(wall.world_top),
                        light: row,
                    });
                }
            }

            if self.ceil_clip[xi] + 1 >= self.floor_clip[xi] && self.closed_scale[xi] == 0 {
                self.closed_scale[xi] = scale;
            }
        }
    }

    fn add_run(&mut self, plane: usize, x: i32, top: i32, bottom: i32) {
        if top <= bottom {
            self.plane_runs.push(PlaneRun { plane, x, top, bottom });
        }
    }

    fn wall_column(
        &mut self,
        x: i32,
        y1: i32,
        y2: i32,
        tex: ColumnTex,
        row: ColormapRow,
        center_y: i32,
    ) {
        for y in y1.max(0)..=y2.min(self.height as i32 - 1) {
            let v = texel_v(tex.texture_mid, y - center_y, tex.iscale);
            let color = self.colormaps.shade(row, wall_texel(tex.texture, tex.u, v));
            self.put(x, y, color);
        }
    }

    /*──────────────────────────── Planes ────────────────────────────────*/

    fn draw_flat_run(&mut self, scene: &Scene<'_>, run: PlaneRun) {
        let p = scene.projection;
        let view = scene.view;
        let plane = &scene.surfaces.planes[run.plane];
        let plane_height = (plane.key.height - view.z).abs();
        let xi = run.x as usize;
        let fine = (view.angle + p.x_to_view_angle[xi]).fine();
        let (cos, sin) = (fine_cosine(fine), fine_sine(fine));

        for y in run.top.max(0)..=run.bottom.min(self.height as i32 - 1) {
            let distance = fixed_mul(plane_height, p.y_slope[y as usize]);
            let length = fixed_mul(distance, p.dist_scale[xi]);
            let wx = view.x.wrapping_add(fixed_mul(cos, length));
            let wy = view.y.wrapping_add(fixed_mul(sin, length));
            let row = match plane.light {
                SurfaceLight::Fixed(row) => row,
                SurfaceLight::Scaled { colormap, level } => {
                    scene.lights.z_row(colormap, level, scene.lights.z_index(distance))
                }
            };
            let color = self
                .colormaps
                .shade(row, flat_texel(plane.key.pic, wx >> FRACBITS, wy >> FRACBITS));
            self.put(run.x, y, color);
        }
    }

    fn draw_sky_run(&mut self, scene: &Scene<'_>, run: PlaneRun) {
        let p = scene.projection;
        let xi = run.x as usize;
        let offset = if scene.view.linear_sky {
            p.linear_sky_angle[xi]
        } else {
            p.x_to_view_angle[xi]
        };
        let column = sky_column(scene.view.angle + offset);
        // Sky ignores sector light.
        let row = ColormapRow::default();
        for y in run.top.max(0)..=run.bottom.min(self.height as i32 - 1) {
            let v = texel_v(SKY_TEXTURE_MID, y - p.center_y, p.sky_iscale as i64);
            let color = self.colormaps.shade(row, sky_texel(column, v));
            self.put(run.x, y, color);
        }
    }

    /*──────────────────────────── Masked ────────────────────────────────*/

    fn draw_masked_column(&mut self, m: MaskedColumn, center_y: i32) {
        let iscale = (1i64 << 32) / m.scale.max(1) as i64;
        for y in m.top.max(0)..=m.bottom.min(self.height as i32 - 1) {
            let v = texel_v(m.texture_mid, y - center_y, iscale);
            if let Some(texel) = masked_texel(m.texture, m.u, v) {
                let color = self.colormaps.shade(m.light, texel);
                self.put(m.x, y, color);
            }
        }
    }

    fn draw_sprite(&mut self, scene: &Scene<'_>, s: &SpriteCandidate, fuzz_pos: &mut usize) {
        let p = scene.projection;
        let Some(thing) = scene.level.things.get(s.thing as usize) else {
            return;
        };
        let center_y = p.center_y_frac as i64;
        let top = center_y - ((s.gzt as i64 * s.scale as i64) >> FRACBITS);
        let bottom = center_y - ((s.gz as i64 * s.scale as i64) >> FRACBITS);
        let y1 = row_up(top).max(0);
        let y2 = row_down(bottom).min(self.height as i32 - 1);
        let iscale = (1i64 << 32) / s.scale.max(1) as i64;
        let fuzz_row = ColormapRow {
            colormap: scene.view.colormap,
            row: FUZZ_ROW,
        };
        let light = s.light.unwrap_or_default();
        let span = (s.x2 - s.x1 + 1).max(1);

        for x in s.x1.max(0)..=s.x2.min(self.width as i32 - 1) {
            // A nearer wall closed this column.
            if self.closed_scale[x as usize] > s.scale {
                continue;
            }
            let u = (x - s.x1) * 64 / span;
            for y in y1..=y2 {
                let v = texel_v(0, y - row_up(top), iscale);
                let texel = sprite_texel(thing.type_id, u, v);
                let color = match s.mode {
                    ColumnMode::Normal => self.colormaps.shade(light, texel),
                    ColumnMode::Fuzz => {
                        let offset = FUZZ_OFFSETS[*fuzz_pos % FUZZ_OFFSETS.len()] as i32;
                        *fuzz_pos += 1;
                        let src = (y + offset).clamp(0, self.height as i32 - 1);
                        self.colormaps.shade(fuzz_row, self.get(x, src))
                    }
                    ColumnMode::Translucent => {
                        let shaded = self.colormaps.shade(light, texel) as u16;
                        ((self.get(x, y) as u16 + shaded) / 2) as u8
                    }
                    ColumnMode::Translated(table) => {
                        self.colormaps.shade(light, translate(texel, table))
                    }
                };
                self.put(x, y, color);
            }
        }
    }
}

/*──────────────────────── Rasterizer trait impl ──────────────────────*/
impl Rasterizer for Software {
    fn begin_frame(&mut self, viewport: &Viewport) {
        let (w, h) = (viewport.width.max(1) as usize, viewport.height.max(1) as usize);
        // (re)allocate if resolution changed
        if w != self.width || h != self.height {
            self.width = w;
            self.height = h;
            self.scratch.resize(w * h, 0);
            self.rgba.resize(w * h, 0);
            self.ceil_clip.resize(w, 0);
            self.floor_clip.resize(w, 0);
            self.closed_scale.resize(w, 0);
        }

        self.scratch.fill(0);

        /* reset per-column clip ranges */
        self.ceil_clip.fill(-1);
        self.floor_clip.fill(h as i32);
        self.closed_scale.fill(0);
        self.plane_runs.clear();
        self.masked.clear();
    }

    fn fill_view(&mut self, color: u8) {
        self.scratch.fill(color);
    }

    fn draw_walls(&mut self, scene: &Scene<'_>) {
        for wall in &scene.surfaces.walls {
            self.draw_wall(scene, wall);
        }
    }

    fn draw_planes(&mut self, scene: &Scene<'_>) {
        let runs = std::mem::take(&mut self.plane_runs);
        for &run in &runs {
            match scene.surfaces.planes.get(run.plane) {
                Some(plane) if plane.sky => self.draw_sky_run(scene, run),
                Some(_) => self.draw_flat_run(scene, run),
                None => {}
            }
        }
        self.plane_runs = runs;
    }

    fn draw_masked(&mut self, scene: &Scene<'_>, fuzz_phase: usize) {
        let center_y = scene.projection.center_y;
        let mut masked = std::mem::take(&mut self.masked);
        masked.sort_by_key(|m| m.scale);

        // Far to near, interleaving see-through middles with sprites.
        let mut fuzz_pos = fuzz_phase;
        let mut next = 0;
        for sprite in scene.surfaces.sorted_sprites() {
            while next < masked.len() && masked[next].scale <= sprite.scale {
                self.draw_masked_column(masked[next], center_y);
                next += 1;
            }
            self.draw_sprite(scene, sprite, &mut fuzz_pos);
        }
        for &m in &masked[next..] {
            self.draw_masked_column(m, center_y);
        }
        self.masked = masked;
    }

    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        for (dst, &idx) in self.rgba.iter_mut().zip(&self.scratch) {
            *dst = self.palette[idx as usize];
        }
        submit(&self.rgba, self.width, self.height);
    }
}

/*───────────────────────────────────────────────────────────────────────*/
/*                          Helpers                                      */
/*───────────────────────────────────────────────────────────────────────*/

/// First whole row at or below a 16.16 screen height.
#[inline(always)]
fn row_up(frac: i64) -> i32 {
    ((frac + (1 << FRACBITS) - 1) >> FRACBITS).clamp(-(1 << 20), 1 << 20) as i32
}

/// Row containing a 16.16 screen height.
#[inline(always)]
fn row_down(frac: i64) -> i32 {
    (frac >> FRACBITS).clamp(-(1 << 20), 1 << 20) as i32
}

/// Texture row for screen row `dy` below the center.
#[inline(always)]
fn texel_v(texture_mid: Fixed, dy: i32, iscale: i64) -> i32 {
    ((texture_mid as i64 + dy as i64 * iscale) >> FRACBITS) as i32
}

fn wall_texel(texture: TextureId, u: i32, v: i32) -> u8 {
    let base = 96 + (texture as i32 * 37) % 112;
    // Brick courses 8 high, 16 wide.
    let brick = ((u + ((v >> 3) & 1) * 8) >> 4 ^ (v >> 3)) & 1;
    (base + brick * 16) as u8
}

fn flat_texel(pic: FlatId, u: i32, v: i32) -> u8 {
    let base = 64 + (pic as i32 * 53) % 128;
    let checker = ((u >> 5) ^ (v >> 5)) & 1;
    (base + checker * 16) as u8
}

#[inline]
fn sky_column(angle: Angle) -> i32 {
    (angle.0 >> ANGLETOSKYSHIFT) as i32
}

/// 128 rows of sky, brightest at the top, striped every 8 columns.
fn sky_texel(column: i32, v: i32) -> u8 {
    let gradient = 224 - ((v.clamp(0, 127) * 96) >> 7);
    (gradient + ((column >> 3) & 1) * 8) as u8
}

/// Window grille: every other 4×4 cell is a hole.
fn masked_texel(texture: TextureId, u: i32, v: i32) -> Option<u8> {
    if ((u >> 2) + (v >> 2)) & 1 == 0 {
        None
    } else {
        Some(wall_texel(texture, u, v))
    }
}

fn sprite_texel(type_id: u16, u: i32, v: i32) -> u8 {
    let base = 72 + (type_id as i32 * 29) % 128;
    (base + ((v >> 2) & 1) * 12 + (u >> 5) * 8) as u8
}

/// Colour translation `table` for a texel: shifts the ramp, wrapping.
#[inline]
fn translate(texel: u8, table: u8) -> u8 {
    texel.wrapping_add(table.wrapping_mul(24))
}

/*──────────────────────────────── Tests ──────────────────────────────*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        bsp::{BspScratch, Traversal},
        clip::SolidSegs,
        config::{BrightnessMode, RenderConfig},
        lighting::LightTables,
        projection::Projection,
        surfaces::{FrameStats, VisibleSurfaces},
        view::ViewFrame,
    };
    use crate::math::{ANG180, Angle, FRACUNIT, int_to_fixed};
    use crate::world::{Level, two_room_level};

    struct Frame {
        level: Level,
        projection: Projection,
        lights: LightTables,
        surfaces: VisibleSurfaces,
        view: ViewFrame,
    }

    fn frame(x: i32, y: i32, angle: Angle) -> Frame {
        let level = two_room_level();
        let projection = Projection::new(Viewport::classic(1), 90, 90);
        let lights = LightTables::new(BrightnessMode::Coarse, 1);
        let view = ViewFrame {
            x: int_to_fixed(x),
            y: int_to_fixed(y),
            z: 41 * FRACUNIT,
            angle,
            sin: fine_sine(angle.fine()),
            cos: fine_cosine(angle.fine()),
            ..ViewFrame::default()
        };
        let mut surfaces = VisibleSurfaces::default();
        let mut solid = SolidSegs::new(320);
        let mut stats = FrameStats::default();
        let mut scratch = BspScratch::default();
        let config = RenderConfig::default();
        let mut t = Traversal::new(
            &level,
            &view,
            &projection,
            &lights,
            &config,
            &mut solid,
            &mut surfaces,
            &mut stats,
            &mut scratch,
            1,
        );
        t.run();
        t.nearby_sprites();
        Frame {
            level,
            projection,
            lights,
            surfaces,
            view,
        }
    }

    fn draw(f: &Frame, sw: &mut Software) {
        let scene = Scene {
            level: &f.level,
            view: &f.view,
            projection: &f.projection,
            lights: &f.lights,
            surfaces: &f.surfaces,
        };
        sw.begin_frame(&f.projection.viewport);
        sw.draw_walls(&scene);
        sw.draw_planes(&scene);
        sw.draw_masked(&scene, 0);
    }

    #[test]
    fn fill_and_submit_through_palette() {
        let mut sw = Software::default();
        sw.begin_frame(&Viewport::classic(1));
        sw.fill_view(0xb0);
        let mut seen = None;
        sw.end_frame(|buf, w, h| seen = Some((buf[0], buf.len(), w, h)));
        assert_eq!(seen, Some((0x00b0_b0b0, 320 * 200, 320, 200)));
    }

    #[test]
    fn closed_room_leaves_no_holes() {
        let f = frame(-128, 0, ANG180);
        let mut sw = Software::default();
        draw(&f, &mut sw);
        assert!(sw.indices().iter().all(|&c| c != 0));
    }

    #[test]
    fn looking_through_the_window_fills_every_pixel() {
        let f = frame(-128, 0, Angle(0));
        let mut sw = Software::default();
        draw(&f, &mut sw);
        assert!(sw.indices().iter().all(|&c| c != 0));
    }

    #[test]
    fn sky_is_full_bright() {
        // East room ceiling is sky, seen between the divider's upper wall
        // (row 54) and the far east wall (row 78).
        let f = frame(-250, 0, Angle(0));
        let mut sw = Software::default();
        draw(&f, &mut sw);
        let column = sky_column(f.view.angle + f.projection.x_to_view_angle[160]);
        let v = texel_v(SKY_TEXTURE_MID, 66 - 100, f.projection.sky_iscale as i64);
        assert_eq!(v, 66);
        assert_eq!(sw.indices()[66 * 320 + 160], sky_texel(column, v));
    }

    #[test]
    fn linear_sky_picks_columns_from_the_linear_table() {
        // Column 96 sees sky between the divider (row 54) and the east
        // room's north wall (row 64). The two mappings land on different
        // 8-column stripes there.
        let mut f = frame(-250, 0, Angle(0));
        f.view.linear_sky = true;
        let mut sw = Software::default();
        draw(&f, &mut sw);
        let linear = sky_texel(sky_column(f.projection.linear_sky_angle[96]), 60);
        let curved = sky_texel(sky_column(f.projection.x_to_view_angle[96]), 60);
        assert_ne!(linear, curved);
        assert_eq!(sw.indices()[60 * 320 + 96], linear);

        f.view.linear_sky = false;
        draw(&f, &mut sw);
        assert_eq!(sw.indices()[60 * 320 + 96], curved);
    }

    #[test]
    fn sky_rows_follow_the_sky_scale() {
        assert_eq!(texel_v(SKY_TEXTURE_MID, 0, FRACUNIT as i64), 100);
        // Twice the resolution: two screen rows per texture row.
        assert_eq!(texel_v(SKY_TEXTURE_MID, -40, FRACUNIT as i64 / 2), 80);
        assert!(sky_texel(0, 0) > sky_texel(0, 127));
        assert_eq!(sky_texel(0, 500), sky_texel(0, 127));
    }

    #[test]
    fn resolution_change_reallocates() {
        let mut sw = Software::default();
        sw.begin_frame(&Viewport::classic(1));
        sw.begin_frame(&Viewport::classic(2));
        assert_eq!(sw.size(), (640, 400));
        assert_eq!(sw.indices().len(), 640 * 400);
    }

    #[test]
    fn translation_and_helpers() {
        assert_eq!(translate(100, 0), 100);
        assert_eq!(translate(100, 1), 124);
        assert_eq!(row_up(FRACUNIT as i64 + 1), 2);
        assert_eq!(row_down(FRACUNIT as i64 + 1), 1);
        assert!(masked_texel(3, 0, 0).is_none());
        assert!(masked_texel(3, 4, 0).is_some());
    }
}
