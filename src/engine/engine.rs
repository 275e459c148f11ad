//! Frame orchestration: the one object that owns every piece of refresh
//! state and runs the stages of a frame in order.

use log::{debug, trace};

use crate::{
    engine::{
        bsp::{BspScratch, Traversal},
        clip::SolidSegs,
        config::{BrightnessMode, RenderConfig, Viewport},
        effects::{FovEffects, ZoomState},
        lighting::LightTables,
        player::{GameClock, LocalView, PlayerSnapshot, Session},
        projection::Projection,
        surfaces::{FrameStats, VisibleSurfaces},
        view::{ViewFrame, ViewSetup},
    },
    math::Fixed,
    renderer::{EventPump, Rasterizer, Scene},
    world::Level,
};

/// Palette index the view is flooded with when hunting for unrendered
/// pixels.
pub const HOM_COLOR: u8 = 0xb0;

/// Fuzz offsets repeat after this many pixels.
const FUZZ_PERIOD: usize = 50;

pub struct RendererContext {
    config: RenderConfig,
    viewport: Viewport,
    projection: Projection,
    lights: LightTables,
    effects: FovEffects,
    view_setup: ViewSetup,

    /* per-frame buffers, reused */
    solid: SolidSegs,
    surfaces: VisibleSurfaces,
    scratch: BspScratch,

    view: ViewFrame,
    stats: FrameStats,
    validcount: u32,
    fuzz_phase: usize,
}

impl RendererContext {
    pub fn new(config: RenderConfig, viewport: Viewport, colormap_count: usize) -> Self {
        let config = config.sanitized();
        Self {
            projection: Projection::new(viewport, config.fov, config.fov),
            lights: LightTables::new(config.brightness, colormap_count),
            effects: FovEffects::default(),
            view_setup: ViewSetup::new(0x5eed),
            solid: SolidSegs::new(viewport.width),
            surfaces: VisibleSurfaces::default(),
            scratch: BspScratch::default(),
            view: ViewFrame::default(),
            stats: FrameStats::default(),
            validcount: 0,
            fuzz_phase: 0,
            config,
            viewport,
        }
    }

    /*──────────────────────────── Settings ──────────────────────────────*/

    /// Replace the options. Light tables are rebuilt right away when the
    /// brightness mode changed; the projection follows on the next frame.
    pub fn set_config(&mut self, config: RenderConfig) {
        let config = config.sanitized();
        let rebuild = config.brightness != self.lights.mode();
        self.config = config;
        if rebuild {
            self.lights.rebuild(self.config.brightness, self.lights.colormap_count());
        }
    }

    pub fn set_brightness_mode(&mut self, mode: BrightnessMode) {
        self.config.brightness = mode;
        self.lights.rebuild(mode, self.lights.colormap_count());
    }

    /// Number of colormaps the asset layer loaded; index 0 is the base map.
    pub fn set_colormap_count(&mut self, count: usize) {
        if count != self.lights.colormap_count() {
            self.lights.rebuild(self.config.brightness, count);
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport != self.viewport {
            debug!("viewport {}x{}", viewport.width, viewport.height);
            self.viewport = viewport;
            self.solid.clear(viewport.width);
        }
    }

    pub fn set_fov(&mut self, fov: i32) {
        self.config.fov = fov;
        self.config = self.config.sanitized();
    }

    /*──────────────────────────── Effects ───────────────────────────────*/

    pub fn set_zoom(&mut self, state: ZoomState) {
        self.effects.set_zoom(state, &self.config);
    }

    pub fn trigger_teleport(&mut self) {
        self.effects.trigger_teleport(&self.config);
    }

    pub fn add_shake(&mut self, value: i32) {
        self.view_setup.shake.add(value, &self.config);
    }

    /// A blast of `force` over `range` map units at `(bomb_x, bomb_y)`.
    pub fn explosion(
        &mut self,
        player: &PlayerSnapshot,
        bomb_x: Fixed,
        bomb_y: Fixed,
        force: i32,
        range: i32,
    ) {
        self.view_setup.shake.explosion(
            &self.config,
            player.x,
            player.y,
            player.radius,
            bomb_x,
            bomb_y,
            force,
            range,
        );
    }

    /// Drop every transient effect, e.g. on level change.
    pub fn clear_effects(&mut self) {
        self.effects.clear(&self.config);
        self.view_setup.shake.clear();
        self.view_setup.chasecam.reset();
    }

    /*──────────────────────────── Getters ───────────────────────────────*/

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    #[inline]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[inline]
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    #[inline]
    pub fn lights(&self) -> &LightTables {
        &self.lights
    }

    #[inline]
    pub fn effects(&self) -> &FovEffects {
        &self.effects
    }

    /// Camera of the last rendered frame.
    #[inline]
    pub fn view(&self) -> &ViewFrame {
        &self.view
    }

    #[inline]
    pub fn surfaces(&self) -> &VisibleSurfaces {
        &self.surfaces
    }

    #[inline]
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /*──────────────────────────── Frame ─────────────────────────────────*/

    /// Render the player's view: set up the camera, walk the tree and hand
    /// the result to `rasterizer` stage by stage, servicing `pump` between
    /// stages. With the automap up only walls are drawn.
    #[allow(clippy::too_many_arguments)]
    pub fn render_player_view<R: Rasterizer, P: EventPump>(
        &mut self,
        level: &Level,
        player: &PlayerSnapshot,
        local: Option<&LocalView>,
        clock: &GameClock,
        session: &Session,
        rasterizer: &mut R,
        pump: &mut P,
    ) {
        self.stats = FrameStats::default();

        // FOV effects feed the projection; rebuild only on change.
        let fov = self.effects.advance(&self.config, clock.game_tic, clock.frac);
        if !self.projection.matches(&self.viewport, fov, self.config.fov) {
            self.projection = Projection::new(self.viewport, fov, self.config.fov);
        }

        self.view = self.view_setup.setup_frame(
            level,
            &self.config,
            self.lights.params().bright,
            self.lights.colormap_count(),
            player,
            local,
            clock,
            session,
        );
        self.projection.set_pitch(self.view.pitch);

        self.validcount = self.validcount.wrapping_add(1);
        if self.validcount == 0 {
            self.scratch = BspScratch::default();
            self.validcount = 1;
        }

        self.solid.clear(self.viewport.width);
        self.surfaces.clear();
        rasterizer.begin_frame(&self.viewport);

        if self.config.autodetect_hom {
            let flash_off = self.config.flashing_hom && clock.game_tic % 20 >= 9;
            rasterizer.fill_view(if flash_off { 0 } else { HOM_COLOR });
        }

        pump.pump();

        let mut traversal = Traversal::new(
            level,
            &self.view,
            &self.projection,
            &self.lights,
            &self.config,
            &mut self.solid,
            &mut self.surfaces,
            &mut self.stats,
            &mut self.scratch,
            self.validcount,
        );
        traversal.run();
        traversal.nearby_sprites();

        self.stats.planes = self.surfaces.planes.len() as u32;
        trace!("frame: {:?}", self.stats);

        let scene = Scene {
            level,
            view: &self.view,
            projection: &self.projection,
            lights: &self.lights,
            surfaces: &self.surfaces,
        };
        rasterizer.draw_walls(&scene);

        if session.automap {
            return;
        }

        pump.pump();
        rasterizer.draw_planes(&scene);
        pump.pump();
        rasterizer.draw_masked(&scene, self.fuzz_phase);
        self.fuzz_phase = (self.fuzz_phase + 1) % FUZZ_PERIOD;
        pump.pump();
    }
}

/*──────────────────────────────── Tests ──────────────────────────────*/
