//! Transient view effects: FOV zoom, teleport FOV pulse and explosion shake.
//!
//! Effects advance once per simulation tic. Between tics the FOV effects are
//! blended by the frame fraction; shake jitter is resampled every frame.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::engine::config::RenderConfig;
use crate::math::{FRACBITS, FRACUNIT, Fixed};

/// FOV degrees the teleport pulse starts at.
pub const TELEPORT_PULSE: i32 = 50;
/// Degrees the pulse loses per tic.
pub const TELEPORT_DECAY: i32 = 5;
/// Largest zoom step per tic, in degrees.
pub const MAX_ZOOM_STEP: i32 = 16;

pub const MAXSHAKE: i32 = 50;
const SHAKERANGEMULT: i32 = 5;

/// One eased quantity: `old` and `target` are the values at the previous and
/// next tic, `current` is what the frame being drawn sees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Eased {
    pub old: i32,
    pub current: i32,
    pub target: i32,
}

impl Eased {
    fn settle(&mut self) {
        self.old = self.target;
        self.current = self.target;
    }

    fn reset(&mut self, v: i32) {
        *self = Eased {
            old: v,
            current: v,
            target: v,
        };
    }

    fn blend(&mut self, frac: Fixed) {
        let t = frac as f32 / FRACUNIT as f32;
        self.current = (self.old as f32 + (self.target - self.old) as f32 * t) as i32;
    }

    fn active(&self) -> bool {
        self.target != 0 || self.current != 0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ZoomState {
    #[default]
    Off,
    On,
    /// Snap back to no zoom on the next advance.
    Reset,
}

#[derive(Debug, Default)]
pub struct FovEffects {
    zoom: Eased,
    teleport: Eased,
    zoomed: ZoomState,
    /// Some effect is still moving and the FOV must be recomputed.
    pending: bool,
    last_tic: Option<u64>,
}

impl FovEffects {
    pub fn zoom_state(&self) -> ZoomState {
        self.zoomed
    }

    pub fn zoom(&self) -> Eased {
        self.zoom
    }

    pub fn teleport(&self) -> Eased {
        self.teleport
    }

    /// Request zoom in (`On`), out (`Off`) or an immediate reset.
    ///
    /// A pending reset wins over anything requested before the next advance.
    /// Zooming is refused when the zoom FOV equals the base FOV.
    pub fn set_zoom(&mut self, state: ZoomState, cfg: &RenderConfig) {
        if state == ZoomState::Reset || self.zoomed == ZoomState::Reset {
            self.zoomed = ZoomState::Reset;
            self.pending = true;
            return;
        }
        if self.zoomed != state {
            self.pending = true;
        }
        self.zoomed = if !cfg.strict && cfg.zoom_fov != cfg.fov {
            state
        } else {
            ZoomState::Off
        };
    }

    /// Start the teleport FOV pulse; it also cancels any zoom.
    pub fn trigger_teleport(&mut self, cfg: &RenderConfig) {
        if cfg.strict || !cfg.teleporter_zoom {
            return;
        }
        self.set_zoom(ZoomState::Reset, cfg);
        self.teleport.target = TELEPORT_PULSE;
        self.pending = true;
    }

    /// Forget every effect, e.g. on level change.
    pub fn clear(&mut self, cfg: &RenderConfig) {
        self.set_zoom(ZoomState::Reset, cfg);
        if self.teleport.current != 0 {
            self.pending = true;
        }
        self.teleport.reset(0);
    }

    /// Advance to `game_tic` (a no-op step if it was already seen) and return
    /// the FOV to render with: base FOV plus every effect's current value.
    pub fn advance(&mut self, cfg: &RenderConfig, game_tic: u64, frac: Fixed) -> i32 {
        let zoom_target = if cfg.strict || self.zoomed == ZoomState::Reset {
            self.zoom.reset(0);
            self.zoomed = ZoomState::Off;
            0
        } else {
            let target = if self.zoomed == ZoomState::On {
                cfg.zoom_fov - cfg.fov
            } else {
                0
            };
            // The base FOV moved while zoomed: jump rather than overshoot.
            if self.zoomed == ZoomState::On && self.zoom.target.abs() > target.abs() {
                self.zoom.reset(target);
            }
            target
        };

        if !cfg.strict
            && (self.zoom.target != zoom_target || self.zoom.active() || self.teleport.active())
        {
            self.pending = true;
        }

        if self.pending {
            if self.last_tic != Some(game_tic) {
                self.step(zoom_target);
            } else if cfg.uncapped {
                self.zoom.blend(frac);
                self.teleport.blend(frac);
            }
        }
        self.last_tic = Some(game_tic);

        cfg.fov + self.zoom.current + self.teleport.current
    }

    fn step(&mut self, zoom_target: i32) {
        let was_moving =
            self.zoom.old != self.zoom.target || self.teleport.old != self.teleport.target;
        self.pending = false;

        self.zoom.settle();
        if zoom_target != 0 || self.zoom.target != 0 {
            let diff = zoom_target - self.zoom.target;
            let sign = if diff > 0 { 1 } else { -1 };
            let step = ((diff.abs() as f64 / 3.0).round() as i32).clamp(1, MAX_ZOOM_STEP);
            self.zoom.target += step * sign;
            if (sign > 0 && self.zoom.target > zoom_target)
                || (sign < 0 && self.zoom.target < zoom_target)
            {
                self.zoom.target = zoom_target;
            }
            if self.zoom.current != self.zoom.target {
                self.pending = true;
            }
        }

        self.teleport.settle();
        if self.teleport.target != 0 {
            self.teleport.target -= TELEPORT_DECAY;
            if self.teleport.target < 0 {
                self.teleport.target = 0;
            } else {
                self.pending = true;
            }
        }

        if was_moving && !self.pending {
            debug!("fov effects settled (zoom {})", self.zoom.current);
        }
    }
}

/// Explosion shake: a bounded magnitude that drops by one every level tic
/// and jitters the view origin while positive.
pub struct Shake {
    amount: i32,
    offset: (Fixed, Fixed, Fixed),
    last_time: Option<u32>,
    rng: StdRng,
}

impl Default for Shake {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Shake {
    pub fn new(seed: u64) -> Self {
        Self {
            amount: 0,
            offset: (0, 0, 0),
            last_time: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn amount(&self) -> i32 {
        self.amount
    }

    /// Add `value` to the magnitude, capped at [`MAXSHAKE`].
    pub fn add(&mut self, value: i32, cfg: &RenderConfig) {
        if cfg.strict || !cfg.explosion_shake {
            self.amount = 0;
            return;
        }
        self.amount = (self.amount + value).min(MAXSHAKE);
    }

    pub fn clear(&mut self) {
        self.amount = 0;
    }

    /// Shake caused by a blast of `force` over `range` map units centred on
    /// `(bomb_x, bomb_y)`, felt by a viewer at `(x, y)` with `radius`.
    #[allow(clippy::too_many_arguments)]
    pub fn explosion(
        &mut self,
        cfg: &RenderConfig,
        x: Fixed,
        y: Fixed,
        radius: Fixed,
        bomb_x: Fixed,
        bomb_y: Fixed,
        force: i32,
        range: i32,
    ) {
        if cfg.strict || !cfg.explosion_shake {
            return;
        }
        let range = range * SHAKERANGEMULT;
        let force = force * SHAKERANGEMULT;

        let dx = (x as i64 - bomb_x as i64).abs();
        let dy = (y as i64 - bomb_y as i64).abs();
        let dist = ((dx.max(dy) - radius as i64) >> FRACBITS).max(0) as i32;
        if dist >= range {
            return;
        }
        self.add((force * (range - dist) / range) / ((128 / MAXSHAKE) * SHAKERANGEMULT), cfg);
    }

    /// View offset for this frame. While `frozen` (paused, or a menu over a
    /// local game) the previous jitter is held and the magnitude kept.
    pub fn sample(&mut self, level_time: u32, frozen: bool) -> (Fixed, Fixed, Fixed) {
        if self.amount <= 0 {
            return (0, 0, 0);
        }
        if !frozen {
            self.offset = (self.jitter(), self.jitter(), self.jitter());
            if self.last_time != Some(level_time) {
                self.amount -= 1;
            }
            self.last_time = Some(level_time);
        }
        self.offset
    }

    fn jitter(&mut self) -> Fixed {
        let r: i32 = self.rng.gen_range(0..256);
        ((r - 128) % 3) * FRACUNIT * self.amount / MAXSHAKE
    }
}

/*──────────────────────────────── Tests ──────────────────────────────*/
#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> RenderConfig {
        RenderConfig {
            zoom_fov: 40,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn zoom_eases_in_with_bounded_steps() {
        let cfg = cfg();
        let mut fx = FovEffects::default();
        fx.set_zoom(ZoomState::On, &cfg);

        let mut fovs = Vec::new();
        for tic in 0..12 {
            fovs.push(fx.advance(&cfg, tic, 0));
        }
        // Target -50: a third of the remaining distance per tic, at most 16;
        // `current` trails the target by one tic.
        assert_eq!(&fovs[..4], &[90, 74, 63, 55]);
        assert_eq!(*fovs.last().unwrap(), 40);
        for w in fovs.windows(2) {
            assert!((w[0] - w[1]).abs() <= MAX_ZOOM_STEP);
        }
    }

    #[test]
    fn zoom_blends_between_tics() {
        let cfg = cfg();
        let mut fx = FovEffects::default();
        fx.set_zoom(ZoomState::On, &cfg);
        fx.advance(&cfg, 0, 0);
        // Second call within tic 0: halfway from 0 towards -16.
        assert_eq!(fx.advance(&cfg, 0, FRACUNIT / 2), 82);
    }

    #[test]
    fn zoom_refused_when_fovs_match() {
        let cfg = RenderConfig {
            zoom_fov: 90,
            ..RenderConfig::default()
        };
        let mut fx = FovEffects::default();
        fx.set_zoom(ZoomState::On, &cfg);
        assert_eq!(fx.zoom_state(), ZoomState::Off);
    }

    #[test]
    fn reset_snaps_back() {
        let cfg = cfg();
        let mut fx = FovEffects::default();
        fx.set_zoom(ZoomState::On, &cfg);
        for tic in 0..5 {
            fx.advance(&cfg, tic, 0);
        }
        fx.set_zoom(ZoomState::Reset, &cfg);
        fx.set_zoom(ZoomState::On, &cfg);
        assert_eq!(fx.advance(&cfg, 5, 0), 90);
        assert_eq!(fx.zoom_state(), ZoomState::Off);
    }

    #[test]
    fn teleport_pulse_decays_to_zero() {
        let cfg = cfg();
        let mut fx = FovEffects::default();
        fx.trigger_teleport(&cfg);
        let mut fov = Vec::new();
        for tic in 0..14 {
            fov.push(fx.advance(&cfg, tic, 0));
        }
        assert_eq!(&fov[..3], &[140, 135, 130]);
        assert_eq!(fov[10], 90);
        assert_eq!(*fov.last().unwrap(), 90);
        assert_eq!(fx.teleport(), Eased::default());
    }

    #[test]
    fn strict_mode_blocks_effects() {
        let cfg = RenderConfig {
            strict: true,
            ..cfg()
        };
        let mut fx = FovEffects::default();
        fx.trigger_teleport(&cfg);
        fx.set_zoom(ZoomState::On, &cfg);
        assert_eq!(fx.advance(&cfg, 0, 0), 90);
        let mut shake = Shake::new(1);
        shake.add(20, &cfg);
        assert_eq!(shake.amount(), 0);
    }

    #[test]
    fn shake_decrements_once_per_level_tic() {
        let cfg = cfg();
        let mut shake = Shake::new(7);
        shake.add(80, &cfg);
        assert_eq!(shake.amount(), MAXSHAKE);

        shake.sample(10, false);
        shake.sample(10, false);
        assert_eq!(shake.amount(), MAXSHAKE - 1);
        let held = shake.sample(11, true);
        assert_eq!(shake.amount(), MAXSHAKE - 1);
        assert_eq!(shake.sample(12, true), held);

        for t in 13..100 {
            let (x, y, z) = shake.sample(t, false);
            for v in [x, y, z] {
                assert!(v.abs() <= 2 * FRACUNIT);
            }
        }
        assert_eq!(shake.amount(), 0);
        assert_eq!(shake.sample(200, false), (0, 0, 0));
    }

    #[test]
    fn explosion_falls_off_with_distance() {
        let cfg = cfg();
        let mut near = Shake::new(0);
        near.explosion(&cfg, 0, 0, 16 * FRACUNIT, 32 * FRACUNIT, 0, 128, 128);
        let mut far = Shake::new(0);
        far.explosion(&cfg, 0, 0, 16 * FRACUNIT, 600 * FRACUNIT, 0, 128, 128);
        let mut out = Shake::new(0);
        out.explosion(&cfg, 0, 0, 16 * FRACUNIT, 700 * FRACUNIT, 0, 128, 128);
        assert!(near.amount() > far.amount());
        assert!(far.amount() > 0);
        assert_eq!(out.amount(), 0);
    }
}
