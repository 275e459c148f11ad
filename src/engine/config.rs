//! User-facing refresh options and viewport geometry.

use crate::math::{FRACBITS, Fixed};

/// The legacy 90° projection.
pub const FOV_DEFAULT: i32 = 90;
pub const FOV_MIN: i32 = 60;
pub const FOV_MAX: i32 = 120;
pub const ZOOM_FOV_MIN: i32 = 20;
pub const ZOOM_FOV_MAX: i32 = 140;

/// Virtual screen the art and aspect correction were made for.
pub const SCREENWIDTH: i32 = 320;
pub const SCREENHEIGHT: i32 = 200;
/// Height the 320×200 frame is stretched to on a 4:3 display.
pub const ACTUALHEIGHT: i32 = 240;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BrightnessMode {
    /// 16 light levels, 128 depth buckets.
    #[default]
    Coarse,
    /// 32 light levels, 1024 depth buckets.
    Smooth,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChasecamMode {
    #[default]
    Off,
    Back,
    Front,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Base horizontal field of view in degrees.
    pub fov: i32,
    /// Field of view the zoom effect eases towards.
    pub zoom_fov: i32,
    pub brightness: BrightnessMode,

    pub chasecam_mode: ChasecamMode,
    /// Switch to the chase camera while the player is dead.
    pub death_camera: bool,
    /// Map units behind the player.
    pub chasecam_distance: i32,
    /// Map units above the player's feet.
    pub chasecam_height: i32,

    pub explosion_shake: bool,
    pub teleporter_zoom: bool,
    /// Disables every cosmetic deviation from the classic refresh.
    pub strict: bool,

    /// Interpolate between simulation tics.
    pub uncapped: bool,
    /// Apply mouse look directly to the rendered view.
    pub raw_input: bool,
    /// Keep the weapon-flash light boost.
    pub a11y_weapon_flash: bool,
    /// Extra light steps added to every sector.
    pub extra_level_brightness: i32,
    pub fake_contrast: bool,
    /// Scroll the sky linearly across the view instead of by view angle.
    pub linear_sky: bool,

    /// Fill the view before traversal so uncovered pixels stand out.
    pub autodetect_hom: bool,
    pub flashing_hom: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fov: FOV_DEFAULT,
            zoom_fov: 45,
            brightness: BrightnessMode::Coarse,
            chasecam_mode: ChasecamMode::Off,
            death_camera: false,
            chasecam_distance: 80,
            chasecam_height: 48,
            explosion_shake: true,
            teleporter_zoom: true,
            strict: false,
            uncapped: true,
            raw_input: true,
            a11y_weapon_flash: true,
            extra_level_brightness: 0,
            fake_contrast: true,
            linear_sky: false,
            autodetect_hom: false,
            flashing_hom: true,
        }
    }
}

impl RenderConfig {
    /// Same options with every numeric field pulled into its legal range.
    pub fn sanitized(&self) -> Self {
        let mut cfg = self.clone();
        cfg.fov = cfg.fov.clamp(FOV_MIN, FOV_MAX);
        cfg.zoom_fov = cfg.zoom_fov.clamp(ZOOM_FOV_MIN, ZOOM_FOV_MAX);
        cfg.chasecam_distance = cfg.chasecam_distance.clamp(1, 256);
        cfg.chasecam_height = cfg.chasecam_height.clamp(0, 128);
        cfg.extra_level_brightness = cfg.extra_level_brightness.clamp(0, 4);
        cfg
    }

    /// `value` unless strict mode is on, in which case the classic default.
    #[inline]
    pub fn cosmetic<T: Default>(&self, value: T) -> T {
        if self.strict { T::default() } else { value }
    }
}

/// Pixel size of the 3-D view window.
///
/// `width_nonwide` is the width a 4:3 view of the same height would have;
/// widescreen views keep the same vertical scale and see more to the sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
    pub width_nonwide: i32,
}

impl Viewport {
    /// 4:3 view scaled up from 320×200 by `scale`.
    pub fn classic(scale: i32) -> Self {
        Self {
            width: SCREENWIDTH * scale,
            height: SCREENHEIGHT * scale,
            width_nonwide: SCREENWIDTH * scale,
        }
    }

    /// Arbitrary window; the non-wide width is derived from the height.
    pub fn widescreen(width: i32, height: i32) -> Self {
        let nonwide = height * SCREENWIDTH / SCREENHEIGHT;
        Self {
            width,
            height,
            width_nonwide: nonwide.min(width),
        }
    }

    #[inline]
    pub fn center_x_frac(&self) -> Fixed {
        (self.width << FRACBITS) / 2
    }

    #[inline]
    pub fn center_x_frac_nonwide(&self) -> Fixed {
        (self.width_nonwide << FRACBITS) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let cfg = RenderConfig {
            fov: 170,
            zoom_fov: 5,
            chasecam_distance: -4,
            extra_level_brightness: 9,
            ..RenderConfig::default()
        }
        .sanitized();
        assert_eq!(cfg.fov, FOV_MAX);
        assert_eq!(cfg.zoom_fov, ZOOM_FOV_MIN);
        assert_eq!(cfg.chasecam_distance, 1);
        assert_eq!(cfg.extra_level_brightness, 4);
    }

    #[test]
    fn strict_mode_silences_cosmetics() {
        let cfg = RenderConfig {
            strict: true,
            ..RenderConfig::default()
        };
        assert_eq!(cfg.cosmetic(3), 0);
        assert!(!cfg.cosmetic(true));
    }

    #[test]
    fn widescreen_keeps_vertical_scale() {
        let vp = Viewport::widescreen(1280, 600);
        assert_eq!(vp.width_nonwide, 960);
        assert_eq!(Viewport::classic(2).center_x_frac(), 320 << FRACBITS);
    }
}
