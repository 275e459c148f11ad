//! Light tables: (light level, depth or scale bucket) → colormap row.
//!
//! The row chosen for a cell is the same for every colormap, so the tables
//! store bare row numbers and [`LightTables::z_row`] / [`LightTables::scale_row`]
//! pair them with the colormap selected for the frame.

use log::debug;

use crate::engine::config::{BrightnessMode, SCREENWIDTH};
use crate::math::{FRACBITS, FRACUNIT, Fixed, fixed_div};
use crate::world::{ColormapRow, NUMCOLORMAPS};

/// Each step of scale falloff moves this many buckets.
pub const DISTMAP: i32 = 2;

/// Resolution constants for one brightness mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightParams {
    pub levels: usize,
    /// Sector light (0..=255) >> `seg_shift` = light level.
    pub seg_shift: u32,
    /// Levels added by a one-step brightness boost.
    pub bright: i32,
    pub max_scale: usize,
    pub scale_shift: u32,
    pub max_z: usize,
    pub z_shift: u32,
}

pub const COARSE: LightParams = LightParams {
    levels: 16,
    seg_shift: 4,
    bright: 1,
    max_scale: 48,
    scale_shift: 12,
    max_z: 128,
    z_shift: 20,
};

pub const SMOOTH: LightParams = LightParams {
    levels: 32,
    seg_shift: 3,
    bright: 2,
    max_scale: 48,
    scale_shift: 12,
    max_z: 1024,
    z_shift: 17,
};

impl BrightnessMode {
    pub fn params(self) -> LightParams {
        match self {
            BrightnessMode::Coarse => COARSE,
            BrightnessMode::Smooth => SMOOTH,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LightTables {
    mode: BrightnessMode,
    params: LightParams,
    colormap_count: usize,
    /// `levels × max_z` rows, for flats and sprites by depth.
    zlight: Vec<u8>,
    /// `levels × max_scale` rows, for wall columns by projected scale.
    scalelight: Vec<u8>,
}

impl LightTables {
    pub fn new(mode: BrightnessMode, colormap_count: usize) -> Self {
        let mut t = Self {
            mode,
            params: mode.params(),
            colormap_count: colormap_count.max(1),
            zlight: Vec::new(),
            scalelight: Vec::new(),
        };
        t.rebuild(mode, colormap_count);
        t
    }

    /// Drop and recompute both tables for `mode`. Safe to call repeatedly.
    pub fn rebuild(&mut self, mode: BrightnessMode, colormap_count: usize) {
        let p = mode.params();
        self.mode = mode;
        self.params = p;
        self.colormap_count = colormap_count.max(1);

        self.zlight = Vec::with_capacity(p.levels * p.max_z);
        self.scalelight = Vec::with_capacity(p.levels * p.max_scale);

        for level in 0..p.levels {
            let startmap = start_map(&p, level);

            for j in 0..p.max_z {
                let scale = fixed_div(SCREENWIDTH / 2 * FRACUNIT, ((j + 1) as i32) << p.z_shift);
                let row = startmap - (scale >> p.scale_shift) / DISTMAP;
                self.zlight.push(clamp_row(row));
            }

            for j in 0..p.max_scale {
                let row = startmap - j as i32 / DISTMAP;
                self.scalelight.push(clamp_row(row));
            }
        }

        debug!(
            "light tables rebuilt: {:?}, {} levels, {} depth buckets, {} colormaps",
            mode, p.levels, p.max_z, self.colormap_count
        );
    }

    #[inline(always)]
    pub fn mode(&self) -> BrightnessMode {
        self.mode
    }

    #[inline(always)]
    pub fn params(&self) -> &LightParams {
        &self.params
    }

    #[inline(always)]
    pub fn colormap_count(&self) -> usize {
        self.colormap_count
    }

    /// Light level for a sector light value plus extra light and the
    /// fake-contrast nudge, clamped to the table.
    pub fn light_level(&self, sector_light: i16, extra: i32, contrast: i32) -> usize {
        let lightnum = (sector_light.max(0) as i32 >> self.params.seg_shift) + extra + contrast;
        lightnum.clamp(0, self.params.levels as i32 - 1) as usize
    }

    /// Depth bucket for a view-space distance.
    #[inline]
    pub fn z_index(&self, dist: Fixed) -> usize {
        ((dist.max(0) >> self.params.z_shift) as usize).min(self.params.max_z - 1)
    }

    /// Scale bucket for a projected wall scale.
    pub fn light_index_for_scale(&self, scale: Fixed, light_focal_length: Fixed) -> usize {
        let focal = light_focal_length.max(1) as i64;
        let index = ((scale as i64 * (160 << FRACBITS)) / focal) >> self.params.scale_shift;
        index.clamp(0, self.params.max_scale as i64 - 1) as usize
    }

    pub fn z_row(&self, colormap: u16, level: usize, z_index: usize) -> ColormapRow {
        let level = level.min(self.params.levels - 1);
        let j = z_index.min(self.params.max_z - 1);
        ColormapRow {
            colormap,
            row: self.zlight[level * self.params.max_z + j],
        }
    }

    pub fn scale_row(&self, colormap: u16, level: usize, scale_index: usize) -> ColormapRow {
        let level = level.min(self.params.levels - 1);
        let j = scale_index.min(self.params.max_scale - 1);
        ColormapRow {
            colormap,
            row: self.scalelight[level * self.params.max_scale + j],
        }
    }
}

#[inline]
fn start_map(p: &LightParams, level: usize) -> i32 {
    let levels = p.levels as i32;
    ((levels - p.bright - level as i32) * 2) * NUMCOLORMAPS as i32 / levels
}

#[inline]
fn clamp_row(row: i32) -> u8 {
    row.clamp(0, NUMCOLORMAPS as i32 - 1) as u8
}

/*──────────────────────────────── Tests ──────────────────────────────*/
