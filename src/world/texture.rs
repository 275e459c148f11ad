// Read-only colour data the refresh consumes: palette and colormap sets.
// Loading them from disk is the asset layer's job; the refresh only ever
// refers to rows through `ColormapRow` handles.

use std::ops::{Index, IndexMut};

/// Handle of a wall texture owned by the asset layer.
pub type TextureId = u16;

/// Handle of a floor / ceiling flat owned by the asset layer.
pub type FlatId = u16;

/// Texture slot that means "nothing to draw".
pub const NO_TEXTURE: TextureId = 0;

/// Light rows in one colormap (0 = full bright, 31 = darkest).
pub const NUMCOLORMAPS: usize = 32;

/// Rows stored per colormap: the light rows plus invulnerability and black.
pub const COLORMAP_ROWS: usize = 34;

pub const INVULN_ROW: u8 = 32;

pub struct Palette(pub [u32; 256]);
impl Default for Palette {
    fn default() -> Self {
        Palette([0u32; 256])
    }
}
impl Index<usize> for Palette {
    type Output = u32;
    fn index(&self, idx: usize) -> &u32 {
        &self.0[idx]
    }
}
impl IndexMut<usize> for Palette {
    fn index_mut(&mut self, idx: usize) -> &mut u32 {
        &mut self.0[idx]
    }
}

impl Palette {
    /// 256-step grey ramp, 0x00RRGGBB.
    pub fn greyscale() -> Self {
        let mut pal = Palette::default();
        for i in 0..256 {
            let v = i as u32;
            pal[i] = (v << 16) | (v << 8) | v;
        }
        pal
    }
}

/// One remapping table: 34 rows of 256 palette indices.
#[derive(Clone)]
pub struct Colormap(pub [[u8; 256]; COLORMAP_ROWS]);
impl Default for Colormap {
    fn default() -> Self {
        Colormap([[0u8; 256]; COLORMAP_ROWS])
    }
}
impl Index<usize> for Colormap {
    type Output = [u8; 256];
    fn index(&self, idx: usize) -> &Self::Output {
        &self.0[idx]
    }
}
impl IndexMut<usize> for Colormap {
    fn index_mut(&mut self, idx: usize) -> &mut [u8; 256] {
        &mut self.0[idx]
    }
}

/// A reference to one row of one colormap, i.e. the legacy
/// `colormaps[cm] + row * 256` pointer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ColormapRow {
    pub colormap: u16,
    pub row: u8,
}

/// Every colormap loaded for the session; index 0 is the base COLORMAP.
pub struct Colormaps {
    maps: Vec<Colormap>,
}

impl Colormaps {
    /// The base map always exists, so lookups can fall back to it.
    pub fn new(base: Colormap, alternates: Vec<Colormap>) -> Self {
        let mut maps = Vec::with_capacity(alternates.len() + 1);
        maps.push(base);
        maps.extend(alternates);
        Self { maps }
    }

    /// Linear-fade colormaps for a greyscale palette; map `n` is tinted
    /// darker by `n * 16` so alternates are visibly different.
    pub fn synthetic(count: usize) -> Self {
        let maps = (0..count.max(1))
            .map(|n| {
                let mut cm = Colormap::default();
                for row in 0..NUMCOLORMAPS {
                    for idx in 0..256 {
                        let fade = idx * (NUMCOLORMAPS - row) / NUMCOLORMAPS;
                        cm[row][idx] = fade.saturating_sub(n * 16) as u8;
                    }
                }
                for idx in 0..256 {
                    cm[INVULN_ROW as usize][idx] = 255 - idx as u8;
                    cm[COLORMAP_ROWS - 1][idx] = 0;
                }
                cm
            })
            .collect();
        Self { maps }
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Palette index for `texel` shaded through `row`.
    pub fn shade(&self, row: ColormapRow, texel: u8) -> u8 {
        let cm = self
            .maps
            .get(row.colormap as usize)
            .unwrap_or(&self.maps[0]);
        cm[(row.row as usize).min(COLORMAP_ROWS - 1)][texel as usize]
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_rows_darken() {
        let maps = Colormaps::synthetic(2);
        let bright = maps.shade(ColormapRow { colormap: 0, row: 0 }, 200);
        let dark = maps.shade(ColormapRow { colormap: 0, row: 31 }, 200);
        assert!(bright > dark);
        assert_eq!(bright, 200);
    }

    #[test]
    fn unknown_colormap_falls_back_to_base() {
        let maps = Colormaps::synthetic(1);
        let row = ColormapRow { colormap: 9, row: 4 };
        assert_eq!(maps.shade(row, 100), maps.shade(ColormapRow { colormap: 0, row: 4 }, 100));
    }

    #[test]
    fn base_map_comes_first() {
        let mut inverted = Colormap::default();
        for idx in 0..256 {
            inverted[0][idx] = 255 - idx as u8;
        }
        let maps = Colormaps::new(inverted.clone(), Vec::new());
        assert_eq!(maps.len(), 1);
        assert!(!maps.is_empty());
        // Missing alternates shade through the base map.
        let row = ColormapRow { colormap: 3, row: 0 };
        assert_eq!(maps.shade(row, 10), 245);

        let maps = Colormaps::new(Colormap::default(), vec![inverted]);
        assert_eq!(maps.len(), 2);
        assert_eq!(maps.shade(ColormapRow { colormap: 1, row: 0 }, 10), 245);
    }
}
