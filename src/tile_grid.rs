use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::CollisionError;
use crate::geometry::Aab;
use crate::types::{TILE_HEIGHT, TILE_WIDTH};

/// Tile id reserved for empty cells.
pub const EMPTY_TILE: u16 = 0;

/// Per-tile-type surface data, indexed by tile id.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileInfo {
    pub friction: f32,
}

impl Default for TileInfo {
    fn default() -> Self {
        Self { friction: 1.0 }
    }
}

/// Half-open tile-index rectangle `[x0, x1) x [y0, y1)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct TileRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl TileRect {
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Row-major iteration over the cells of the rectangle.
    pub fn cells(self) -> impl Iterator<Item = (u32, u32)> {
        (self.y0..self.y1).flat_map(move |y| (self.x0..self.x1).map(move |x| (x, y)))
    }
}

/// Dense grid of tile ids. `EMPTY_TILE` cells are passable, everything else is solid.
#[derive(Clone, Debug)]
pub struct TileGrid {
    width: u32,
    height: u32,
    cells: Vec<u16>,
}

impl TileGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![EMPTY_TILE; (width as usize) * (height as usize)],
        }
    }

    pub fn from_cells(width: u32, height: u32, cells: Vec<u16>) -> Result<Self, CollisionError> {
        let expected = (width as usize) * (height as usize);
        if cells.len() != expected {
            return Err(CollisionError::GridSizeMismatch {
                width,
                height,
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { width, height, cells })
    }

    /// Check that every tile id used by the grid has an entry in `infos`.
    pub fn validate_infos(&self, infos: &[TileInfo]) -> Result<(), CollisionError> {
        match self
            .cells
            .iter()
            .enumerate()
            .find(|&(_, &id)| id != EMPTY_TILE && id as usize >= infos.len())
        {
            Some((index, &id)) => Err(CollisionError::UnknownTile { id, index }),
            None => Ok(()),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn index_of(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + x as usize
    }

    pub fn tile_at(&self, x: u32, y: u32) -> u16 {
        if x >= self.width || y >= self.height {
            return EMPTY_TILE;
        }
        self.cells[self.index_of(x, y)]
    }

    pub fn tile_at_index(&self, index: usize) -> u16 {
        self.cells.get(index).copied().unwrap_or(EMPTY_TILE)
    }

    pub fn is_solid(&self, x: u32, y: u32) -> bool {
        self.tile_at(x, y) != EMPTY_TILE
    }

    pub fn is_solid_index(&self, index: usize) -> bool {
        self.tile_at_index(index) != EMPTY_TILE
    }

    pub fn set(&mut self, x: u32, y: u32, id: u16) {
        if x < self.width && y < self.height {
            let i = self.index_of(x, y);
            self.cells[i] = id;
        }
    }

    /// Fill the inclusive cell rectangle with `id`.
    pub fn fill(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, id: u16) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.set(x, y, id);
            }
        }
    }

    /// World-space bounds of the cell at linear `index`.
    pub fn tile_bounds(&self, index: usize) -> Aab {
        let w = self.width.max(1) as usize;
        let x = (index % w) as f32;
        let y = (index / w) as f32;
        Aab::from_min_size(
            Vec2::new(x * TILE_WIDTH, y * TILE_HEIGHT),
            Vec2::new(TILE_WIDTH, TILE_HEIGHT),
        )
    }

    /// Tile rectangle covering `bounds` (world space), clamped to the grid.
    pub fn region_for(&self, bounds: Aab) -> TileRect {
        let clamp = |v: f32, hi: u32| -> u32 {
            if v <= 0.0 {
                0
            } else if v >= hi as f32 {
                hi
            } else {
                v as u32
            }
        };
        TileRect {
            x0: clamp((bounds.min.x / TILE_WIDTH).floor(), self.width),
            y0: clamp((bounds.min.y / TILE_HEIGHT).floor(), self.height),
            x1: clamp((bounds.max.x / TILE_WIDTH).ceil(), self.width),
            y1: clamp((bounds.max.y / TILE_HEIGHT).ceil(), self.height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cells_size_mismatch() {
        let err = TileGrid::from_cells(4, 4, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            CollisionError::GridSizeMismatch { expected: 16, actual: 15, .. }
        ));
    }

    #[test]
    fn test_tile_bounds_and_index() {
        let mut g = TileGrid::new(8, 4);
        g.set(3, 2, 1);
        let idx = g.index_of(3, 2);
        assert!(g.is_solid_index(idx));
        assert_eq!(g.tile_bounds(idx), Aab::new(48.0, 32.0, 64.0, 48.0));
        assert!(!g.is_solid(100, 100));
    }

    #[test]
    fn test_region_clamps_to_grid() {
        let g = TileGrid::new(4, 4);
        let r = g.region_for(Aab::new(-100.0, -3.0, 17.0, 1000.0));
        assert_eq!(r, TileRect { x0: 0, y0: 0, x1: 2, y1: 4 });
        assert_eq!(r.cells().count(), 8);
    }

    #[test]
    fn test_validate_infos_reports_unknown_id() {
        let mut g = TileGrid::new(2, 2);
        g.set(1, 1, 3);
        let infos = [TileInfo::default(), TileInfo::default()];
        assert!(matches!(
            g.validate_infos(&infos),
            Err(CollisionError::UnknownTile { id: 3, index: 3 })
        ));
    }
}
