//! Uniform grid over the map indexing live scars by bounding box.
//!
//! Each cell holds the ids of every scar whose texel rectangle touches it.
//! The grid has no notion of scar lifetime or rendering; the scar registry
//! is the only writer.

use crate::arena::SlotId;
use crate::map::{MapDims, SCAR_CELL_TEXELS};

/// Scar bounds in scar texels. `x2`/`y2` are one past the covered texels,
/// matching how the base area is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TexelRect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl TexelRect {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[inline]
    pub fn area(&self) -> i32 {
        (self.x2 - self.x1) * (self.y2 - self.y1)
    }

    /// Overdraw that a newer scar with bounds `self` puts on `older`.
    ///
    /// Measured from the near edge of whichever rectangle starts first to the
    /// far edge of the other, so a large scar swallowing a small one reports
    /// more than the small one's area.
    pub fn overdraw_on(&self, older: &TexelRect) -> i32 {
        if self.x1 >= older.x2 || self.x2 <= older.x1 {
            return 0;
        }
        if self.y1 >= older.y2 || self.y2 <= older.y1 {
            return 0;
        }

        let xs = if self.x1 < older.x1 {
            self.x2 - older.x1
        } else {
            older.x2 - self.x1
        };
        let ys = if self.y1 < older.y1 {
            self.y2 - older.y1
        } else {
            older.y2 - self.y1
        };

        xs * ys
    }
}

/// Inclusive range of grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl CellRect {
    /// Row-major iteration over the covered cells.
    pub fn iter(self) -> impl Iterator<Item = (i32, i32)> {
        (self.y1..=self.y2).flat_map(move |y| (self.x1..=self.x2).map(move |x| (x, y)))
    }

    pub fn cell_count(&self) -> usize {
        if self.x2 < self.x1 || self.y2 < self.y1 {
            return 0;
        }
        ((self.x2 - self.x1 + 1) * (self.y2 - self.y1 + 1)) as usize
    }
}

/// Spatial index of scars.
pub struct ScarGrid {
    cells_x: i32,
    cells_y: i32,
    cells: Vec<Vec<SlotId>>,
}

impl ScarGrid {
    /// One cell per `SCAR_CELL_TEXELS` scar texels, at least one cell per axis.
    pub fn new(map: MapDims) -> Self {
        let cells_x = (map.hmapx() / SCAR_CELL_TEXELS).max(1);
        let cells_y = (map.hmapy() / SCAR_CELL_TEXELS).max(1);
        Self {
            cells_x,
            cells_y,
            cells: vec![Vec::new(); (cells_x * cells_y) as usize],
        }
    }

    #[inline]
    pub fn dims(&self) -> (i32, i32) {
        (self.cells_x, self.cells_y)
    }

    /// Cells touched by `rect`, clipped to the grid.
    pub fn cell_rect(&self, rect: &TexelRect) -> CellRect {
        let clamp_x = |v: i32| (v / SCAR_CELL_TEXELS).clamp(0, self.cells_x - 1);
        let clamp_y = |v: i32| (v / SCAR_CELL_TEXELS).clamp(0, self.cells_y - 1);
        CellRect {
            x1: clamp_x(rect.x1),
            y1: clamp_y(rect.y1),
            x2: clamp_x(rect.x2),
            y2: clamp_y(rect.y2),
        }
    }

    #[inline]
    fn slot(&self, x: i32, y: i32) -> usize {
        debug_assert!(x >= 0 && x < self.cells_x && y >= 0 && y < self.cells_y);
        (y * self.cells_x + x) as usize
    }

    /// Scars registered in one cell.
    pub fn cell(&self, x: i32, y: i32) -> &[SlotId] {
        &self.cells[self.slot(x, y)]
    }

    /// Register `id` in every cell `rect` touches. O(cells touched).
    pub fn insert(&mut self, id: SlotId, rect: &TexelRect) {
        for (x, y) in self.cell_rect(rect).iter() {
            let slot = self.slot(x, y);
            let cell = &mut self.cells[slot];
            if !cell.contains(&id) {
                cell.push(id);
            }
        }
    }

    /// Deregister `id` from every cell `rect` touches. O(cells touched).
    pub fn remove(&mut self, id: SlotId, rect: &TexelRect) {
        for (x, y) in self.cell_rect(rect).iter() {
            let slot = self.slot(x, y);
            let cell = &mut self.cells[slot];
            if let Some(pos) = cell.iter().position(|&other| other == id) {
                cell.swap_remove(pos);
            }
        }
    }

    /// Every cell currently holding `id`. Linear in grid size; for checks only.
    pub fn cells_holding(&self, id: SlotId) -> Vec<(i32, i32)> {
        let mut found = Vec::new();
        for y in 0..self.cells_y {
            for x in 0..self.cells_x {
                if self.cell(x, y).contains(&id) {
                    found.push((x, y));
                }
            }
        }
        found
    }

    /// Total registrations across all cells.
    pub fn registrations(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }
}
