//! Row-major grid of palette slot indices.

use crate::sizing::Dimensions;

/// A width x height grid of palette slots (0-15), stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexGrid {
    width: u32,
    height: u32,
    cells: Vec<u8>,
}

impl IndexGrid {
    /// A grid filled with `slot`.
    pub fn filled(dims: Dimensions, slot: u8) -> Self {
        let len = dims.width as usize * dims.height as usize;
        Self { width: dims.width, height: dims.height, cells: vec![slot & 0x0f; len] }
    }

    /// Build from row-major cells. Returns `None` if the length does not
    /// match or a cell is outside 0-15.
    pub fn from_cells(dims: Dimensions, cells: Vec<u8>) -> Option<Self> {
        let expected = dims.width as usize * dims.height as usize;
        if cells.len() != expected || cells.iter().any(|&c| c > 0x0f) {
            return None;
        }
        Some(Self { width: dims.width, height: dims.height, cells })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dims(&self) -> Dimensions {
        Dimensions { width: self.width, height: self.height }
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.cells[self.offset(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, slot: u8) {
        let offset = self.offset(x, y);
        self.cells[offset] = slot & 0x0f;
    }

    /// Iterate over rows as slices of slots.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.chunks(self.width as usize)
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height, "cell ({}, {}) out of bounds", x, y);
        y as usize * self.width as usize + x as usize
    }
}
