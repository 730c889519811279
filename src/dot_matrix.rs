//! Two-color "dot matrix" quantization
//!
//! Instead of picking the nearest of 15 palette colors per cell, every cell is
//! described by how close it is to a foreground color versus a background
//! color. That blend percentage is then rendered either as one interpolated
//! color per cell ([`DotStyle::SolidApprox`]) or as a block of foreground and
//! background sub-cells ([`DotStyle::Pattern`]).
//!
//! Both styles finish by re-quantizing to the 16-slot palette, because the
//! bitmap format cannot hold arbitrary colors. Interpolated colors therefore
//! snap to whatever palette slot is nearest.

use clap::ValueEnum;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::color::euclidean_distance;
use crate::grid::IndexGrid;
use crate::palette::{nearest, DistanceMetric, Palette, TRANSPARENT_SLOT};
use crate::sizing::Dimensions;

/// Largest block side accepted in [`DotStyle::Pattern`].
pub const MAX_BLOCK_SIZE: u32 = 32;

/// How a blend percentage is turned into output cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DotStyle {
    /// Expand each cell into a block with an ordered foreground fill.
    #[default]
    Pattern,
    /// One cell per cell, colored by linear interpolation.
    SolidApprox,
}

/// Parameters of the dot-matrix mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DotMatrixOptions {
    pub foreground: Rgba<u8>,
    pub background: Rgba<u8>,
    /// Side of the sub-cell block in [`DotStyle::Pattern`]; used clamped
    /// to `1..=MAX_BLOCK_SIZE`.
    pub block_size: u32,
    pub style: DotStyle,
}

impl Default for DotMatrixOptions {
    fn default() -> Self {
        Self {
            foreground: Rgba([0, 0, 0, 255]),
            background: Rgba([255, 255, 255, 255]),
            block_size: 2,
            style: DotStyle::Pattern,
        }
    }
}

impl DotMatrixOptions {
    /// Block side actually used for pattern output.
    pub fn block(&self) -> u32 {
        self.block_size.clamp(1, MAX_BLOCK_SIZE)
    }

    /// Output grid size for a sampled image of size `cells`.
    pub fn output_dims(&self, cells: Dimensions) -> Dimensions {
        match self.style {
            DotStyle::SolidApprox => cells,
            DotStyle::Pattern => {
                let block = self.block();
                Dimensions::new(cells.width.saturating_mul(block), cells.height.saturating_mul(block))
            }
        }
    }
}

/// Closeness of `pixel` to `fg` relative to `bg`, in `[0, 1]`.
///
/// `1.0` means the pixel equals the foreground, `0.0` the background.
/// When both distances are zero the foreground wins.
pub fn blend_percentage(pixel: Rgba<u8>, fg: Rgba<u8>, bg: Rgba<u8>) -> f64 {
    let dist_fg = euclidean_distance(pixel, fg);
    let dist_bg = euclidean_distance(pixel, bg);

    let percentage = if dist_fg == 0.0 {
        1.0
    } else if dist_bg == 0.0 {
        0.0
    } else {
        dist_bg / (dist_fg + dist_bg)
    };
    percentage.clamp(0.0, 1.0)
}

/// Linear interpolation `fg * p + bg * (1 - p)` per channel, rounded.
pub fn interpolate(fg: Rgba<u8>, bg: Rgba<u8>, percentage: f64) -> Rgba<u8> {
    let mix = |f: u8, b: u8| (f as f64 * percentage + b as f64 * (1.0 - percentage)).round() as u8;
    Rgba([mix(fg[0], bg[0]), mix(fg[1], bg[1]), mix(fg[2], bg[2]), 255])
}

/// Number of foreground sub-cells in a `block_size`² block.
pub fn foreground_count(percentage: f64, block_size: u32) -> u64 {
    let total = block_size as u64 * block_size as u64;
    ((percentage * total as f64).round() as u64).min(total)
}

/// Quantize an already-sampled image with the dot-matrix rules.
///
/// `cells` is the image at target resolution (one pixel per output cell, or
/// per output block in pattern style).
pub fn synthesize(
    cells: &RgbaImage,
    options: &DotMatrixOptions,
    palette: &Palette,
    metric: DistanceMetric,
) -> IndexGrid {
    let cell_dims = Dimensions::new(cells.width(), cells.height());
    let mut grid = IndexGrid::filled(options.output_dims(cell_dims), TRANSPARENT_SLOT);

    match options.style {
        DotStyle::SolidApprox => {
            for (x, y, pixel) in cells.enumerate_pixels() {
                if pixel[3] == 0 {
                    continue;
                }
                let p = blend_percentage(*pixel, options.foreground, options.background);
                let mixed = interpolate(options.foreground, options.background, p);
                grid.set(x, y, nearest(mixed, palette, metric));
            }
        }
        DotStyle::Pattern => {
            let block = options.block();
            let fg_slot = nearest(opaque(options.foreground), palette, metric);
            let bg_slot = nearest(opaque(options.background), palette, metric);

            for (x, y, pixel) in cells.enumerate_pixels() {
                if pixel[3] == 0 {
                    continue;
                }
                let p = blend_percentage(*pixel, options.foreground, options.background);
                let fg_dots = foreground_count(p, block);

                // Row-major ordered fill: the first `fg_dots` sub-cells are foreground
                for i in 0..block * block {
                    let (dx, dy) = (i % block, i / block);
                    let slot = if (i as u64) < fg_dots { fg_slot } else { bg_slot };
                    grid.set(x * block + dx, y * block + dy, slot);
                }
            }
        }
    }
    grid
}

fn opaque(color: Rgba<u8>) -> Rgba<u8> {
    Rgba([color[0], color[1], color[2], 255])
}
