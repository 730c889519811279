//! Nearest-neighbor resampling onto the target grid
//!
//! Each target cell reads exactly one source pixel; there is no averaging
//! across source pixels. Output is deterministic and preserves hard pixel
//! edges, at the cost of aliasing when shrinking detailed images.

use image::RgbaImage;

use crate::grid::IndexGrid;
use crate::palette::{nearest, DistanceMetric, Palette};
use crate::sizing::Dimensions;

/// Source coordinate sampled for target cell `(x, y)`.
///
/// `floor(x * sw / tw)`, clamped to the last source column/row.
pub fn source_coord(x: u32, y: u32, source: Dimensions, target: Dimensions) -> (u32, u32) {
    let x_scale = source.width as f64 / target.width as f64;
    let y_scale = source.height as f64 / target.height as f64;
    let sx = ((x as f64 * x_scale).floor() as u32).min(source.width - 1);
    let sy = ((y as f64 * y_scale).floor() as u32).min(source.height - 1);
    (sx, sy)
}

/// Sample `source` at `target` resolution without quantizing.
pub fn sample(source: &RgbaImage, target: Dimensions) -> RgbaImage {
    let source_dims = Dimensions::new(source.width(), source.height());
    if source.width() == 0 || source.height() == 0 {
        return RgbaImage::new(target.width, target.height);
    }
    RgbaImage::from_fn(target.width, target.height, |x, y| {
        let (sx, sy) = source_coord(x, y, source_dims, target);
        *source.get_pixel(sx, sy)
    })
}

/// Resample `source` to `target` and quantize every cell to a palette slot.
///
/// # Examples
///
/// ```
/// use image::{Rgba, RgbaImage};
/// use mksprite::palette::{DistanceMetric, Palette};
/// use mksprite::resample::resample;
/// use mksprite::sizing::Dimensions;
///
/// let source = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
/// let grid = resample(&source, Dimensions::new(2, 2), &Palette::arcade(), DistanceMetric::Manhattan);
/// assert!(grid.cells().iter().all(|&slot| slot == 1));
/// ```
pub fn resample(
    source: &RgbaImage,
    target: Dimensions,
    palette: &Palette,
    metric: DistanceMetric,
) -> IndexGrid {
    let sampled = sample(source, target);
    quantize(&sampled, palette, metric)
}

/// Map every pixel of an image to its nearest palette slot.
pub fn quantize(image: &RgbaImage, palette: &Palette, metric: DistanceMetric) -> IndexGrid {
    let dims = Dimensions::new(image.width(), image.height());
    let mut grid = IndexGrid::filled(dims, 0);
    for (x, y, pixel) in image.enumerate_pixels() {
        grid.set(x, y, nearest(*pixel, palette, metric));
    }
    grid
}
